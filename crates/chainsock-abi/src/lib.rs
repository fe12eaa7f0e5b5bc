//! # chainsock-abi
//!
//! Contract interface model: parses an ABI description into functions and
//! events, computes selectors and topics, encodes calls and decodes return
//! data and logs into codec [`Value`](chainsock_core::Value)s.
//!
//! ## Implementation notes
//! - Uses `alloy-dyn-abi` for the positional encoding
//! - Declared types with a codec counterpart (`uint256`, `bytes32`,
//!   `address`, ...) decode into the matching codec variant; every other
//!   static scalar passes through as `Value::Other`
//! - Tuples and arrays are rejected when the contract is parsed

pub mod codec;
pub mod contract;
pub mod entry;
pub mod error;
pub mod event;
pub mod function;

pub use codec::Param;
pub use contract::{AbiConstructor, AbiFallback, Contract};
pub use entry::{AbiEntry, AbiParam, EntryKind};
pub use error::AbiError;
pub use event::{AbiEvent, DecodedEvent};
pub use function::{AbiFunction, DecodedReturn};
