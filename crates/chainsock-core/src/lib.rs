//! chainsock-core: value codec, hashing and JSON-RPC plumbing for ChainSock.
//!
//! # Overview
//!
//! - [`types`]: fixed-width ABI values ([`Uint256`], [`Bytes32`],
//!   [`Address`], ...) and the dynamic [`Value`]
//! - [`keccak`] / [`mod@hex`]: stateless hashing and hex helpers
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`RpcTransport`]: the async seam every transport implements
//! - [`methods`]: typed request builders
//! - [`model`]: blocks, transactions, receipts and logs

pub mod error;
pub mod hex;
pub mod keccak;
pub mod methods;
pub mod model;
pub mod request;
pub mod transport;
pub mod types;

pub use error::{TransportError, ValueError};
pub use methods::{BlockId, MethodCall};
pub use model::{Block, Log, SyncStatus, Transaction, TransactionObject, TransactionReceipt};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
pub use transport::{HealthStatus, RpcTransport};
pub use types::{
    Address, Bytes16, Bytes32, Bytes4, Bytes8, FixedWidth, SolType, Uint128, Uint16, Uint256,
    Uint32, Uint64, Uint8, Value,
};
