//! chainsock: async Web3 client over a reconnecting WebSocket.
//!
//! [`Web3Client`] ties the workspace together:
//!
//! - typed `eth_*` / `personal_*` calls through [`chainsock_core::methods`]
//! - contract registration and [`CallableContract`] call/transact sugar
//! - event, transaction-hash and address filters fed by a block poller
//!
//! The member crates are re-exported so one dependency is enough.

pub mod client;
pub mod config;
pub mod contract;
pub mod error;

pub use chainsock_abi;
pub use chainsock_core;
pub use chainsock_filter;
pub use chainsock_ws;

pub use client::Web3Client;
pub use config::ClientConfig;
pub use contract::{CallableContract, CallableFunction, EncodedCall};
pub use error::ClientError;
