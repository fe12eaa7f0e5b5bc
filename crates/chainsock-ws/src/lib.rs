//! chainsock-ws: reconnecting WebSocket JSON-RPC transport.
//!
//! # Features
//! - Many concurrent logical requests over one physical connection
//! - Per-request correlation by JSON-RPC `id` through a [`Channel`]
//! - Reconnect under a bounded-failure policy, keeping queued work
//! - Classification of close codes into tolerable and fatal failures

pub mod channel;
pub mod connector;
pub mod failure;
pub mod policy;
pub mod queue;
pub mod transport;

pub use channel::Channel;
pub use connector::{Connection, Connector, WsConnection, WsConnector};
pub use failure::{ConnectionFailure, FailureClass};
pub use policy::{Decision, ReconnectConfig, ReconnectPolicy};
pub use queue::{Pending, RequestQueue};
pub use transport::{WsTransport, WsTransportConfig};
