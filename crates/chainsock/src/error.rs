//! Errors surfaced by [`crate::Web3Client`].

use chainsock_abi::AbiError;
use chainsock_core::{JsonRpcError, TransportError, ValueError};
use chainsock_filter::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The node answered with a JSON-RPC error object. Never retried.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("no contract registered as '{0}'")]
    UnknownContract(String),

    #[error("timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rpc(err) => Self::Rpc(err),
            other => Self::Transport(other),
        }
    }
}
