//! Error types for the filter pipeline.

use chainsock_abi::AbiError;
use chainsock_core::{TransportError, ValueError};
use thiserror::Error;

/// Errors raised while registering filters or processing a block.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("RPC error: {0}")]
    Transport(#[from] TransportError),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// A predicate names a field the event does not declare.
    #[error("event '{event}' has no field '{field}'")]
    UnknownField { event: String, field: String },

    /// The node returned nothing for an object that must exist.
    #[error("node returned no {kind} for {id}")]
    Missing { kind: &'static str, id: String },

    #[error("Handler error in '{handler}': {reason}")]
    Handler { handler: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl FilterError {
    /// Returns `true` if the underlying RPC call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
