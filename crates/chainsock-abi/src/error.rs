//! Errors raised while parsing an interface or encoding/decoding against it.

use chainsock_core::ValueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("invalid ABI JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Tuples, arrays and anything else the codec does not model.
    #[error("unsupported type '{ty}' in {context}")]
    UnsupportedType { ty: String, context: String },

    #[error("invalid type '{ty}': {reason}")]
    InvalidType { ty: String, reason: String },

    #[error("at most one fallback function is allowed, found {count}")]
    MultipleFallbacks { count: usize },

    #[error("{function}: expected {expected} arguments, got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}: argument {index} ('{name}') expects {expected}, got {got}")]
    ArgumentType {
        function: String,
        index: usize,
        name: String,
        expected: String,
        got: String,
    },

    /// An indexed and a non-indexed event parameter share a name.
    #[error("event {event}: parameter '{name}' is declared both indexed and non-indexed")]
    NameCollision { event: String, name: String },

    #[error("ABI decode failed: {reason}")]
    Decode { reason: String },

    #[error("function '{0}' not found")]
    UnknownFunction(String),

    #[error("event '{0}' not found")]
    UnknownEvent(String),

    #[error(transparent)]
    Value(#[from] ValueError),
}
