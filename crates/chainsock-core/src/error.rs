//! Error types shared across ChainSock crates.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors raised while constructing or comparing fixed-width values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Hex digit string or byte string has the wrong length for the type.
    #[error("{ty}: expected {expected} hex digits, got {got}")]
    Length {
        ty: String,
        expected: usize,
        got: usize,
    },

    /// Input is not valid hexadecimal.
    #[error("{ty}: invalid hex: {reason}")]
    InvalidHex { ty: String, reason: String },

    /// Integer does not fit in the declared bit width.
    #[error("{ty}: value {value} exceeds {bits} bits")]
    Range {
        ty: String,
        bits: usize,
        value: String,
    },

    /// Unsigned type constructed from a negative number.
    #[error("{ty}: unsigned value cannot be negative")]
    Negative { ty: String },

    /// Two values of different declared types were compared or combined.
    #[error("type mismatch: cannot compare {left} with {right}")]
    TypeMismatch { left: String, right: String },

    /// Ordering requested on a type that only supports equality.
    #[error("{ty} values are not ordered")]
    Unordered { ty: String },

    /// Type name has no fixed-width constructor.
    #[error("unknown value type '{0}'")]
    UnknownType(String),

    /// Input cannot be turned into the requested type.
    #[error("cannot build {ty} from {input}")]
    BadInitialType { ty: String, input: String },
}

/// Errors that can occur during an RPC transport operation.
///
/// Cloneable so a single failure can be delivered to every observer of a
/// pending request.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Outbound or inbound payload could not be encoded/decoded.
    #[error("Malformed message: {0}")]
    Message(String),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The transport stopped permanently; no further requests are served.
    #[error("Transport stopped: {reason}")]
    Stopped { reason: String },

    /// Response could not be deserialized into the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the call may be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WebSocket(_) | Self::Timeout { .. })
    }

    /// Returns `true` if this is a node-side execution error (not retryable).
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }

    /// Returns `true` for request timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialization(e.to_string())
    }
}
