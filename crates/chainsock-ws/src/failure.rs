//! Connection failures and how the reconnect loop treats them.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Close codes after which reconnecting is expected to help.
pub const TOLERABLE_CLOSE_CODES: [u16; 7] = [1000, 1001, 1002, 1003, 1005, 1006, 1008];

/// Close codes that stop the transport.
pub const FATAL_CLOSE_CODES: [u16; 5] = [1007, 1009, 1010, 1011, 1015];

/// "Message too big": redelivering the same request would fail again.
pub const CLOSE_MESSAGE_TOO_BIG: u16 = 1009;

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionFailure {
    /// The opening handshake did not complete (node down, refused, reset).
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed with code {code}: {reason}")]
    Closed { code: u16, reason: String },

    #[error("send/receive timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Anything not recognised above.
    #[error("{0}")]
    Fatal(String),
}

/// Whether the reconnect loop may try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Tolerable,
    Fatal,
}

impl ConnectionFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Handshake(_) | Self::Protocol(_) | Self::Timeout { .. } => FailureClass::Tolerable,
            Self::Closed { code, .. } if TOLERABLE_CLOSE_CODES.contains(code) => {
                FailureClass::Tolerable
            }
            Self::Closed { .. } | Self::Fatal(_) => FailureClass::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == FailureClass::Fatal
    }

    pub fn is_message_too_big(&self) -> bool {
        matches!(self, Self::Closed { code, .. } if *code == CLOSE_MESSAGE_TOO_BIG)
    }

    /// Map a WebSocket error. `connecting` is true while the handshake is
    /// in progress, where an I/O error means the node is unreachable.
    pub fn from_ws_error(err: tungstenite::Error, connecting: bool) -> Self {
        use tungstenite::Error as E;
        match err {
            E::ConnectionClosed => Self::Closed {
                code: 1000,
                reason: "connection closed".into(),
            },
            E::AlreadyClosed => Self::Closed {
                code: 1006,
                reason: "connection already closed".into(),
            },
            E::Io(e) if connecting => Self::Handshake(e.to_string()),
            E::Io(e) => Self::Closed {
                code: 1006,
                reason: e.to_string(),
            },
            E::Tls(e) => Self::Closed {
                code: 1015,
                reason: e.to_string(),
            },
            E::Capacity(e) => Self::Closed {
                code: CLOSE_MESSAGE_TOO_BIG,
                reason: e.to_string(),
            },
            E::Utf8 => Self::Closed {
                code: 1007,
                reason: "invalid UTF-8 in text frame".into(),
            },
            E::Protocol(e) => Self::Protocol(e.to_string()),
            E::WriteBufferFull(_) => Self::Protocol("write buffer full".into()),
            other => Self::Fatal(other.to_string()),
        }
    }
}
