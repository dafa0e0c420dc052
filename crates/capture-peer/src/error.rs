//! Error types for peer calls.
//!
//! Every rejected call made against the capture peer resolves to a numeric
//! code and a message. A few codes carry meaning for the session layer and
//! have dedicated predicates here.

use capture_core::constants::{
    ESKT_ALREADY_CLOSED, ESKT_CANCEL, ESKT_INVALID_HANDLE, ESKT_UNABLE_OPEN_DEVICE,
    ESKT_WAIT_TIMEOUT,
};

/// Result type alias for peer calls.
pub type Result<T> = std::result::Result<T, PeerError>;

/// Errors that can occur during a call against the peer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// The peer rejected the call.
    #[error("{code}: {message}")]
    Rejected { code: i32, message: String },

    /// The call did not resolve within the allowed time.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The event channel towards the session is gone.
    #[error("Event sink closed")]
    SinkClosed,
}

impl PeerError {
    /// Create a new rejected call error.
    pub fn rejected(code: i32, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Numeric error code as reported to the user.
    pub fn code(&self) -> i32 {
        match self {
            Self::Rejected { code, .. } => *code,
            Self::Timeout { .. } => ESKT_WAIT_TIMEOUT,
            Self::SinkClosed => ESKT_INVALID_HANDLE,
        }
    }

    /// Error message without the code.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The resource was already closed through another path.
    pub fn is_already_closed(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code == ESKT_ALREADY_CLOSED)
    }

    /// The host needs the companion application to open the session.
    pub fn is_companion_required(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code == ESKT_UNABLE_OPEN_DEVICE)
    }

    /// The operation was cancelled by the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code == ESKT_CANCEL)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
