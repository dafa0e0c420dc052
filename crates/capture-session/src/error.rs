//! Error types of the session layer.

use capture_core::Guid;
use capture_peer::PeerError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A peer call failed; carries the peer's code and message.
    #[error(transparent)]
    Peer(#[from] PeerError),

    /// Local value conversion or configuration failure.
    #[error(transparent)]
    Core(#[from] capture_core::Error),

    #[error("No device registered for {0}")]
    DeviceNotFound(String),

    /// The device was removed while a request to it was in flight.
    #[error("Device {0} was removed before the request completed")]
    DeviceGone(Guid),

    #[error("No active device")]
    NoActiveDevice,

    #[error("No SocketCam device")]
    NoSocketCam,

    /// The operation needs an open session.
    #[error("Session is not open (state: {0})")]
    NotOpen(String),

    /// The session loop is gone.
    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl SessionError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::DeviceNotFound(what.to_string())
    }

    pub fn not_open(state: impl std::fmt::Display) -> Self {
        Self::NotOpen(state.to_string())
    }

    /// Peer error code, if the failure came from the peer.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Peer(err) => Some(err.code()),
            _ => None,
        }
    }

    /// Returns `true` if the peer reported the companion application missing.
    pub fn is_companion_required(&self) -> bool {
        matches!(self, Self::Peer(err) if err.is_companion_required())
    }

    /// Returns `true` if the peer call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Peer(err) if err.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_error_is_transparent() {
        let err = SessionError::from(PeerError::rejected(-27, "unable to open device"));
        assert_eq!(err.to_string(), "-27: unable to open device");
        assert_eq!(err.code(), Some(-27));
        assert!(err.is_companion_required());
    }

    #[test]
    fn test_local_errors_have_no_code() {
        let err = SessionError::not_found("G1");
        assert_eq!(err.to_string(), "No device registered for G1");
        assert_eq!(err.code(), None);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_closed_sink_is_not_reported_as_missing_companion() {
        let err = SessionError::from(PeerError::SinkClosed);
        assert_eq!(err.code(), Some(capture_core::constants::ESKT_INVALID_HANDLE));
        assert!(!err.is_companion_required());
    }

    #[test]
    fn test_timeout_detection() {
        let err = SessionError::from(PeerError::timeout(5000));
        assert!(err.is_timeout());
        assert_eq!(err.code(), Some(capture_core::constants::ESKT_WAIT_TIMEOUT));
    }
}
