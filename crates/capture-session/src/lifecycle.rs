//! Session lifecycle state machine.
//!
//! # States
//!
//! - `Closed`: no session with the peer
//! - `Opening`: open request in flight
//! - `Open`: events are flowing
//! - `Closing`: devices and session are being closed
//! - `OpenFailed`: the peer refused the open; may be retried
//!
//! # Valid Transitions
//!
//! - Closed → Opening → Open | OpenFailed
//! - OpenFailed → Opening
//! - Open → Closing → Closed
//!
//! # Examples
//!
//! ```
//! use capture_session::lifecycle::{SessionLifecycle, SessionState};
//!
//! let mut lifecycle = SessionLifecycle::new();
//! lifecycle.transition_to(SessionState::Opening).unwrap();
//! lifecycle.transition_to(SessionState::Open).unwrap();
//!
//! assert!(lifecycle.transition_to(SessionState::Opening).is_err());
//! assert_eq!(lifecycle.current_state(), SessionState::Open);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
    OpenFailed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Closed => "Closed",
            SessionState::Opening => "Opening",
            SessionState::Open => "Open",
            SessionState::Closing => "Closing",
            SessionState::OpenFailed => "OpenFailed",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if a transition to `target` is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use capture_session::lifecycle::SessionState;
    ///
    /// assert!(SessionState::Closed.can_transition_to(&SessionState::Opening));
    /// assert!(!SessionState::Closed.can_transition_to(&SessionState::Open));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Closed | SessionState::OpenFailed, SessionState::Opening)
                | (SessionState::Opening, SessionState::Open | SessionState::OpenFailed)
                | (SessionState::Open, SessionState::Closing)
                | (SessionState::Closing, SessionState::Closed)
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}

/// Tracks the session state and validates every transition.
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    current_state: SessionState,
}

impl SessionLifecycle {
    /// Create a lifecycle in the `Closed` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> SessionState {
        self.current_state
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidStateTransition` if the transition is
    /// not allowed from the current state. The state is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<()> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(SessionError::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        tracing::debug!(from = %self.current_state, to = %new_state, "Session state transition");
        self.current_state = new_state;
        Ok(())
    }
}
