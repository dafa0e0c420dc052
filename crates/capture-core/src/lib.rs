//! Shared vocabulary of the capture session workspace.
//!
//! Identifiers, peer code mappings and constants used by both the peer
//! interface (`capture-peer`) and the session layer (`capture-session`).

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
