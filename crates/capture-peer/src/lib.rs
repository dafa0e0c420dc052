//! Peer abstraction layer of the capture session.
//!
//! The capture SDK (the *peer*) is reached through a small, fixed capability
//! interface: open and close a session, open and close devices, get and set
//! properties, and push notifications into a single event channel. This
//! crate defines that interface together with the event model and an
//! in-memory implementation for development and testing.
//!
//! # Design Philosophy
//!
//! - **Async-first**: every call returns a `Send` future (Rust 1.90 +
//!   Edition 2024 RPITIT), so calls can run on spawned tasks.
//! - **One event stream**: the peer pushes every notification into an
//!   [`EventSink`]; the session drains the paired [`EventStream`] from a
//!   single loop.
//! - **Error-aware**: every call resolves to a value or a [`PeerError`]
//!   carrying the peer's numeric code and message.
//!
//! # Example
//!
//! ```no_run
//! use capture_core::{Property, PropertyId};
//! use capture_peer::{AppCredentials, CapturePeer, EventSink, Result};
//!
//! async fn favorite<P: CapturePeer>(peer: &P) -> Result<()> {
//!     let (sink, _stream) = EventSink::channel(32);
//!     peer.open(&AppCredentials::new("ios:app", "dev", "key"), sink).await?;
//!
//!     let value = peer.get_property(Property::query(PropertyId::Favorite)).await?;
//!     println!("favorite: {value:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Mock Implementation
//!
//! With the `mock` feature (enabled by default) the [`mock`] module provides
//! [`MockPeer`](mock::MockPeer), driven through a
//! [`MockPeerHandle`](mock::MockPeerHandle).

pub mod error;
pub mod event;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{PeerError, Result};
pub use event::{
    CaptureEvent, DecodedPayload, EventSink, EventStream, EventValue, ExtensionNotification,
    PeerNotification,
};
pub use traits::{CapturePeer, DeviceConnection, PropertyTarget};
pub use types::{AppCredentials, DeviceInfo};
