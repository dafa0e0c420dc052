//! Capability traits of the capture peer.
//!
//! The session layer reaches the SDK exclusively through these traits:
//!
//! - [`PropertyTarget`]: anything that answers get/set property requests.
//!   Both the session itself and every opened device are property targets.
//! - [`DeviceConnection`]: an opened device.
//! - [`CapturePeer`]: the SDK entry point (session open/close, device open,
//!   SocketCam extension start).
//!
//! Methods return `impl Future + Send` (Edition 2024 RPITIT) so property calls
//! can be moved onto spawned tasks. Implementations are free to write them as
//! plain `async fn`.
//!
//! **NOTE**: These traits are NOT object-safe. Use generics:
//!
//! ```no_run
//! use capture_core::{Property, PropertyId, PropertyValue};
//! use capture_peer::traits::PropertyTarget;
//! use capture_peer::Result;
//!
//! async fn read_name<T: PropertyTarget>(target: &T) -> Result<PropertyValue> {
//!     target
//!         .get_property(Property::query(PropertyId::FriendlyNameDevice))
//!         .await
//! }
//! ```

use std::fmt;
use std::future::Future;

use capture_core::{Guid, Handle, Property, PropertyValue};

use crate::error::Result;
use crate::event::EventSink;
use crate::types::AppCredentials;

/// Target of get/set property requests.
///
/// Each call resolves to exactly one outcome: the value returned by the
/// peer or a [`PeerError`](crate::PeerError).
pub trait PropertyTarget: Send + Sync {
    /// Read a property.
    ///
    /// `property.value` carries the request argument, usually
    /// [`PropertyValue::None`].
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected` with the peer's code and message.
    fn get_property(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<PropertyValue>> + Send;

    /// Write a property and return the value echoed by the peer.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected` with the peer's code and message.
    fn set_property(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<PropertyValue>> + Send;
}

/// An opened device.
///
/// Connections are cheap to clone; clones refer to the same open device.
pub trait DeviceConnection: PropertyTarget + Clone + fmt::Debug + 'static {
    /// Runtime handle correlating notifications to this device.
    ///
    /// Valid only while the device is open. The peer may reuse it later.
    fn handle(&self) -> Handle;

    /// Close the device.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected`; a code of `ESKT_ALREADY_CLOSED` means
    /// the device was closed through another path.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Entry point of the capture SDK.
///
/// Session level property calls (favorite, SocketCam status) go through the
/// [`PropertyTarget`] supertrait.
pub trait CapturePeer: PropertyTarget + 'static {
    /// Connection type returned by [`open_device`](CapturePeer::open_device).
    type Device: DeviceConnection;

    /// Open the session.
    ///
    /// Every later notification is pushed into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected`; a code of `ESKT_UNABLE_OPEN_DEVICE`
    /// means the companion application is missing.
    fn open(
        &self,
        credentials: &AppCredentials,
        sink: EventSink,
    ) -> impl Future<Output = Result<Handle>> + Send;

    /// Close the session.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected` if the peer refuses.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;

    /// Open a device (or device manager) announced by an arrival event.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected` if the device cannot be opened.
    fn open_device(&self, guid: &Guid) -> impl Future<Output = Result<Self::Device>> + Send;

    /// Start the native SocketCam extension.
    ///
    /// Only meaningful on hosts with an extension lifecycle. Readiness is
    /// reported later through [`EventSink::extension_status`].
    ///
    /// # Errors
    ///
    /// Returns `PeerError::Rejected` if the extension cannot be started.
    fn start_socketcam_extension(&self) -> impl Future<Output = Result<()>> + Send;
}
