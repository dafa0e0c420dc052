//! Capture session management.
//!
//! This crate turns the notification stream of a [`CapturePeer`] into
//! application state: which devices are connected, what was scanned last,
//! whether the SocketCam camera scanner is enabled. It also runs the
//! property requests the application issues against those devices.
//!
//! [`CaptureSession`] owns the state and runs the event loop;
//! [`SessionHandle`] is the application's way in.
//!
//! [`CapturePeer`]: capture_peer::CapturePeer

pub mod config;
pub mod error;
pub mod handle;
pub mod lifecycle;
mod message;
pub mod property;
pub mod registry;
pub mod router;
pub mod snapshot;
pub mod socketcam;
pub mod tracker;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use handle::SessionHandle;
pub use lifecycle::{SessionLifecycle, SessionState};
pub use property::{PropertyClient, decode_battery_level};
pub use registry::{Device, DeviceRegistry, DeviceSummary, Registration};
pub use router::CaptureSession;
pub use snapshot::SessionSnapshot;
pub use socketcam::{AndroidStatus, ExtensionState, IosStatus, SocketCamMachine, SocketCamStatus};
pub use tracker::{DecodedData, DecodedDataTracker};
