//! Observable session state.
//!
//! The session publishes a [`SessionSnapshot`] after every event and
//! command it processes. Snapshots are plain values; holding one never
//! blocks the session.

use capture_core::{HostPlatform, TriggerMode};
use serde::Serialize;

use crate::lifecycle::SessionState;
use crate::registry::DeviceSummary;
use crate::socketcam::{ExtensionState, SocketCamStatus};
use crate::tracker::DecodedData;

/// Everything an observer needs to render the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,

    /// Human readable description of the last thing that happened.
    pub status: String,

    /// Registered devices in arrival order.
    pub devices: Vec<DeviceSummary>,

    /// Device addressed by property operations.
    pub active_device: Option<DeviceSummary>,

    pub device_manager: Option<DeviceSummary>,

    pub socketcam_device: Option<DeviceSummary>,

    pub socketcam_status: SocketCamStatus,

    pub extension: ExtensionState,

    pub trigger_mode: TriggerMode,

    pub scan_view_open: bool,

    pub decoded: Option<DecodedData>,

    /// Last battery level in percent, pushed or queried.
    pub battery_level: Option<u32>,
}

impl SessionSnapshot {
    /// Snapshot of a session that has not been opened.
    pub fn initial(platform: HostPlatform) -> Self {
        Self {
            state: SessionState::Closed,
            status: "Opening Capture...".to_string(),
            devices: Vec::new(),
            active_device: None,
            device_manager: None,
            socketcam_device: None,
            socketcam_status: SocketCamStatus::initial(platform),
            extension: ExtensionState::default(),
            trigger_mode: TriggerMode::default(),
            scan_view_open: false,
            decoded: None,
            battery_level: None,
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
