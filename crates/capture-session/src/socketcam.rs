//! SocketCam state machine.
//!
//! SocketCam turns the host camera into a scanner. Its enablement status is
//! owned by the peer and follows a different code set on each platform:
//!
//! | Android          | iOS          |
//! |------------------|--------------|
//! | 1 NotSupported   | 0 Enabled    |
//! | 2 Supported      | 1 Disabled   |
//! | 3 Enabled        |              |
//! | 4 Disabled       |              |
//!
//! The code set is chosen when the session starts and never mixed. A
//! toggle requests the inverse of the current status; the local status only
//! changes once the peer confirms it, so no transition is refused locally.
//!
//! ```text
//! Android:  NotSupported ──► Supported ──► Enabled ◄──► Disabled
//! iOS:                           Enabled ◄──► Disabled
//! ```

use std::fmt;

use capture_core::{Error, Guid, HostPlatform, Result, TriggerMode};
use capture_peer::ExtensionNotification;
use serde::Serialize;
use tracing::{debug, info};

/// SocketCam status on Android hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AndroidStatus {
    NotSupported = 1,
    Supported = 2,
    Enabled = 3,
    Disabled = 4,
}

impl AndroidStatus {
    /// Status requested by a toggle.
    pub fn toggled(self) -> Self {
        match self {
            AndroidStatus::NotSupported => AndroidStatus::Supported,
            AndroidStatus::Supported => AndroidStatus::Enabled,
            AndroidStatus::Enabled => AndroidStatus::Disabled,
            AndroidStatus::Disabled => AndroidStatus::Enabled,
        }
    }
}

/// SocketCam status on iOS hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum IosStatus {
    Enabled = 0,
    Disabled = 1,
}

impl IosStatus {
    /// Status requested by a toggle.
    pub fn toggled(self) -> Self {
        match self {
            IosStatus::Enabled => IosStatus::Disabled,
            IosStatus::Disabled => IosStatus::Enabled,
        }
    }
}

/// SocketCam status tagged with the platform code set it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "platform", content = "status", rename_all = "lowercase")]
pub enum SocketCamStatus {
    Android(AndroidStatus),
    Ios(IosStatus),
}

impl SocketCamStatus {
    /// Status assumed before the peer has been asked.
    pub fn initial(platform: HostPlatform) -> Self {
        match platform {
            HostPlatform::Android => SocketCamStatus::Android(AndroidStatus::NotSupported),
            HostPlatform::Ios => SocketCamStatus::Ios(IosStatus::Disabled),
        }
    }

    /// Map a peer status code in the platform's code set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStatusCode` for codes outside the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use capture_core::HostPlatform;
    /// use capture_session::socketcam::{AndroidStatus, SocketCamStatus};
    ///
    /// let status = SocketCamStatus::from_code(HostPlatform::Android, 3).unwrap();
    /// assert_eq!(status, SocketCamStatus::Android(AndroidStatus::Enabled));
    /// assert!(SocketCamStatus::from_code(HostPlatform::Ios, 3).is_err());
    /// ```
    pub fn from_code(platform: HostPlatform, code: u8) -> Result<Self> {
        let status = match (platform, code) {
            (HostPlatform::Android, 1) => SocketCamStatus::Android(AndroidStatus::NotSupported),
            (HostPlatform::Android, 2) => SocketCamStatus::Android(AndroidStatus::Supported),
            (HostPlatform::Android, 3) => SocketCamStatus::Android(AndroidStatus::Enabled),
            (HostPlatform::Android, 4) => SocketCamStatus::Android(AndroidStatus::Disabled),
            (HostPlatform::Ios, 0) => SocketCamStatus::Ios(IosStatus::Enabled),
            (HostPlatform::Ios, 1) => SocketCamStatus::Ios(IosStatus::Disabled),
            _ => {
                return Err(Error::InvalidStatusCode {
                    platform: platform.to_string(),
                    code,
                });
            }
        };
        Ok(status)
    }

    pub fn code(self) -> u8 {
        match self {
            SocketCamStatus::Android(status) => status as u8,
            SocketCamStatus::Ios(status) => status as u8,
        }
    }

    pub fn platform(self) -> HostPlatform {
        match self {
            SocketCamStatus::Android(_) => HostPlatform::Android,
            SocketCamStatus::Ios(_) => HostPlatform::Ios,
        }
    }

    /// Inverse status requested by a toggle.
    pub fn toggled(self) -> Self {
        match self {
            SocketCamStatus::Android(status) => SocketCamStatus::Android(status.toggled()),
            SocketCamStatus::Ios(status) => SocketCamStatus::Ios(status.toggled()),
        }
    }

    /// Returns `true` if camera scanning is available.
    pub fn is_enabled(self) -> bool {
        matches!(
            self,
            SocketCamStatus::Android(AndroidStatus::Enabled) | SocketCamStatus::Ios(IosStatus::Enabled)
        )
    }
}

impl fmt::Display for SocketCamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketCamStatus::Android(status) => write!(f, "{status:?}"),
            SocketCamStatus::Ios(status) => write!(f, "{status:?}"),
        }
    }
}

/// Lifecycle of the native SocketCam extension (Android only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionState {
    pub ready: bool,

    /// Last reported status code.
    pub status: Option<i32>,

    /// Last reported status text.
    pub message: String,
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self {
            ready: false,
            status: None,
            message: "Not Ready".to_string(),
        }
    }
}

/// Local SocketCam state: status, trigger mode, extension readiness, the
/// SocketCam device slot and whether the scan view is shown.
#[derive(Debug, Clone)]
pub struct SocketCamMachine {
    platform: HostPlatform,
    status: SocketCamStatus,
    trigger: TriggerMode,
    extension: ExtensionState,
    device: Option<Guid>,
    scan_view_open: bool,
    /// Status requested by the latest toggle still awaiting its answer.
    pending_toggle: Option<SocketCamStatus>,
}

impl SocketCamMachine {
    /// Initialize for a platform.
    pub fn new(platform: HostPlatform) -> Self {
        Self {
            platform,
            status: SocketCamStatus::initial(platform),
            trigger: TriggerMode::default(),
            extension: ExtensionState::default(),
            device: None,
            scan_view_open: false,
            pending_toggle: None,
        }
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn status(&self) -> SocketCamStatus {
        self.status
    }

    pub fn trigger(&self) -> TriggerMode {
        self.trigger
    }

    pub fn extension(&self) -> &ExtensionState {
        &self.extension
    }

    pub fn device(&self) -> Option<&Guid> {
        self.device.as_ref()
    }

    pub fn is_scan_view_open(&self) -> bool {
        self.scan_view_open
    }

    /// Start a toggle and return the status to ask the peer for.
    ///
    /// A toggle issued while another is in flight toggles the pending
    /// request rather than the confirmed status.
    pub fn begin_toggle(&mut self) -> SocketCamStatus {
        let requested = self.pending_toggle.unwrap_or(self.status).toggled();
        self.pending_toggle = Some(requested);
        requested
    }

    /// The answer to the toggle that requested `requested` arrived.
    pub fn finish_toggle(&mut self, requested: SocketCamStatus) {
        if self.pending_toggle == Some(requested) {
            self.pending_toggle = None;
        }
    }

    /// Forget any toggle in flight.
    pub fn cancel_toggle(&mut self) {
        self.pending_toggle = None;
    }

    pub fn pending_toggle(&self) -> Option<SocketCamStatus> {
        self.pending_toggle
    }

    /// Adopt a status code confirmed by the peer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStatusCode` if the code is not in this
    /// platform's set; the status is left unchanged.
    pub fn apply_status_code(&mut self, code: u8) -> Result<SocketCamStatus> {
        let status = SocketCamStatus::from_code(self.platform, code)?;
        if status != self.status {
            info!(from = %self.status, to = %status, "SocketCam status changed");
        }
        self.status = status;
        Ok(status)
    }

    /// Change the trigger mode. Returns whether it is continuous.
    pub fn set_trigger(&mut self, mode: TriggerMode) -> bool {
        debug!(trigger = %mode, "SocketCam trigger mode");
        self.trigger = mode;
        mode.is_continuous()
    }

    /// Record an extension lifecycle report.
    ///
    /// Returns `true` if the extension just reported ready, in which case
    /// the status must be queried again.
    pub fn on_extension(&mut self, notification: &ExtensionNotification) -> bool {
        self.extension.status = Some(notification.status);
        self.extension.message = notification.message.clone();
        self.extension.ready = notification.is_ready();
        self.extension.ready
    }

    pub fn attach_device(&mut self, guid: Guid) {
        self.device = Some(guid);
    }

    /// Clear the device slot if it holds `guid`. Closes the scan view.
    pub fn detach_device(&mut self, guid: &Guid) -> bool {
        if self.device.as_ref() != Some(guid) {
            return false;
        }
        self.device = None;
        self.scan_view_open = false;
        true
    }

    pub fn set_scan_view_open(&mut self, open: bool) {
        self.scan_view_open = open;
    }

    /// A SocketCam decode arrived; the view closes unless scanning is
    /// continuous. Returns whether the view is still open.
    pub fn on_decode(&mut self) -> bool {
        if !self.trigger.is_continuous() {
            self.scan_view_open = false;
        }
        self.scan_view_open
    }
}
