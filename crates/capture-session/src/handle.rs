//! Application side handle of a running session.

use capture_core::{DataSource, DataSourceStatus, TriggerMode};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Result, SessionError};
use crate::message::{Command, Reply, SessionMessage};
use crate::snapshot::SessionSnapshot;
use crate::socketcam::SocketCamStatus;

/// Sends requests to a [`CaptureSession`](crate::CaptureSession) and reads
/// its published state.
///
/// Handles are cheap to clone. Every request resolves once: with the
/// answer, with the peer's error, or with `SessionError::SessionClosed` if
/// the session loop is gone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMessage>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<SessionMessage>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self { tx, snapshot_rx }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Friendly name of the active device.
    pub async fn friendly_name(&self) -> Result<String> {
        self.request(Command::FriendlyName).await
    }

    /// Rename the active device. Resolves to the name the device accepted.
    pub async fn set_friendly_name(&self, name: impl Into<String>) -> Result<String> {
        let name = name.into();
        self.request(|reply| Command::SetFriendlyName { name, reply })
            .await
    }

    /// Battery level of the active device in percent.
    pub async fn battery_level(&self) -> Result<u32> {
        self.request(Command::BatteryLevel).await
    }

    pub async fn data_source(&self, id: u32) -> Result<DataSource> {
        self.request(|reply| Command::DataSource { id, reply }).await
    }

    pub async fn set_data_source(&self, id: u32, status: DataSourceStatus) -> Result<DataSource> {
        self.request(|reply| Command::SetDataSource { id, status, reply })
            .await
    }

    /// Read the SocketCam status from the peer.
    pub async fn refresh_socketcam(&self) -> Result<SocketCamStatus> {
        self.request(Command::RefreshSocketCam).await
    }

    /// Flip SocketCam between enabled and disabled. Resolves to the status
    /// the peer confirmed.
    pub async fn toggle_socketcam(&self) -> Result<SocketCamStatus> {
        self.request(Command::ToggleSocketCam).await
    }

    /// Select the trigger mode used when the scan view opens. Resolves to
    /// whether the mode is continuous.
    pub async fn set_trigger(&self, mode: TriggerMode) -> Result<bool> {
        self.request(|reply| Command::SetTrigger { mode, reply })
            .await
    }

    pub async fn open_scan_view(&self) -> Result<()> {
        self.request(Command::OpenScanView).await
    }

    pub async fn close_scan_view(&self) -> Result<()> {
        self.request(Command::CloseScanView).await
    }

    /// Close the session. The session loop stops afterwards.
    pub async fn close(&self) -> Result<()> {
        self.request(Command::Close).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMessage::Command(command(reply)))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        rx.await.map_err(|_| SessionError::SessionClosed)?
    }
}
