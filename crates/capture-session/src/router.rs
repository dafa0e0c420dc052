//! Capture event router.
//!
//! [`CaptureSession`] owns every piece of session state (registry, tracker,
//! SocketCam machine, device slots) and mutates it from a single loop:
//!
//! ```text
//!                 ┌───────────────────────────┐
//! Peer ──sink────►│ EventStream               │
//!                 │                           ├──► CaptureSession::run ──► watch<SessionSnapshot>
//! SessionHandle ─►│ message queue             │          │
//! property tasks ►│ (commands, completions)   │          └─ spawns property calls
//!                 └───────────────────────────┘
//! ```
//!
//! Events are processed to completion one at a time. Device open and close
//! calls are awaited inside the loop; property calls run on spawned tasks and
//! post a [`Completion`] back to the queue. A completion only touches state
//! if the session epoch it was issued in is still current and the device it
//! addressed is still registered.
//!
//! # Example
//!
//! ```no_run
//! use capture_core::HostPlatform;
//! use capture_peer::mock::MockPeer;
//! use capture_peer::AppCredentials;
//! use capture_session::{CaptureSession, SessionConfig};
//!
//! # async fn example() -> capture_session::Result<()> {
//! let (peer, _hardware) = MockPeer::new();
//! let config = SessionConfig::new(
//!     HostPlatform::Ios,
//!     AppCredentials::new("ios:com.example.app", "dev", "key"),
//! );
//!
//! let mut session = CaptureSession::new(peer, config);
//! let handle = session.handle();
//! session.open().await?;
//! let task = tokio::spawn(session.run());
//!
//! println!("{}", handle.snapshot().status);
//! handle.close().await?;
//! task.await.ok();
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use capture_core::constants::{COMPANION_APP_HINT, SOCKETCAM_CONTEXT};
use capture_core::{DeviceType, EventKind, Guid, Handle, HostPlatform};
use capture_peer::{
    CaptureEvent, CapturePeer, DeviceConnection, DeviceInfo, EventSink, EventStream, EventValue,
    ExtensionNotification, PeerError, PeerNotification,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::handle::SessionHandle;
use crate::lifecycle::{SessionLifecycle, SessionState};
use crate::message::{Command, Completion, FavoriteOutcome, Outcome, Reply, SessionMessage};
use crate::property::PropertyClient;
use crate::registry::{Device, DeviceRegistry, DeviceSummary, Registration};
use crate::snapshot::SessionSnapshot;
use crate::socketcam::{SocketCamMachine, SocketCamStatus};
use crate::tracker::DecodedDataTracker;

/// Device manager slot. Managers are not part of the device registry.
#[derive(Debug, Clone)]
struct ManagerSlot<D> {
    info: DeviceInfo,
    connection: D,
}

/// A capture session bound to one peer.
pub struct CaptureSession<P: CapturePeer> {
    peer: Arc<P>,
    config: SessionConfig,
    client: PropertyClient,
    lifecycle: SessionLifecycle,

    /// Incremented whenever the session opens or closes.
    epoch: u64,
    status: String,

    registry: DeviceRegistry<P::Device>,
    active: Option<Guid>,
    manager: Option<ManagerSlot<P::Device>>,
    tracker: DecodedDataTracker,
    socketcam: SocketCamMachine,
    battery_level: Option<u32>,

    sink: EventSink,
    events: EventStream,
    events_closed: bool,
    messages_tx: mpsc::Sender<SessionMessage>,
    messages_rx: mpsc::Receiver<SessionMessage>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<P: CapturePeer> CaptureSession<P> {
    /// Create a closed session.
    pub fn new(peer: P, config: SessionConfig) -> Self {
        let platform = config.platform;
        let (sink, events) = EventSink::channel(config.channel_capacity);
        let (messages_tx, messages_rx) = mpsc::channel(config.channel_capacity);
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial(platform));

        Self {
            peer: Arc::new(peer),
            client: PropertyClient::new(platform, config.call_timeout()),
            tracker: DecodedDataTracker::new(config.sequence_base),
            socketcam: SocketCamMachine::new(platform),
            config,
            lifecycle: SessionLifecycle::new(),
            epoch: 0,
            status: "Opening Capture...".to_string(),
            registry: DeviceRegistry::new(),
            active: None,
            manager: None,
            battery_level: None,
            sink,
            events,
            events_closed: false,
            messages_tx,
            messages_rx,
            snapshot_tx,
        }
    }

    /// Create a handle for the application side.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.messages_tx.clone(), self.snapshot_tx.subscribe())
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.current_state()
    }

    pub fn platform(&self) -> HostPlatform {
        self.config.platform
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn registry(&self) -> &DeviceRegistry<P::Device> {
        &self.registry
    }

    pub fn tracker(&self) -> &DecodedDataTracker {
        &self.tracker
    }

    pub fn socketcam(&self) -> &SocketCamMachine {
        &self.socketcam
    }

    pub fn battery_level(&self) -> Option<u32> {
        self.battery_level
    }

    /// Guid of the device addressed by property operations.
    pub fn active_device(&self) -> Option<&Guid> {
        self.active.as_ref()
    }

    pub fn device_manager(&self) -> Option<&DeviceInfo> {
        self.manager.as_ref().map(|slot| &slot.info)
    }

    /// Open the session with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection; the session moves to `OpenFailed` and
    /// the status text explains the failure. When the companion application
    /// is missing the status text says so.
    pub async fn open(&mut self) -> Result<()> {
        self.lifecycle.transition_to(SessionState::Opening)?;
        self.set_status("Opening Capture...");
        self.publish();

        info!(platform = %self.config.platform, app_id = %self.config.credentials.app_id, "Opening capture session");
        let peer = Arc::clone(&self.peer);
        let opened = self
            .bounded(peer.open(&self.config.credentials, self.sink.clone()))
            .await;

        match opened {
            Ok(handle) => {
                self.lifecycle.transition_to(SessionState::Open)?;
                self.epoch += 1;
                info!(handle = %handle, epoch = self.epoch, "Capture session open");
                self.set_status("CaptureSDK open with success");
                self.after_open().await;
                self.publish();
                Ok(())
            }
            Err(err) => {
                self.lifecycle.transition_to(SessionState::OpenFailed)?;
                error!(code = err.code(), "Failed to open capture session: {}", err.message());
                if err.is_companion_required() {
                    self.set_status(COMPANION_APP_HINT);
                } else {
                    self.set_status(format!(
                        "Failed to open CaptureSDK: {} {}",
                        err.code(),
                        err.message()
                    ));
                }
                self.publish();
                Err(err.into())
            }
        }
    }

    async fn after_open(&mut self) {
        match self.config.platform {
            HostPlatform::Ios => self.spawn_socketcam_refresh(None),
            HostPlatform::Android => {
                let peer = Arc::clone(&self.peer);
                match self.bounded(peer.start_socketcam_extension()).await {
                    Ok(()) => debug!("SocketCam extension starting"),
                    Err(err) => {
                        warn!(code = err.code(), "Failed to start SocketCam extension: {}", err.message());
                        self.set_status(format!(
                            "failed to start SocketCam extension: {} : {}",
                            err.code(),
                            err.message()
                        ));
                    }
                }
            }
        }
    }

    /// Close every device, the device manager and the session.
    ///
    /// Device close failures are logged and do not stop the close.
    /// Outstanding property calls are not cancelled; their answers are
    /// discarded when they arrive.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidStateTransition` if the session is not
    /// open, or the peer's rejection of the session close. The session ends
    /// up `Closed` in the latter case.
    pub async fn close(&mut self) -> Result<()> {
        self.lifecycle.transition_to(SessionState::Closing)?;
        info!(devices = self.registry.len(), "Closing capture session");
        self.publish();

        for device in self.registry.drain() {
            self.close_connection(&device.name, &device.connection).await;
        }
        if let Some(slot) = self.manager.take() {
            self.close_connection(&slot.info.name, &slot.connection).await;
        }
        self.active = None;
        if let Some(guid) = self.socketcam.device().cloned() {
            self.socketcam.detach_device(&guid);
        }
        self.socketcam.set_scan_view_open(false);
        self.socketcam.cancel_toggle();

        let peer = Arc::clone(&self.peer);
        let closed = self.bounded(peer.close()).await;

        self.epoch += 1;
        self.lifecycle.transition_to(SessionState::Closed)?;

        let result = match closed {
            Ok(()) => {
                self.set_status("Capture closed");
                Ok(())
            }
            Err(err) => {
                error!(code = err.code(), "Failed to close capture session: {}", err.message());
                self.set_status(format!(
                    "failed to close CaptureSDK: {} : {}",
                    err.code(),
                    err.message()
                ));
                Err(err.into())
            }
        };
        self.publish();
        result
    }

    /// Run the session loop until the session is closed through a handle.
    ///
    /// The session should be opened first; commands sent to a session that
    /// is not open are answered with `SessionError::NotOpen`.
    pub async fn run(mut self) -> Result<()> {
        info!("Capture session loop started");
        while self.step().await {}
        info!("Capture session loop stopped");
        Ok(())
    }

    /// Wait for and process one notification or message.
    ///
    /// Returns `false` once the loop should stop: the session was closed
    /// through a handle.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            notification = self.events.recv(), if !self.events_closed => {
                match notification {
                    Some(notification) => self.on_notification(notification).await,
                    None => {
                        warn!("Peer event stream ended");
                        self.events_closed = true;
                    }
                }
                self.publish();
                true
            }
            message = self.messages_rx.recv() => {
                let keep_running = match message {
                    Some(SessionMessage::Command(Command::Close(reply))) => {
                        let result = self.close().await;
                        let _ = reply.send(result);
                        false
                    }
                    Some(SessionMessage::Command(command)) => {
                        self.on_command(command).await;
                        true
                    }
                    Some(SessionMessage::Completion(completion)) => {
                        self.on_completion(completion);
                        true
                    }
                    None => false,
                };
                self.publish();
                keep_running
            }
        }
    }

    /// Process every notification and message already queued, without
    /// waiting. Returns how many were handled.
    pub async fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(notification) = self.events.try_recv() {
            self.on_notification(notification).await;
            handled += 1;
        }
        while let Ok(message) = self.messages_rx.try_recv() {
            match message {
                SessionMessage::Command(Command::Close(reply)) => {
                    let result = self.close().await;
                    let _ = reply.send(result);
                }
                SessionMessage::Command(command) => self.on_command(command).await,
                SessionMessage::Completion(completion) => self.on_completion(completion),
            }
            handled += 1;
        }
        if handled > 0 {
            self.publish();
        }
        handled
    }

    async fn on_notification(&mut self, notification: PeerNotification) {
        match notification {
            PeerNotification::Event { event, handle } => self.on_event(event, handle).await,
            PeerNotification::Extension(notification) => self.on_extension(&notification),
        }
    }

    /// Dispatch one peer event.
    ///
    /// `origin` is the handle of the connection the event came from; decoded
    /// data is attributed to the device registered with that handle.
    pub async fn on_event(&mut self, event: CaptureEvent, origin: Handle) {
        trace!(kind = %event.kind, origin = %origin, "Capture event");

        if !self.state().is_open() {
            debug!(kind = %event.kind, state = %self.state(), "Ignoring event outside open session");
            return;
        }

        match event.kind {
            EventKind::DeviceArrival => match event.device_info() {
                Some(info) => self.on_device_arrival(info.clone()).await,
                None => warn!("Device arrival without device info"),
            },
            EventKind::DeviceRemoval => match event.device_info() {
                Some(info) => self.on_device_removal(info.clone()).await,
                None => warn!("Device removal without device info"),
            },
            EventKind::DecodedData => self.on_decoded_data(&event, origin),
            EventKind::DeviceManagerArrival => match event.device_info() {
                Some(info) => self.on_manager_arrival(info.clone()).await,
                None => warn!("Device manager arrival without device info"),
            },
            EventKind::DeviceManagerRemoval => match event.device_info() {
                Some(info) => self.on_manager_removal(info.clone()).await,
                None => warn!("Device manager removal without device info"),
            },
            EventKind::BatteryLevel => match event.value {
                EventValue::Level(level) => {
                    info!(origin = %origin, level, "Battery level changed");
                    self.battery_level = Some(level);
                    self.set_status(format!("Battery has changed to {level}%"));
                }
                ref other => warn!(value = ?other, "Battery event without level"),
            },
            EventKind::Unknown(code) => debug!(code, "Event not handled"),
        }
    }

    /// Record a SocketCam extension report; a ready report triggers a status
    /// refresh.
    pub fn on_extension(&mut self, notification: &ExtensionNotification) {
        info!(status = notification.status, message = %notification.message, "SocketCam extension status");
        if self.socketcam.on_extension(notification) && self.state().is_open() {
            self.spawn_socketcam_refresh(None);
        }
    }

    async fn on_device_arrival(&mut self, info: DeviceInfo) {
        if self.registry.contains(&info.guid) {
            warn!(guid = %info.guid, name = %info.name, "Arrival of a registered device ignored");
            return;
        }

        let peer = Arc::clone(&self.peer);
        let connection = match self.bounded(peer.open_device(&info.guid)).await {
            Ok(connection) => connection,
            Err(err) => {
                error!(guid = %info.guid, code = err.code(), "Failed to open device: {}", err.message());
                self.set_status(format!("error opening a device: {} {}", err.code(), err.message()));
                return;
            }
        };

        let handle = connection.handle();
        info!(guid = %info.guid, name = %info.name, handle = %handle, "Device opened");
        self.set_status(format!("result of opening {} : 0", info.name));

        let registration = self.registry.register_arrival(
            info.guid.clone(),
            info.name.clone(),
            info.device_type,
            handle,
            connection.clone(),
        );
        if let Registration::AlreadyRegistered(_) = registration {
            return;
        }

        if info.device_type.is_socketcam() {
            self.socketcam.attach_device(info.guid.clone());
            let client = self.client;
            self.spawn_request(Some(info.guid), async move {
                Outcome::OverlayView {
                    result: client.set_overlay_view(&connection, SOCKETCAM_CONTEXT).await,
                }
            });
        } else {
            self.active = Some(info.guid);
        }
    }

    async fn on_device_removal(&mut self, info: DeviceInfo) {
        let connection = match self.registry.find_by_guid(&info.guid) {
            Ok(device) => device.connection.clone(),
            Err(_) => {
                debug!(guid = %info.guid, name = %info.name, "No matching device for removal");
                return;
            }
        };

        let closed = self.bounded(connection.close()).await;
        match closed {
            Ok(()) => self.set_status(format!("result of closing {}: 0", info.name)),
            Err(err) if err.is_already_closed() => {
                debug!(guid = %info.guid, "Device already closed");
            }
            Err(err) => {
                error!(guid = %info.guid, code = err.code(), "Failed to close device: {}", err.message());
                self.set_status(format!(
                    "error closing a device: {}: {}",
                    err.code(),
                    err.message()
                ));
                return;
            }
        }

        if self.registry.remove(&info.guid).is_ok() {
            info!(guid = %info.guid, name = %info.name, "Device removed");
        }
        if self.active.as_ref() == Some(&info.guid) {
            self.active = None;
        }
        self.socketcam.detach_device(&info.guid);
    }

    fn on_decoded_data(&mut self, event: &CaptureEvent, origin: Handle) {
        if event.is_cancelled() {
            debug!(origin = %origin, "Scan cancelled");
            self.socketcam.set_scan_view_open(false);
            return;
        }

        let EventValue::DecodedData(payload) = &event.value else {
            warn!(origin = %origin, "Decoded data event without payload");
            return;
        };

        let device_name = match self.registry.find_by_handle(origin) {
            Ok(device) => {
                if device.device_type.is_socketcam() {
                    self.socketcam.on_decode();
                }
                Some(device.name.clone())
            }
            Err(_) => None,
        };

        let decoded = self
            .tracker
            .record(&payload.data, &payload.symbology_name, device_name.as_deref());
        debug!(
            sequence_id = decoded.sequence_id,
            length = decoded.length,
            symbology = %decoded.symbology_name,
            "Decoded data"
        );

        match device_name {
            Some(name) => self.set_status(format!("Decoded Data from {name}")),
            None => self.set_status("Decoded Data!"),
        }
    }

    async fn on_manager_arrival(&mut self, info: DeviceInfo) {
        let peer = Arc::clone(&self.peer);
        let connection = match self.bounded(peer.open_device(&info.guid)).await {
            Ok(connection) => connection,
            Err(err) => {
                error!(guid = %info.guid, code = err.code(), "Failed to open device manager: {}", err.message());
                self.set_status(format!("error opening a device: {} {}", err.code(), err.message()));
                return;
            }
        };

        info!(guid = %info.guid, name = %info.name, "Device manager opened");
        self.set_status("retrieving BLE Device Manager favorite... ");

        let client = self.client;
        let favorite = self.config.favorite.clone();
        let manager = connection.clone();
        self.spawn_request(Some(info.guid.clone()), async move {
            Outcome::Favorite {
                result: ensure_favorite(client, &manager, favorite).await,
            }
        });

        self.manager = Some(ManagerSlot { info, connection });
    }

    async fn on_manager_removal(&mut self, info: DeviceInfo) {
        let Some(slot) = self.manager.take_if(|slot| slot.info.guid == info.guid) else {
            debug!(guid = %info.guid, "No matching device manager for removal");
            return;
        };

        self.close_connection(&slot.info.name, &slot.connection).await;
        info!(guid = %info.guid, "Device manager removed");
    }

    async fn on_command(&mut self, command: Command) {
        if !self.state().is_open() {
            command.reject(SessionError::not_open(self.state()));
            return;
        }

        match command {
            Command::FriendlyName(reply) => {
                let Some((guid, connection, _)) = self.active_connection() else {
                    let _ = reply.send(Err(SessionError::NoActiveDevice));
                    return;
                };
                let client = self.client;
                self.spawn_request(Some(guid), async move {
                    Outcome::FriendlyName {
                        result: client.friendly_name(&connection).await,
                        reply,
                    }
                });
            }
            Command::SetFriendlyName { name, reply } => {
                let Some((guid, connection, _)) = self.active_connection() else {
                    let _ = reply.send(Err(SessionError::NoActiveDevice));
                    return;
                };
                let client = self.client;
                self.spawn_request(Some(guid), async move {
                    Outcome::Renamed {
                        result: client.set_friendly_name(&connection, &name).await,
                        reply,
                    }
                });
            }
            Command::BatteryLevel(reply) => {
                let Some((guid, connection, device_type)) = self.active_connection() else {
                    let _ = reply.send(Err(SessionError::NoActiveDevice));
                    return;
                };
                let client = self.client;
                self.spawn_request(Some(guid), async move {
                    Outcome::BatteryLevel {
                        result: client.battery_level(&connection, device_type).await,
                        reply,
                    }
                });
            }
            Command::DataSource { id, reply } => {
                let Some((guid, connection, _)) = self.active_connection() else {
                    let _ = reply.send(Err(SessionError::NoActiveDevice));
                    return;
                };
                let client = self.client;
                self.spawn_request(Some(guid), async move {
                    Outcome::DataSource {
                        result: client.data_source(&connection, id).await,
                        reply,
                    }
                });
            }
            Command::SetDataSource { id, status, reply } => {
                let Some((guid, connection, _)) = self.active_connection() else {
                    let _ = reply.send(Err(SessionError::NoActiveDevice));
                    return;
                };
                let client = self.client;
                self.spawn_request(Some(guid), async move {
                    Outcome::DataSource {
                        result: client.set_data_source(&connection, id, status).await,
                        reply,
                    }
                });
            }
            Command::RefreshSocketCam(reply) => self.spawn_socketcam_refresh(Some(reply)),
            Command::ToggleSocketCam(reply) => {
                let from = self.socketcam.pending_toggle().unwrap_or(self.socketcam.status());
                let requested = self.socketcam.begin_toggle();
                info!(from = %from, requested = %requested, "Toggling SocketCam");
                let client = self.client;
                let peer = Arc::clone(&self.peer);
                self.spawn_request(None, async move {
                    Outcome::SocketCamToggled {
                        requested,
                        result: request_socketcam_status(client, &*peer, requested).await,
                        reply,
                    }
                });
            }
            Command::SetTrigger { mode, reply } => {
                let _ = reply.send(Ok(self.socketcam.set_trigger(mode)));
            }
            Command::OpenScanView(reply) => {
                let Some(guid) = self.socketcam.device().cloned() else {
                    let _ = reply.send(Err(SessionError::NoSocketCam));
                    return;
                };
                let connection = match self.registry.find_by_guid(&guid) {
                    Ok(device) => device.connection.clone(),
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        return;
                    }
                };
                let client = self.client;
                let mode = self.socketcam.trigger();
                self.spawn_request(Some(guid), async move {
                    Outcome::ScanViewOpened {
                        result: client.set_trigger(&connection, mode).await,
                        reply,
                    }
                });
            }
            Command::CloseScanView(reply) => {
                self.socketcam.set_scan_view_open(false);
                let _ = reply.send(Ok(()));
            }
            Command::Close(reply) => {
                let result = self.close().await;
                let _ = reply.send(result);
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        let Completion {
            epoch,
            guid,
            outcome,
        } = completion;

        if epoch != self.epoch || !self.state().is_open() {
            debug!(epoch, current = self.epoch, "Discarding stale property response");
            outcome.discard(SessionError::not_open(self.state()));
            return;
        }
        if let Some(guid) = &guid
            && !self.targets_live_device(guid)
        {
            debug!(guid = %guid, "Discarding property response for removed device");
            outcome.discard(SessionError::DeviceGone(guid.clone()));
            return;
        }

        match outcome {
            Outcome::FriendlyName { result, reply } => {
                match &result {
                    Ok(name) => self.set_status(format!("successfully retrieved friendly name: '{name}' ")),
                    Err(err) => self.set_status(format!("failed to get friendlyName: {err}")),
                }
                let _ = reply.send(result);
            }
            Outcome::Renamed { result, reply } => {
                match (&result, &guid) {
                    (Ok(name), Some(guid)) => {
                        if self.registry.rename(guid, name.clone()).is_ok() {
                            info!(guid = %guid, name = %name, "Device renamed");
                        }
                        self.set_status(format!("successfully changed friendly name: '{name}' "));
                    }
                    (Ok(_), None) => {}
                    (Err(err), _) => self.set_status(format!("failed to set friendlyName: {err}")),
                }
                let _ = reply.send(result);
            }
            Outcome::BatteryLevel { result, reply } => {
                match &result {
                    Ok(level) => {
                        self.battery_level = Some(*level);
                        self.set_status(format!("Successfully retrieved battery level: {level}%"));
                    }
                    Err(err) => self.set_status(format!("failed to get battery level: {err}")),
                }
                let _ = reply.send(result);
            }
            Outcome::DataSource { result, reply } => {
                match &result {
                    Ok(data_source) => self.set_status(format!(
                        "successfully retrieved symbology {}: {:?}",
                        data_source.id, data_source.status
                    )),
                    Err(err) => self.set_status(format!("failed to set symbology: {err}")),
                }
                let _ = reply.send(result);
            }
            Outcome::SocketCamStatus { result, reply } => {
                let applied = result.and_then(|code| {
                    self.socketcam
                        .apply_status_code(code)
                        .map_err(SessionError::from)
                });
                if let Err(err) = &applied {
                    warn!("Failed to refresh SocketCam status: {err}");
                    self.set_status(format!("failed to get SocketCam status: {err}"));
                }
                if let Some(reply) = reply {
                    let _ = reply.send(applied);
                }
            }
            Outcome::SocketCamToggled {
                requested,
                result,
                reply,
            } => {
                self.socketcam.finish_toggle(requested);
                let applied = result.and_then(|code| {
                    self.socketcam
                        .apply_status_code(code)
                        .map_err(SessionError::from)
                });
                match &applied {
                    Ok(status) => {
                        if *status != requested {
                            warn!(requested = %requested, confirmed = %status, "Peer confirmed a different SocketCam status");
                        }
                        self.set_status(format!("SocketCam status: {status}"));
                    }
                    Err(err) => {
                        self.set_status(format!("failed to set SocketCam status: {err}"));
                    }
                }
                let _ = reply.send(applied);
            }
            Outcome::ScanViewOpened { result, reply } => {
                match &result {
                    Ok(()) => self.socketcam.set_scan_view_open(true),
                    Err(err) => self.set_status(format!("failed to open SocketCam view: {err}")),
                }
                let _ = reply.send(result);
            }
            Outcome::OverlayView { result } => {
                if let Err(err) = result {
                    warn!("Failed to set SocketCam overlay view: {err}");
                }
            }
            Outcome::Favorite { result } => match result {
                Ok(FavoriteOutcome::Found(favorite)) => {
                    debug!(favorite = %favorite, "Device manager favorite found");
                    self.set_status("Favorite found! Try using an NFC reader!");
                }
                Ok(FavoriteOutcome::Assigned(favorite)) => {
                    info!(favorite = %favorite, "Device manager favorite set");
                    self.set_status("successfully set favorite for BLE Device Manager!");
                }
                Err(err) => {
                    warn!("Failed to check device manager favorite: {err}");
                    self.set_status(format!("failed to get favorite: {err}"));
                }
            },
        }
    }

    fn targets_live_device(&self, guid: &Guid) -> bool {
        self.registry.contains(guid)
            || self
                .manager
                .as_ref()
                .is_some_and(|slot| &slot.info.guid == guid)
    }

    fn active_connection(&self) -> Option<(Guid, P::Device, DeviceType)> {
        let guid = self.active.as_ref()?;
        let device = self.registry.find_by_guid(guid).ok()?;
        Some((guid.clone(), device.connection.clone(), device.device_type))
    }

    fn spawn_socketcam_refresh(&self, reply: Option<Reply<SocketCamStatus>>) {
        let client = self.client;
        let peer = Arc::clone(&self.peer);
        self.spawn_request(None, async move {
            Outcome::SocketCamStatus {
                result: client.socketcam_status(&*peer).await,
                reply,
            }
        });
    }

    /// Run a property call off the loop and post its outcome back.
    fn spawn_request<F>(&self, guid: Option<Guid>, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.messages_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = request.await;
            let completion = Completion {
                epoch,
                guid,
                outcome,
            };
            if tx.send(SessionMessage::Completion(completion)).await.is_err() {
                debug!("Session gone before property response");
            }
        });
    }

    async fn close_connection(&self, name: &str, connection: &P::Device) {
        match self.bounded(connection.close()).await {
            Ok(()) => debug!(name = %name, "Device closed"),
            Err(err) if err.is_already_closed() => debug!(name = %name, "Device already closed"),
            Err(err) => {
                error!(name = %name, code = err.code(), "Failed to close device: {}", err.message());
            }
        }
    }

    /// Bound a peer call by the configured call timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = capture_peer::Result<T>>,
    ) -> capture_peer::Result<T> {
        let timeout: Duration = self.config.call_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PeerError::timeout(timeout.as_millis() as u64)),
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        trace!(status = %self.status, "Status");
    }

    /// Current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let summary = |guid: Option<&Guid>| -> Option<DeviceSummary> {
            guid.and_then(|g| self.registry.find_by_guid(g).ok())
                .map(Device::summary)
        };

        SessionSnapshot {
            state: self.state(),
            status: self.status.clone(),
            devices: self.registry.snapshot().iter().map(Device::summary).collect(),
            active_device: summary(self.active.as_ref()),
            device_manager: self.manager.as_ref().map(|slot| DeviceSummary {
                guid: slot.info.guid.clone(),
                name: slot.info.name.clone(),
                device_type: slot.info.device_type,
                handle: slot.connection.handle(),
            }),
            socketcam_device: summary(self.socketcam.device()),
            socketcam_status: self.socketcam.status(),
            extension: self.socketcam.extension().clone(),
            trigger_mode: self.socketcam.trigger(),
            scan_view_open: self.socketcam.is_scan_view_open(),
            decoded: self.tracker.current().cloned(),
            battery_level: self.battery_level,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

/// Read the manager's favorite; write `favorite` if none is set.
async fn ensure_favorite<D: DeviceConnection>(
    client: PropertyClient,
    manager: &D,
    favorite: String,
) -> Result<FavoriteOutcome> {
    let current = client.favorite(manager).await?;
    if !current.is_empty() {
        return Ok(FavoriteOutcome::Found(current));
    }
    client.set_favorite(manager, &favorite).await?;
    Ok(FavoriteOutcome::Assigned(favorite))
}

/// Ask the peer for `requested`, then read back what it actually applied.
async fn request_socketcam_status<P: CapturePeer>(
    client: PropertyClient,
    peer: &P,
    requested: SocketCamStatus,
) -> Result<u8> {
    client.set_socketcam_status(peer, requested.code()).await?;
    client.socketcam_status(peer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_core::constants::{
        DEVICE_TYPE_READER_D600, DEVICE_TYPE_SCANNER_S740, DEVICE_TYPE_SOCKETCAM_C820,
        ESKT_INVALID_HANDLE, ESKT_UNABLE_OPEN_DEVICE, EXTENSION_STATUS_READY,
    };
    use capture_core::{DeviceType, PropertyId, PropertyValue, TriggerMode};
    use capture_peer::AppCredentials;
    use capture_peer::mock::{MockOp, MockPeer, MockPeerHandle};

    use crate::socketcam::{AndroidStatus, IosStatus};

    fn config(platform: HostPlatform) -> SessionConfig {
        SessionConfig::new(platform, AppCredentials::new("ios:com.example.app", "dev", "key"))
    }

    async fn open_session(platform: HostPlatform) -> (CaptureSession<MockPeer>, MockPeerHandle) {
        let (peer, hardware) = MockPeer::new();
        let mut session = CaptureSession::new(peer, config(platform));
        session.open().await.unwrap();
        settle(&mut session).await;
        (session, hardware)
    }

    /// Let spawned property calls finish and process everything queued.
    async fn settle(session: &mut CaptureSession<MockPeer>) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
            session.drain_pending().await;
        }
    }

    fn scanner() -> DeviceType {
        DeviceType::new(DEVICE_TYPE_SCANNER_S740)
    }

    #[tokio::test]
    async fn test_open_success() {
        let (session, hardware) = open_session(HostPlatform::Ios).await;

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.status(), "CaptureSDK open with success");
        assert!(hardware.is_open());
        // iOS reads the SocketCam status right after open.
        assert_eq!(session.socketcam().status(), SocketCamStatus::Ios(IosStatus::Disabled));
    }

    #[tokio::test]
    async fn test_open_failure_reports_code() {
        let (peer, hardware) = MockPeer::new();
        hardware.fail_next(MockOp::Open, PeerError::rejected(ESKT_INVALID_HANDLE, "bad credentials"));
        let mut session = CaptureSession::new(peer, config(HostPlatform::Ios));

        let err = session.open().await.unwrap_err();
        assert_eq!(err.code(), Some(ESKT_INVALID_HANDLE));
        assert_eq!(session.state(), SessionState::OpenFailed);
        assert_eq!(session.status(), "Failed to open CaptureSDK: -18 bad credentials");

        // A failed open may be retried.
        session.open().await.unwrap();
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_open_failure_companion_hint() {
        let (peer, hardware) = MockPeer::new();
        hardware.fail_next(
            MockOp::Open,
            PeerError::rejected(ESKT_UNABLE_OPEN_DEVICE, "unable to open device"),
        );
        let mut session = CaptureSession::new(peer, config(HostPlatform::Android));

        let err = session.open().await.unwrap_err();
        assert!(err.is_companion_required());
        assert_eq!(session.status(), COMPANION_APP_HINT);
    }

    #[tokio::test]
    async fn test_android_open_starts_extension() {
        let (session, hardware) = open_session(HostPlatform::Android).await;

        assert_eq!(hardware.call_count(MockOp::StartExtension), 1);
        assert_eq!(
            session.socketcam().status(),
            SocketCamStatus::Android(AndroidStatus::NotSupported)
        );
    }

    #[tokio::test]
    async fn test_arrival_registers_and_activates() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;

        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.active_device(), Some(&guid));
        assert!(hardware.is_device_open(&guid));
        assert_eq!(session.status(), "result of opening Socket S740 : 0");
    }

    #[tokio::test]
    async fn test_duplicate_arrival_is_ignored() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;

        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        hardware
            .arrive_device_with_guid(guid.clone(), "Socket S740", scanner())
            .await
            .unwrap();
        settle(&mut session).await;

        assert_eq!(session.registry().len(), 1);
        assert_eq!(hardware.call_count(MockOp::OpenDevice), 1);
    }

    #[tokio::test]
    async fn test_open_device_failure_leaves_registry_empty() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        hardware.fail_next(MockOp::OpenDevice, PeerError::rejected(-27, "unable to open device"));

        hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        assert!(session.registry().is_empty());
        assert_eq!(session.status(), "error opening a device: -27 unable to open device");
    }

    #[tokio::test]
    async fn test_removal_closes_and_forgets() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.remove_device(&guid).await.unwrap();
        settle(&mut session).await;

        assert!(session.registry().is_empty());
        assert_eq!(session.active_device(), None);
        assert!(!hardware.is_device_open(&guid));
    }

    #[tokio::test]
    async fn test_removal_keeps_device_when_close_fails() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.fail_next(MockOp::CloseDevice, PeerError::rejected(-18, "invalid handle"));
        hardware.remove_device(&guid).await.unwrap();
        settle(&mut session).await;

        assert_eq!(session.registry().len(), 1);
        assert_eq!(session.status(), "error closing a device: -18: invalid handle");
    }

    #[tokio::test]
    async fn test_removal_absorbs_already_closed() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.fail_next(MockOp::CloseDevice, PeerError::rejected(-38, "already closed"));
        hardware.remove_device(&guid).await.unwrap();
        settle(&mut session).await;

        assert!(session.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_removal_is_noop() {
        let (mut session, _hardware) = open_session(HostPlatform::Ios).await;
        let before = session.registry().snapshot();

        let info = DeviceInfo::new("unknown-guid".parse().unwrap(), "Ghost", scanner());
        session.on_event(CaptureEvent::device_removal(info), Handle::new(1)).await;

        assert!(Arc::ptr_eq(&before, &session.registry().snapshot()));
    }

    #[tokio::test]
    async fn test_decode_is_attributed_to_origin() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.decode(&guid, &[72, 73], 26, "QR Code").await.unwrap();
        settle(&mut session).await;

        let decoded = session.tracker().current().unwrap();
        assert_eq!(decoded.payload, "HI");
        assert_eq!(decoded.length, 2);
        assert_eq!(decoded.sequence_id, 1);
        assert_eq!(decoded.device_name.as_deref(), Some("Socket S740"));
        assert_eq!(session.status(), "Decoded Data from Socket S740");
    }

    #[tokio::test]
    async fn test_decode_from_unknown_origin() {
        let (mut session, _hardware) = open_session(HostPlatform::Ios).await;

        let payload = capture_peer::DecodedPayload::new(b"A".to_vec(), 7, "EAN 13");
        session
            .on_event(CaptureEvent::decoded_data(payload), Handle::new(999))
            .await;

        let decoded = session.tracker().current().unwrap();
        assert_eq!(decoded.device_name, None);
        assert_eq!(session.status(), "Decoded Data!");
    }

    #[tokio::test]
    async fn test_cancelled_scan_closes_view() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware
            .arrive_device("SocketCam C820", DeviceType::new(DEVICE_TYPE_SOCKETCAM_C820))
            .await
            .unwrap();
        settle(&mut session).await;
        session.socketcam.set_scan_view_open(true);

        hardware.cancel_scan(&guid).await.unwrap();
        settle(&mut session).await;

        assert!(!session.socketcam().is_scan_view_open());
        assert!(session.tracker().current().is_none());
    }

    #[tokio::test]
    async fn test_socketcam_arrival_sets_overlay() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware
            .arrive_device("SocketCam C820", DeviceType::new(DEVICE_TYPE_SOCKETCAM_C820))
            .await
            .unwrap();
        settle(&mut session).await;

        assert_eq!(session.socketcam().device(), Some(&guid));
        // SocketCam devices do not become the active device.
        assert_eq!(session.active_device(), None);
        assert_eq!(hardware.property_sets(PropertyId::OverlayViewDevice).len(), 1);
    }

    #[tokio::test]
    async fn test_battery_event() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.battery_event(&guid, 55).await.unwrap();
        settle(&mut session).await;

        assert_eq!(session.battery_level(), Some(55));
        assert_eq!(session.status(), "Battery has changed to 55%");
    }

    #[tokio::test]
    async fn test_manager_without_favorite_gets_one() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware
            .arrive_manager("Socket Device Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        settle(&mut session).await;

        assert_eq!(session.device_manager().map(|m| &m.guid), Some(&guid));
        assert_eq!(
            hardware.device_property(&guid, PropertyId::Favorite),
            Some(PropertyValue::String("*".to_string()))
        );
        assert_eq!(session.status(), "successfully set favorite for BLE Device Manager!");
        // Managers never enter the device registry.
        assert!(session.registry().is_empty());
    }

    #[tokio::test]
    async fn test_manager_with_favorite_is_left_alone() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let manager = hardware
            .arrive_manager("Socket Device Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        hardware.set_device_property(
            &manager,
            capture_core::Property::new(PropertyId::Favorite, PropertyValue::String("abc".into())),
        );
        settle(&mut session).await;

        assert_eq!(session.status(), "Favorite found! Try using an NFC reader!");
        assert!(hardware.property_sets(PropertyId::Favorite).is_empty());
    }

    #[tokio::test]
    async fn test_manager_removal_clears_slot() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware
            .arrive_manager("Socket Device Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        settle(&mut session).await;

        hardware.remove_manager(&guid).await.unwrap();
        settle(&mut session).await;

        assert!(session.device_manager().is_none());
        assert!(!hardware.is_device_open(&guid));
    }

    #[tokio::test]
    async fn test_extension_ready_refreshes_status() {
        let (mut session, hardware) = open_session(HostPlatform::Android).await;
        hardware.set_session_property(capture_core::Property::new(
            PropertyId::SocketCamStatus,
            PropertyValue::Byte(AndroidStatus::Enabled as u8),
        ));

        hardware
            .extension_status(EXTENSION_STATUS_READY, "Ready")
            .await
            .unwrap();
        settle(&mut session).await;

        assert!(session.socketcam().extension().ready);
        assert_eq!(
            session.socketcam().status(),
            SocketCamStatus::Android(AndroidStatus::Enabled)
        );
    }

    #[tokio::test]
    async fn test_events_ignored_when_closed() {
        let (peer, _hardware) = MockPeer::new();
        let mut session = CaptureSession::new(peer, config(HostPlatform::Ios));

        session.on_event(CaptureEvent::battery_level(10), Handle::new(1)).await;
        assert_eq!(session.battery_level(), None);
    }

    #[tokio::test]
    async fn test_close_closes_everything() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let first = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        let second = hardware
            .arrive_device("Socket D600", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        let manager = hardware
            .arrive_manager("Socket Device Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        settle(&mut session).await;

        session.close().await.unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.registry().is_empty());
        assert!(session.device_manager().is_none());
        for guid in [&first, &second, &manager] {
            assert!(!hardware.is_device_open(guid));
        }
        assert!(!hardware.is_open());
        assert_eq!(hardware.call_count(MockOp::CloseDevice), 3);
    }

    #[tokio::test]
    async fn test_close_twice_is_rejected() {
        let (mut session, _hardware) = open_session(HostPlatform::Ios).await;
        session.close().await.unwrap();

        let err = session.close().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_command_rejected_when_not_open() {
        let (peer, _hardware) = MockPeer::new();
        let mut session = CaptureSession::new(peer, config(HostPlatform::Ios));
        let handle = session.handle();

        let (result, _) = tokio::join!(handle.set_trigger(TriggerMode::ContinuousScan), async {
            tokio::task::yield_now().await;
            session.drain_pending().await
        });

        assert!(matches!(result, Err(SessionError::NotOpen(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_for_removed_device_is_discarded() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let guid = hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.set_property_latency(Duration::from_millis(50));
        let handle = session.handle();
        let pending = tokio::spawn(async move { handle.set_friendly_name("Renamed").await });
        settle(&mut session).await;

        hardware.remove_device(&guid).await.unwrap();
        settle(&mut session).await;
        assert!(session.registry().is_empty());

        // The completion arrives once the property latency elapsed.
        assert!(session.step().await);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::DeviceGone(ref gone) if gone == &guid));
        assert!(session.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_close_is_discarded() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        hardware.set_property_latency(Duration::from_millis(50));
        let handle = session.handle();
        let pending = tokio::spawn(async move { handle.battery_level().await });
        settle(&mut session).await;

        session.close().await.unwrap();
        assert!(session.step().await);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::NotOpen(_)));
        assert_eq!(session.battery_level(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_toggle_in_flight_chains_on_first_request() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        assert_eq!(session.socketcam().status(), SocketCamStatus::Ios(IosStatus::Disabled));

        hardware.set_property_latency(Duration::from_millis(50));
        let first = tokio::spawn({
            let handle = session.handle();
            async move { handle.toggle_socketcam().await }
        });
        let second = tokio::spawn({
            let handle = session.handle();
            async move { handle.toggle_socketcam().await }
        });
        settle(&mut session).await;
        assert_eq!(
            session.socketcam().pending_toggle(),
            Some(SocketCamStatus::Ios(IosStatus::Disabled))
        );

        assert!(session.step().await);
        assert!(session.step().await);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let sets = hardware.property_sets(PropertyId::SocketCamStatus);
        assert_eq!(sets.len(), 2);
        assert!(sets.contains(&PropertyValue::Byte(0)));
        assert!(sets.contains(&PropertyValue::Byte(1)));
        assert_eq!(session.socketcam().pending_toggle(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_forgets_toggle_in_flight() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;

        hardware.set_property_latency(Duration::from_millis(50));
        let handle = session.handle();
        let pending = tokio::spawn(async move { handle.toggle_socketcam().await });
        settle(&mut session).await;
        assert!(session.socketcam().pending_toggle().is_some());

        session.close().await.unwrap();
        assert_eq!(session.socketcam().pending_toggle(), None);

        assert!(session.step().await);
        assert!(matches!(pending.await.unwrap(), Err(SessionError::NotOpen(_))));
    }

    #[tokio::test]
    async fn test_snapshot_is_published() {
        let (mut session, hardware) = open_session(HostPlatform::Ios).await;
        let handle = session.handle();

        hardware.arrive_device("Socket S740", scanner()).await.unwrap();
        settle(&mut session).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, SessionState::Open);
        assert_eq!(snapshot.device_count(), 1);
        assert_eq!(snapshot.active_device.unwrap().name, "Socket S740");
    }
}
