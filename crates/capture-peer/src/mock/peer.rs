//! Mock capture peer for testing and development.
//!
//! [`MockPeer`] implements [`CapturePeer`] entirely in memory. The paired
//! [`MockPeerHandle`] plays the role of the hardware: it announces devices,
//! pushes decoded data and battery notifications, reports SocketCam
//! extension readiness, and scripts failures of individual calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use capture_core::constants::{ESKT_ALREADY_CLOSED, ESKT_INVALID_HANDLE, ESKT_NOT_SUPPORTED};
use capture_core::{
    DataSource, DataSourceStatus, DeviceType, Guid, Handle, Property, PropertyId, PropertyValue,
    TriggerMode,
};

use crate::error::{PeerError, Result};
use crate::event::{CaptureEvent, DecodedPayload, EventSink, ExtensionNotification};
use crate::traits::{CapturePeer, DeviceConnection, PropertyTarget};
use crate::types::{AppCredentials, DeviceInfo};

/// Handle value returned by a successful session open.
const SESSION_HANDLE: Handle = Handle::new(1);

/// First handle assigned to an opened device.
const FIRST_DEVICE_HANDLE: u64 = 100;

/// Battery level of a freshly announced NFC reader (plain percentage).
const DEFAULT_NFC_BATTERY: u32 = 90;

/// Battery level of any other freshly announced device (percentage in the
/// second byte).
const DEFAULT_BATTERY: u32 = 0x5A00;

/// Peer operation that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Open,
    Close,
    OpenDevice,
    CloseDevice,
    GetProperty,
    SetProperty,
    StartExtension,
}

/// One call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub op: MockOp,

    /// Device addressed by the call; `None` for session level calls.
    pub guid: Option<Guid>,

    /// Property request for get/set calls.
    pub property: Option<Property>,
}

#[derive(Debug)]
struct MockDeviceState {
    info: DeviceInfo,
    handle: Option<Handle>,
    properties: HashMap<PropertyId, PropertyValue>,
    data_sources: HashMap<u32, DataSourceStatus>,
}

impl MockDeviceState {
    fn new(info: DeviceInfo) -> Self {
        let battery = if info.device_type.is_nfc() {
            DEFAULT_NFC_BATTERY
        } else {
            DEFAULT_BATTERY
        };

        let mut properties = HashMap::new();
        properties.insert(
            PropertyId::FriendlyNameDevice,
            PropertyValue::String(info.name.clone()),
        );
        properties.insert(PropertyId::BatteryLevelDevice, PropertyValue::Ulong(battery));
        properties.insert(
            PropertyId::TriggerDevice,
            PropertyValue::Byte(TriggerMode::Start.to_u8()),
        );
        properties.insert(PropertyId::Favorite, PropertyValue::String(String::new()));

        Self {
            info,
            handle: None,
            properties,
            data_sources: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct MockState {
    open: bool,
    sink: Option<EventSink>,
    next_handle: u64,
    devices: HashMap<Guid, MockDeviceState>,
    session_properties: HashMap<PropertyId, PropertyValue>,
    failures: HashMap<MockOp, VecDeque<PeerError>>,
    property_latency: Duration,
    calls: Vec<MockCall>,
}

impl MockState {
    fn new() -> Self {
        let mut session_properties = HashMap::new();
        session_properties.insert(PropertyId::SocketCamStatus, PropertyValue::Byte(1));

        Self {
            open: false,
            sink: None,
            next_handle: FIRST_DEVICE_HANDLE,
            devices: HashMap::new(),
            session_properties,
            failures: HashMap::new(),
            property_latency: Duration::ZERO,
            calls: Vec::new(),
        }
    }

    fn record(&mut self, op: MockOp, guid: Option<&Guid>, property: Option<&Property>) {
        self.calls.push(MockCall {
            op,
            guid: guid.cloned(),
            property: property.cloned(),
        });
    }

    fn take_failure(&mut self, op: MockOp) -> Result<()> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(PeerError::rejected(ESKT_INVALID_HANDLE, "session is not open"))
        }
    }

    fn open_device_mut(&mut self, guid: &Guid, handle: Handle) -> Result<&mut MockDeviceState> {
        match self.devices.get_mut(guid) {
            Some(device) if device.handle == Some(handle) => Ok(device),
            _ => Err(PeerError::rejected(ESKT_INVALID_HANDLE, "device is not open")),
        }
    }
}

type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory capture peer.
///
/// # Examples
///
/// ```
/// use capture_core::constants::DEVICE_TYPE_SCANNER_S740;
/// use capture_core::DeviceType;
/// use capture_peer::mock::MockPeer;
/// use capture_peer::{AppCredentials, CapturePeer, EventSink, PeerNotification};
///
/// #[tokio::main]
/// async fn main() -> capture_peer::Result<()> {
///     let (peer, handle) = MockPeer::new();
///     let (sink, mut stream) = EventSink::channel(8);
///
///     peer.open(&AppCredentials::new("ios:app", "dev", "key"), sink).await?;
///     let guid = handle
///         .arrive_device("Socket S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
///         .await?;
///
///     let Some(PeerNotification::Event { event, .. }) = stream.recv().await else {
///         panic!("expected an event");
///     };
///     assert_eq!(event.device_info().unwrap().guid, guid);
///
///     let device = peer.open_device(&guid).await?;
///     assert!(handle.is_device_open(&guid));
///     # let _ = device;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockPeer {
    state: SharedState,
}

impl MockPeer {
    /// Create a mock peer and the handle driving it.
    pub fn new() -> (Self, MockPeerHandle) {
        let state = Arc::new(Mutex::new(MockState::new()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockPeerHandle { state },
        )
    }

    async fn property_delay(&self) {
        let latency = lock(&self.state).property_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl PropertyTarget for MockPeer {
    async fn get_property(&self, property: Property) -> Result<PropertyValue> {
        self.property_delay().await;

        let mut state = lock(&self.state);
        state.record(MockOp::GetProperty, None, Some(&property));
        state.take_failure(MockOp::GetProperty)?;
        state.ensure_open()?;

        state
            .session_properties
            .get(&property.id)
            .cloned()
            .ok_or_else(|| not_supported(property.id))
    }

    async fn set_property(&self, property: Property) -> Result<PropertyValue> {
        self.property_delay().await;

        let mut state = lock(&self.state);
        state.record(MockOp::SetProperty, None, Some(&property));
        state.take_failure(MockOp::SetProperty)?;
        state.ensure_open()?;

        state
            .session_properties
            .insert(property.id, property.value.clone());
        Ok(property.value)
    }
}

impl CapturePeer for MockPeer {
    type Device = MockDevice;

    async fn open(&self, _credentials: &AppCredentials, sink: EventSink) -> Result<Handle> {
        let mut state = lock(&self.state);
        state.record(MockOp::Open, None, None);
        state.take_failure(MockOp::Open)?;

        state.open = true;
        state.sink = Some(sink);
        tracing::debug!("Mock peer opened");
        Ok(SESSION_HANDLE)
    }

    async fn close(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(MockOp::Close, None, None);
        state.take_failure(MockOp::Close)?;
        state.ensure_open()?;

        state.open = false;
        state.sink = None;
        for device in state.devices.values_mut() {
            device.handle = None;
        }
        tracing::debug!("Mock peer closed");
        Ok(())
    }

    async fn open_device(&self, guid: &Guid) -> Result<MockDevice> {
        let mut state = lock(&self.state);
        state.record(MockOp::OpenDevice, Some(guid), None);
        state.take_failure(MockOp::OpenDevice)?;
        state.ensure_open()?;

        let handle = Handle::new(state.next_handle);
        let device = state
            .devices
            .get_mut(guid)
            .ok_or_else(|| PeerError::rejected(ESKT_INVALID_HANDLE, "unknown device"))?;
        device.handle = Some(handle);
        state.next_handle += 1;

        Ok(MockDevice {
            guid: guid.clone(),
            handle,
            state: Arc::clone(&self.state),
        })
    }

    async fn start_socketcam_extension(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(MockOp::StartExtension, None, None);
        state.take_failure(MockOp::StartExtension)?;
        state.ensure_open()
    }
}

/// Device opened through [`MockPeer`].
#[derive(Debug, Clone)]
pub struct MockDevice {
    guid: Guid,
    handle: Handle,
    state: SharedState,
}

impl MockDevice {
    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    async fn property_delay(&self) {
        let latency = lock(&self.state).property_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl PropertyTarget for MockDevice {
    async fn get_property(&self, property: Property) -> Result<PropertyValue> {
        self.property_delay().await;

        let mut state = lock(&self.state);
        state.record(MockOp::GetProperty, Some(&self.guid), Some(&property));
        state.take_failure(MockOp::GetProperty)?;
        let device = state.open_device_mut(&self.guid, self.handle)?;

        if let PropertyValue::DataSource(query) = &property.value {
            let status = device
                .data_sources
                .get(&query.id)
                .copied()
                .unwrap_or(DataSourceStatus::Enable);
            return Ok(PropertyValue::DataSource(DataSource::with_status(
                query.id, status,
            )));
        }

        device
            .properties
            .get(&property.id)
            .cloned()
            .ok_or_else(|| not_supported(property.id))
    }

    async fn set_property(&self, property: Property) -> Result<PropertyValue> {
        self.property_delay().await;

        let mut state = lock(&self.state);
        state.record(MockOp::SetProperty, Some(&self.guid), Some(&property));
        state.take_failure(MockOp::SetProperty)?;
        let device = state.open_device_mut(&self.guid, self.handle)?;

        match &property.value {
            PropertyValue::DataSource(DataSource {
                id,
                status: Some(status),
                ..
            }) => {
                device.data_sources.insert(*id, *status);
            }
            value => {
                if property.id == PropertyId::FriendlyNameDevice
                    && let PropertyValue::String(name) = value
                {
                    device.info.name = name.clone();
                }
                device.properties.insert(property.id, value.clone());
            }
        }
        Ok(property.value)
    }
}

impl DeviceConnection for MockDevice {
    fn handle(&self) -> Handle {
        self.handle
    }

    async fn close(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.record(MockOp::CloseDevice, Some(&self.guid), None);
        state.take_failure(MockOp::CloseDevice)?;

        match state.devices.get_mut(&self.guid) {
            Some(device) if device.handle == Some(self.handle) => {
                device.handle = None;
                Ok(())
            }
            _ => Err(PeerError::rejected(ESKT_ALREADY_CLOSED, "device already closed")),
        }
    }
}

/// Control handle of a [`MockPeer`].
///
/// Clones share the same peer.
#[derive(Debug, Clone)]
pub struct MockPeerHandle {
    state: SharedState,
}

impl MockPeerHandle {
    /// Announce a new device with a generated guid.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn arrive_device(
        &self,
        name: impl Into<String>,
        device_type: DeviceType,
    ) -> Result<Guid> {
        let guid = generated_guid()?;
        self.arrive_device_with_guid(guid.clone(), name, device_type)
            .await?;
        Ok(guid)
    }

    /// Announce a device with a known guid.
    ///
    /// Announcing the same guid twice delivers a second arrival event for
    /// the same physical device.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn arrive_device_with_guid(
        &self,
        guid: Guid,
        name: impl Into<String>,
        device_type: DeviceType,
    ) -> Result<()> {
        let info = DeviceInfo::new(guid, name, device_type);
        self.announce(info.clone());
        self.deliver(CaptureEvent::device_arrival(info), SESSION_HANDLE)
            .await
    }

    /// Report that a device went away.
    ///
    /// The device stays open on the mock side until the session closes it.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn remove_device(&self, guid: &Guid) -> Result<()> {
        let info = self.device_info(guid)?;
        self.deliver(CaptureEvent::device_removal(info), SESSION_HANDLE)
            .await
    }

    /// Announce a device manager with a generated guid.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn arrive_manager(
        &self,
        name: impl Into<String>,
        device_type: DeviceType,
    ) -> Result<Guid> {
        let guid = generated_guid()?;
        let info = DeviceInfo::new(guid.clone(), name, device_type);
        self.announce(info.clone());
        self.deliver(CaptureEvent::device_manager_arrival(info), SESSION_HANDLE)
            .await?;
        Ok(guid)
    }

    /// Report that a device manager went away.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn remove_manager(&self, guid: &Guid) -> Result<()> {
        let info = self.device_info(guid)?;
        self.deliver(CaptureEvent::device_manager_removal(info), SESSION_HANDLE)
            .await
    }

    /// Push decoded data originating from a device.
    ///
    /// The origin handle is the device's current handle, or an unassigned
    /// handle if the device was never opened.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn decode(
        &self,
        guid: &Guid,
        data: &[u8],
        symbology_id: u32,
        symbology_name: &str,
    ) -> Result<()> {
        let payload = DecodedPayload::new(data.to_vec(), symbology_id, symbology_name);
        let origin = self.origin_handle(guid);
        self.deliver(CaptureEvent::decoded_data(payload), origin)
            .await
    }

    /// Push a cancelled scan from a device.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn cancel_scan(&self, guid: &Guid) -> Result<()> {
        let origin = self.origin_handle(guid);
        self.deliver(CaptureEvent::cancelled_scan(), origin).await
    }

    /// Push a battery level notification from a device.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn battery_event(&self, guid: &Guid, percent: u32) -> Result<()> {
        let origin = self.origin_handle(guid);
        self.deliver(CaptureEvent::battery_level(percent), origin)
            .await
    }

    /// Push an arbitrary event.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn raw_event(&self, event: CaptureEvent, handle: Handle) -> Result<()> {
        self.deliver(event, handle).await
    }

    /// Report a SocketCam extension lifecycle change.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if no session is listening.
    pub async fn extension_status(&self, status: i32, message: &str) -> Result<()> {
        let sink = self.sink()?;
        sink.extension_status(ExtensionNotification::new(status, message))
            .await
    }

    /// Set the raw battery property value of a device.
    pub fn set_battery_raw(&self, guid: &Guid, raw: u32) {
        self.set_device_property(guid, Property::new(PropertyId::BatteryLevelDevice, PropertyValue::Ulong(raw)));
    }

    /// Set a device property as the hardware would report it.
    pub fn set_device_property(&self, guid: &Guid, property: Property) {
        let mut state = lock(&self.state);
        if let Some(device) = state.devices.get_mut(guid) {
            device.properties.insert(property.id, property.value);
        }
    }

    /// Set a session property such as the SocketCam status.
    pub fn set_session_property(&self, property: Property) {
        lock(&self.state)
            .session_properties
            .insert(property.id, property.value);
    }

    pub fn session_property(&self, id: PropertyId) -> Option<PropertyValue> {
        lock(&self.state).session_properties.get(&id).cloned()
    }

    pub fn device_property(&self, guid: &Guid, id: PropertyId) -> Option<PropertyValue> {
        lock(&self.state)
            .devices
            .get(guid)
            .and_then(|device| device.properties.get(&id).cloned())
    }

    /// Make the next call of `op` fail with `error`.
    ///
    /// Failures queue up; each call consumes one.
    pub fn fail_next(&self, op: MockOp, error: PeerError) {
        lock(&self.state)
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Delay every property call by `latency`.
    pub fn set_property_latency(&self, latency: Duration) {
        lock(&self.state).property_latency = latency;
    }

    /// Returns `true` while the session is open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Returns `true` while the device is open.
    pub fn is_device_open(&self, guid: &Guid) -> bool {
        self.device_handle(guid).is_some()
    }

    /// Current handle of an open device.
    pub fn device_handle(&self, guid: &Guid) -> Option<Handle> {
        lock(&self.state)
            .devices
            .get(guid)
            .and_then(|device| device.handle)
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.state).calls.clone()
    }

    /// Values written to `id` through set calls, in order.
    pub fn property_sets(&self, id: PropertyId) -> Vec<PropertyValue> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| call.op == MockOp::SetProperty)
            .filter_map(|call| call.property.as_ref())
            .filter(|property| property.id == id)
            .map(|property| property.value.clone())
            .collect()
    }

    /// Number of calls of `op` received so far.
    pub fn call_count(&self, op: MockOp) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| call.op == op)
            .count()
    }

    fn announce(&self, info: DeviceInfo) {
        let mut state = lock(&self.state);
        state
            .devices
            .entry(info.guid.clone())
            .and_modify(|device| device.info = info.clone())
            .or_insert_with(|| MockDeviceState::new(info));
    }

    fn device_info(&self, guid: &Guid) -> Result<DeviceInfo> {
        lock(&self.state)
            .devices
            .get(guid)
            .map(|device| device.info.clone())
            .ok_or_else(|| PeerError::rejected(ESKT_INVALID_HANDLE, "unknown device"))
    }

    fn origin_handle(&self, guid: &Guid) -> Handle {
        self.device_handle(guid).unwrap_or(Handle::new(0))
    }

    fn sink(&self) -> Result<EventSink> {
        lock(&self.state).sink.clone().ok_or(PeerError::SinkClosed)
    }

    async fn deliver(&self, event: CaptureEvent, handle: Handle) -> Result<()> {
        let sink = self.sink()?;
        sink.deliver(event, handle).await
    }
}

fn generated_guid() -> Result<Guid> {
    Guid::new(uuid::Uuid::new_v4().to_string())
        .map_err(|err| PeerError::rejected(ESKT_INVALID_HANDLE, err.to_string()))
}

fn not_supported(id: PropertyId) -> PeerError {
    PeerError::rejected(ESKT_NOT_SUPPORTED, format!("{id} not supported"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStream, EventValue, PeerNotification};
    use capture_core::constants::{
        DEVICE_TYPE_READER_D600, DEVICE_TYPE_SCANNER_S740, DEVICE_TYPE_SOCKETCAM_C820,
    };
    use capture_core::EventKind;

    fn credentials() -> AppCredentials {
        AppCredentials::new("ios:com.example.app", "dev", "key")
    }

    async fn opened() -> (MockPeer, MockPeerHandle, EventStream) {
        let (peer, handle) = MockPeer::new();
        let (sink, stream) = EventSink::channel(16);
        peer.open(&credentials(), sink).await.unwrap();
        (peer, handle, stream)
    }

    async fn next_event(stream: &mut EventStream) -> (CaptureEvent, Handle) {
        match stream.recv().await.unwrap() {
            PeerNotification::Event { event, handle } => (event, handle),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_open_and_close() {
        let (peer, handle, _stream) = opened().await;
        assert!(handle.is_open());

        peer.close().await.unwrap();
        assert!(!handle.is_open());

        let err = peer.close().await.unwrap_err();
        assert_eq!(err.code(), ESKT_INVALID_HANDLE);
    }

    #[tokio::test]
    async fn test_mock_scripted_open_failure() {
        let (peer, handle) = MockPeer::new();
        handle.fail_next(MockOp::Open, PeerError::rejected(-27, "unable to open"));

        let (sink, _stream) = EventSink::channel(4);
        let err = peer.open(&credentials(), sink.clone()).await.unwrap_err();
        assert!(err.is_companion_required());

        // Failures are consumed one per call
        peer.open(&credentials(), sink).await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_device_lifecycle() {
        let (peer, handle, mut stream) = opened().await;

        let guid = handle
            .arrive_device("Socket S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await
            .unwrap();
        let (event, _) = next_event(&mut stream).await;
        assert_eq!(event.kind, EventKind::DeviceArrival);

        let device = peer.open_device(&guid).await.unwrap();
        assert_eq!(handle.device_handle(&guid), Some(device.handle()));

        device.close().await.unwrap();
        assert!(!handle.is_device_open(&guid));

        let err = device.close().await.unwrap_err();
        assert!(err.is_already_closed());
    }

    #[tokio::test]
    async fn test_mock_decode_uses_device_handle() {
        let (peer, handle, mut stream) = opened().await;
        let guid = handle
            .arrive_device("Socket S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await
            .unwrap();
        let _ = next_event(&mut stream).await;
        let device = peer.open_device(&guid).await.unwrap();

        handle.decode(&guid, b"HI", 26, "QR Code").await.unwrap();
        let (event, origin) = next_event(&mut stream).await;
        assert_eq!(origin, device.handle());
        match event.value {
            EventValue::DecodedData(payload) => assert_eq!(&payload.data[..], b"HI"),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_default_battery() {
        let (peer, handle, _stream) = opened().await;
        let scanner = handle
            .arrive_device("S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await
            .unwrap();
        let reader = handle
            .arrive_device("D600", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();

        let query = Property::query(PropertyId::BatteryLevelDevice);
        let scanner = peer.open_device(&scanner).await.unwrap();
        let reader = peer.open_device(&reader).await.unwrap();
        assert_eq!(
            scanner.get_property(query.clone()).await.unwrap(),
            PropertyValue::Ulong(DEFAULT_BATTERY)
        );
        assert_eq!(
            reader.get_property(query).await.unwrap(),
            PropertyValue::Ulong(DEFAULT_NFC_BATTERY)
        );
    }

    #[tokio::test]
    async fn test_mock_data_source_roundtrip() {
        let (peer, handle, _stream) = opened().await;
        let guid = handle
            .arrive_device("S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await
            .unwrap();
        let device = peer.open_device(&guid).await.unwrap();

        let set = Property::new(
            PropertyId::DataSourceDevice,
            PropertyValue::DataSource(DataSource::with_status(7, DataSourceStatus::Disable)),
        );
        device.set_property(set).await.unwrap();

        let get = Property::new(
            PropertyId::DataSourceDevice,
            PropertyValue::DataSource(DataSource::status_query(7)),
        );
        let value = device.get_property(get).await.unwrap();
        assert_eq!(
            value.expect_data_source().unwrap().status,
            Some(DataSourceStatus::Disable)
        );
    }

    #[tokio::test]
    async fn test_mock_manager_favorite_starts_empty() {
        let (peer, handle, _stream) = opened().await;
        let guid = handle
            .arrive_manager("Socket D600 Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
            .await
            .unwrap();
        let manager = peer.open_device(&guid).await.unwrap();

        let favorite = manager
            .get_property(Property::query(PropertyId::Favorite))
            .await
            .unwrap();
        assert!(favorite.is_empty());
    }

    #[tokio::test]
    async fn test_mock_session_properties() {
        let (peer, handle, _stream) = opened().await;

        peer.set_property(Property::new(
            PropertyId::SocketCamStatus,
            PropertyValue::Byte(2),
        ))
        .await
        .unwrap();
        assert_eq!(
            handle.property_sets(PropertyId::SocketCamStatus),
            vec![PropertyValue::Byte(2)]
        );
        assert_eq!(
            handle.session_property(PropertyId::SocketCamStatus),
            Some(PropertyValue::Byte(2))
        );
    }

    #[tokio::test]
    async fn test_mock_unsupported_property() {
        let (peer, handle, _stream) = opened().await;
        let guid = handle
            .arrive_device("C820", DeviceType::new(DEVICE_TYPE_SOCKETCAM_C820))
            .await
            .unwrap();
        let device = peer.open_device(&guid).await.unwrap();

        let err = device
            .get_property(Property::query(PropertyId::OverlayViewDevice))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ESKT_NOT_SUPPORTED);
    }

    #[tokio::test]
    async fn test_mock_events_need_open_session() {
        let (_peer, handle) = MockPeer::new();
        let result = handle
            .arrive_device("S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await;
        assert_eq!(result, Err(PeerError::SinkClosed));
    }

    #[tokio::test]
    async fn test_mock_extension_status() {
        let (peer, handle, mut stream) = opened().await;
        peer.start_socketcam_extension().await.unwrap();
        assert_eq!(handle.call_count(MockOp::StartExtension), 1);

        handle.extension_status(2, "Ready").await.unwrap();
        match stream.recv().await.unwrap() {
            PeerNotification::Extension(notification) => assert!(notification.is_ready()),
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}
