//! Property client.
//!
//! Issues get/set property requests against a [`PropertyTarget`] (the
//! session itself or an opened device) and converts the answers into
//! typed values. Each call has exactly one outcome: the value, a
//! [`PeerError`] carrying the peer's code and message, or a timeout.
//! Calls are never retried or batched.
//!
//! # Battery Decoding
//!
//! Devices report the battery level in one of two encodings:
//!
//! | Device                              | Raw value      | Percentage |
//! |-------------------------------------|----------------|------------|
//! | NFC reader family                   | `0x0000_0050`  | raw        |
//! | Bluetooth LE interface on Android   | `0x0000_0050`  | raw        |
//! | Anything else                       | `0x0000_5000`  | bits 8..16 |
//!
//! ```
//! use capture_core::constants::{DEVICE_TYPE_READER_D600, DEVICE_TYPE_SCANNER_S740};
//! use capture_core::{DeviceType, HostPlatform};
//! use capture_session::property::decode_battery_level;
//!
//! let s740 = DeviceType::new(DEVICE_TYPE_SCANNER_S740);
//! let d600 = DeviceType::new(DEVICE_TYPE_READER_D600);
//!
//! assert_eq!(decode_battery_level(0x1A00, s740, HostPlatform::Ios), 26);
//! assert_eq!(decode_battery_level(0x1A00, d600, HostPlatform::Ios), 0x1A00);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use capture_core::constants::SOCKETCAM_CONTEXT_KEY;
use capture_core::{
    DataSource, DataSourceStatus, DeviceInterface, DeviceType, HostPlatform, Property, PropertyId,
    PropertyValue, TriggerMode,
};
use capture_peer::{PeerError, PropertyTarget};
use tracing::{trace, warn};

use crate::error::Result;

/// Convert a raw battery property value into a percentage.
pub fn decode_battery_level(raw: u32, device_type: DeviceType, platform: HostPlatform) -> u32 {
    if device_type.is_nfc() {
        return raw;
    }
    if device_type.interface() == DeviceInterface::BluetoothLe && platform == HostPlatform::Android
    {
        return raw;
    }
    (raw & 0xFF00) >> 8
}

/// Typed get/set property requests with a per call timeout.
#[derive(Debug, Clone, Copy)]
pub struct PropertyClient {
    platform: HostPlatform,
    timeout: Duration,
}

impl PropertyClient {
    pub fn new(platform: HostPlatform, timeout: Duration) -> Self {
        Self { platform, timeout }
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read a property that takes no argument.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn get<T: PropertyTarget>(&self, target: &T, id: PropertyId) -> Result<PropertyValue> {
        self.request(target, Property::query(id), false).await
    }

    /// Write a property and return the value echoed by the peer.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set<T: PropertyTarget>(
        &self,
        target: &T,
        id: PropertyId,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        self.request(target, Property::new(id, value), true).await
    }

    /// # Errors
    ///
    /// Returns the peer's rejection, a timeout, or a non string value.
    pub async fn friendly_name<T: PropertyTarget>(&self, target: &T) -> Result<String> {
        let value = self.get(target, PropertyId::FriendlyNameDevice).await?;
        Ok(value.expect_string()?.to_string())
    }

    /// Rename a device. Returns the name now in effect.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_friendly_name<T: PropertyTarget>(&self, target: &T, name: &str) -> Result<String> {
        self.set(
            target,
            PropertyId::FriendlyNameDevice,
            PropertyValue::String(name.to_string()),
        )
        .await?;
        Ok(name.to_string())
    }

    /// Battery level in percent, decoded for the device type.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection, a timeout, or a non numeric value.
    pub async fn battery_level<T: PropertyTarget>(
        &self,
        target: &T,
        device_type: DeviceType,
    ) -> Result<u32> {
        let raw = self
            .get(target, PropertyId::BatteryLevelDevice)
            .await?
            .expect_ulong()?;
        Ok(decode_battery_level(raw, device_type, self.platform))
    }

    /// Status of a symbology.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection, a timeout, or a value of the wrong shape.
    pub async fn data_source<T: PropertyTarget>(&self, target: &T, id: u32) -> Result<DataSource> {
        let query = Property::new(
            PropertyId::DataSourceDevice,
            PropertyValue::DataSource(DataSource::status_query(id)),
        );
        let value = self.request(target, query, false).await?;
        Ok(value.expect_data_source()?.clone())
    }

    /// Enable or disable a symbology.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_data_source<T: PropertyTarget>(
        &self,
        target: &T,
        id: u32,
        status: DataSourceStatus,
    ) -> Result<DataSource> {
        let data_source = DataSource::with_status(id, status);
        self.set(
            target,
            PropertyId::DataSourceDevice,
            PropertyValue::DataSource(data_source.clone()),
        )
        .await?;
        Ok(data_source)
    }

    /// Favorite devices of a device manager; empty when none is set.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection, a timeout, or a non string value.
    pub async fn favorite<T: PropertyTarget>(&self, target: &T) -> Result<String> {
        let value = self.get(target, PropertyId::Favorite).await?;
        if value.is_empty() {
            return Ok(String::new());
        }
        Ok(value.expect_string()?.to_string())
    }

    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_favorite<T: PropertyTarget>(&self, target: &T, favorite: &str) -> Result<()> {
        self.set(
            target,
            PropertyId::Favorite,
            PropertyValue::String(favorite.to_string()),
        )
        .await?;
        Ok(())
    }

    /// Raw SocketCam status code of the session.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection, a timeout, or a non byte value.
    pub async fn socketcam_status<T: PropertyTarget>(&self, session: &T) -> Result<u8> {
        let value = self.get(session, PropertyId::SocketCamStatus).await?;
        Ok(value.expect_byte()?)
    }

    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_socketcam_status<T: PropertyTarget>(&self, session: &T, code: u8) -> Result<()> {
        self.set(session, PropertyId::SocketCamStatus, PropertyValue::Byte(code))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_trigger<T: PropertyTarget>(&self, target: &T, mode: TriggerMode) -> Result<()> {
        self.set(target, PropertyId::TriggerDevice, PropertyValue::Byte(mode.to_u8()))
            .await?;
        Ok(())
    }

    /// Attach the overlay view context to a SocketCam device.
    ///
    /// # Errors
    ///
    /// Returns the peer's rejection or a timeout.
    pub async fn set_overlay_view<T: PropertyTarget>(&self, target: &T, context: u32) -> Result<()> {
        let mut object = BTreeMap::new();
        object.insert(SOCKETCAM_CONTEXT_KEY.to_string(), context);
        self.set(target, PropertyId::OverlayViewDevice, PropertyValue::Object(object))
            .await?;
        Ok(())
    }

    async fn request<T: PropertyTarget>(
        &self,
        target: &T,
        property: Property,
        is_set: bool,
    ) -> Result<PropertyValue> {
        let id = property.id;
        trace!(property = %id, kind = %property.property_type(), set = is_set, "Property request");

        let call = async {
            if is_set {
                target.set_property(property).await
            } else {
                target.get_property(property).await
            }
        };

        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PeerError::timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(value) => {
                trace!(property = %id, value = ?value, "Property response");
                Ok(value)
            }
            Err(err) => {
                warn!(property = %id, code = err.code(), "Property request failed: {}", err.message());
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_core::constants::*;
    use capture_core::Guid;
    use capture_peer::mock::{MockDevice, MockOp, MockPeer, MockPeerHandle};
    use capture_peer::{AppCredentials, CapturePeer, EventSink, EventStream};
    use rstest::rstest;

    use crate::error::SessionError;

    #[rstest]
    #[case::scanner_ios(DEVICE_TYPE_SCANNER_S740, HostPlatform::Ios, 0x1A00, 26)]
    #[case::scanner_android(DEVICE_TYPE_SCANNER_S740, HostPlatform::Android, 0x1A00, 26)]
    #[case::nfc_ios(DEVICE_TYPE_READER_D600, HostPlatform::Ios, 0x1A00, 0x1A00)]
    #[case::nfc_android(DEVICE_TYPE_READER_S550, HostPlatform::Android, 80, 80)]
    #[case::ble_android(DEVICE_TYPE_SCANNER_S320, HostPlatform::Android, 75, 75)]
    #[case::ble_ios(DEVICE_TYPE_SCANNER_S320, HostPlatform::Ios, 0x4B00, 75)]
    #[case::high_bits_ignored(DEVICE_TYPE_SCANNER_7CI, HostPlatform::Ios, 0xFFFF_6400, 100)]
    fn test_decode_battery_level(
        #[case] device_type: u32,
        #[case] platform: HostPlatform,
        #[case] raw: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(
            decode_battery_level(raw, DeviceType::new(device_type), platform),
            expected
        );
    }

    struct Fixture {
        peer: MockPeer,
        handle: MockPeerHandle,
        device: MockDevice,
        guid: Guid,
        _stream: EventStream,
    }

    async fn fixture(device_type: u32) -> Fixture {
        let (peer, handle) = MockPeer::new();
        let (sink, stream) = EventSink::channel(16);
        peer.open(&AppCredentials::new("ios:app", "dev", "key"), sink)
            .await
            .unwrap();
        let guid = handle
            .arrive_device("Socket S740", DeviceType::new(device_type))
            .await
            .unwrap();
        let device = peer.open_device(&guid).await.unwrap();
        Fixture {
            peer,
            handle,
            device,
            guid,
            _stream: stream,
        }
    }

    fn client(platform: HostPlatform) -> PropertyClient {
        PropertyClient::new(platform, Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS))
    }

    #[tokio::test]
    async fn test_friendly_name_roundtrip() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        let client = client(HostPlatform::Ios);

        assert_eq!(client.friendly_name(&f.device).await.unwrap(), "Socket S740");
        let name = client.set_friendly_name(&f.device, "Front Door").await.unwrap();
        assert_eq!(name, "Front Door");
        assert_eq!(client.friendly_name(&f.device).await.unwrap(), "Front Door");
    }

    #[tokio::test]
    async fn test_battery_level_is_decoded() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        f.handle.set_battery_raw(&f.guid, 0x1A00);

        let level = client(HostPlatform::Ios)
            .battery_level(&f.device, DeviceType::new(DEVICE_TYPE_SCANNER_S740))
            .await
            .unwrap();
        assert_eq!(level, 26);
    }

    #[tokio::test]
    async fn test_data_source_enable() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        let client = client(HostPlatform::Android);

        client
            .set_data_source(&f.device, DATA_SOURCE_EAN13, DataSourceStatus::Disable)
            .await
            .unwrap();
        let ds = client.data_source(&f.device, DATA_SOURCE_EAN13).await.unwrap();
        assert_eq!(ds.status, Some(DataSourceStatus::Disable));

        let ds = client.data_source(&f.device, DATA_SOURCE_QR_CODE).await.unwrap();
        assert_eq!(ds.status, Some(DataSourceStatus::Enable));
    }

    #[tokio::test]
    async fn test_rejection_surfaces_code_and_message() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        f.handle
            .fail_next(MockOp::GetProperty, PeerError::rejected(-15, "not supported"));

        let err = client(HostPlatform::Ios)
            .friendly_name(&f.device)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(-15));
        assert_eq!(err.to_string(), "-15: not supported");
        // Never retried
        assert_eq!(f.handle.call_count(MockOp::GetProperty), 1);
    }

    #[tokio::test]
    async fn test_wrong_value_shape() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        f.handle.set_device_property(
            &f.guid,
            Property::new(PropertyId::FriendlyNameDevice, PropertyValue::Byte(3)),
        );

        let err = client(HostPlatform::Ios)
            .friendly_name(&f.device)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Core(capture_core::Error::UnexpectedPropertyValue { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        f.handle.set_property_latency(Duration::from_secs(10));

        let err = PropertyClient::new(HostPlatform::Ios, Duration::from_millis(250))
            .friendly_name(&f.device)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Operation timeout after 250ms");
    }

    #[tokio::test]
    async fn test_session_level_properties() {
        let f = fixture(DEVICE_TYPE_SCANNER_S740).await;
        let client = client(HostPlatform::Android);

        assert_eq!(client.socketcam_status(&f.peer).await.unwrap(), 1);
        client.set_socketcam_status(&f.peer, 2).await.unwrap();
        assert_eq!(client.socketcam_status(&f.peer).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_favorite_and_overlay() {
        let f = fixture(DEVICE_TYPE_SOCKETCAM_C820).await;
        let client = client(HostPlatform::Ios);

        assert_eq!(client.favorite(&f.device).await.unwrap(), "");
        client.set_favorite(&f.device, FAVORITE_WILDCARD).await.unwrap();
        assert_eq!(client.favorite(&f.device).await.unwrap(), "*");

        client
            .set_overlay_view(&f.device, SOCKETCAM_CONTEXT)
            .await
            .unwrap();
        let sets = f.handle.property_sets(PropertyId::OverlayViewDevice);
        let PropertyValue::Object(object) = &sets[0] else {
            panic!("unexpected overlay value: {sets:?}");
        };
        assert_eq!(object.get(SOCKETCAM_CONTEXT_KEY), Some(&0x1234));
    }

    #[tokio::test]
    async fn test_set_trigger() {
        let f = fixture(DEVICE_TYPE_SOCKETCAM_C820).await;
        client(HostPlatform::Ios)
            .set_trigger(&f.device, TriggerMode::ContinuousScan)
            .await
            .unwrap();
        assert_eq!(
            f.handle.device_property(&f.guid, PropertyId::TriggerDevice),
            Some(PropertyValue::Byte(5))
        );
    }
}
