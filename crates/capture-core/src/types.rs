use crate::{
    Result,
    constants::{
        DATA_SOURCE_FLAG_STATUS, EVENT_BATTERY_LEVEL, EVENT_DECODED_DATA, EVENT_DEVICE_ARRIVAL,
        EVENT_DEVICE_MANAGER_ARRIVAL, EVENT_DEVICE_MANAGER_REMOVAL, EVENT_DEVICE_REMOVAL,
        EVENT_TYPE_ARRAY, EVENT_TYPE_BYTE, EVENT_TYPE_DECODED_DATA, EVENT_TYPE_DEVICE_INFO,
        EVENT_TYPE_NONE, EVENT_TYPE_STRING, EVENT_TYPE_ULONG, NFC_DEVICE_TYPES,
        PROPERTY_BATTERY_LEVEL_DEVICE, PROPERTY_DATA_SOURCE_DEVICE, PROPERTY_FAVORITE,
        PROPERTY_FRIENDLY_NAME_DEVICE, PROPERTY_OVERLAY_VIEW_DEVICE, PROPERTY_SOCKETCAM_STATUS,
        PROPERTY_TRIGGER_DEVICE, SOCKETCAM_DEVICE_TYPES,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable device identifier assigned by the peer.
///
/// The guid is opaque: it is only compared for equality and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Create a guid from the peer supplied string.
    ///
    /// # Errors
    /// Returns `Error::InvalidGuid` if the string is empty or blank.
    pub fn new(guid: impl Into<String>) -> Result<Self> {
        let guid = guid.into();
        if guid.trim().is_empty() {
            return Err(Error::InvalidGuid("guid must not be empty".to_string()));
        }
        Ok(Guid(guid))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Guid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Guid::new(s)
    }
}

/// Runtime handle of an open session or device connection.
///
/// Handles correlate event notifications to the connection they came from.
/// The peer may hand out the same value again once a connection is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Handle(raw)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection interface encoded in a device type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceInterface {
    Unknown = 0,
    Sd = 1,
    Cf = 2,
    Bluetooth = 3,
    Serial = 4,
    BluetoothLe = 5,
    SoftScan = 6,
}

impl DeviceInterface {
    /// Map an interface byte to its variant.
    ///
    /// Interfaces this layer does not know about map to `Unknown`; they are
    /// handled like any other non-Bluetooth-LE interface.
    #[inline]
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => DeviceInterface::Sd,
            2 => DeviceInterface::Cf,
            3 => DeviceInterface::Bluetooth,
            4 => DeviceInterface::Serial,
            5 => DeviceInterface::BluetoothLe,
            6 => DeviceInterface::SoftScan,
            _ => DeviceInterface::Unknown,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DeviceInterface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DeviceInterface::Unknown => "Unknown",
            DeviceInterface::Sd => "SD",
            DeviceInterface::Cf => "CF",
            DeviceInterface::Bluetooth => "Bluetooth",
            DeviceInterface::Serial => "Serial",
            DeviceInterface::BluetoothLe => "Bluetooth LE",
            DeviceInterface::SoftScan => "SoftScan",
        };
        f.write_str(name)
    }
}

/// Device type code as reported by the peer.
///
/// # Examples
///
/// ```
/// use capture_core::{DeviceInterface, DeviceType};
/// use capture_core::constants::{DEVICE_TYPE_READER_D600, DEVICE_TYPE_SOCKETCAM_C820};
///
/// let d600 = DeviceType::new(DEVICE_TYPE_READER_D600);
/// assert_eq!(d600.interface(), DeviceInterface::BluetoothLe);
/// assert!(d600.is_nfc());
///
/// assert!(DeviceType::new(DEVICE_TYPE_SOCKETCAM_C820).is_socketcam());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(u32);

impl DeviceType {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        DeviceType(raw)
    }

    #[must_use]
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Connection interface stored in bits 16..24 of the type code.
    #[must_use]
    pub fn interface(&self) -> DeviceInterface {
        DeviceInterface::from_u8(((self.0 >> 16) & 0xFF) as u8)
    }

    /// Returns `true` for NFC reader family devices.
    #[must_use]
    pub fn is_nfc(&self) -> bool {
        NFC_DEVICE_TYPES.contains(&self.0)
    }

    /// Returns `true` for SocketCam camera scanners.
    #[must_use]
    pub fn is_socketcam(&self) -> bool {
        SOCKETCAM_DEVICE_TYPES.contains(&self.0)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Host platform the session runs on.
///
/// The platform selects the SocketCam status set and the battery decoding
/// rule for Bluetooth LE devices. It is fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Android,
    Ios,
}

impl HostPlatform {
    /// Platform of the running binary.
    ///
    /// Anything that is not Android uses the iOS rules, which have no
    /// extension lifecycle to manage.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(target_os = "android") {
            HostPlatform::Android
        } else {
            HostPlatform::Ios
        }
    }

    /// Returns `true` if SocketCam requires a native extension to be started.
    #[must_use]
    pub fn has_extension_lifecycle(self) -> bool {
        matches!(self, HostPlatform::Android)
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostPlatform::Android => write!(f, "android"),
            HostPlatform::Ios => write!(f, "ios"),
        }
    }
}

/// Scan trigger behavior for camera based scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TriggerMode {
    #[default]
    Start = 1,
    Stop = 2,
    ContinuousScan = 5,
}

impl TriggerMode {
    /// # Errors
    /// Returns `Error::InvalidTriggerMode` for codes other than 1, 2 or 5.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(TriggerMode::Start),
            2 => Ok(TriggerMode::Stop),
            5 => Ok(TriggerMode::ContinuousScan),
            _ => Err(Error::InvalidTriggerMode(value)),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the scan view should stay open across decodes.
    #[inline]
    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, TriggerMode::ContinuousScan)
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriggerMode::Start => write!(f, "Start"),
            TriggerMode::Stop => write!(f, "Stop"),
            TriggerMode::ContinuousScan => write!(f, "Continuous Scan"),
        }
    }
}

/// Properties exchanged with the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyId {
    FriendlyNameDevice,
    BatteryLevelDevice,
    DataSourceDevice,
    TriggerDevice,
    Favorite,
    SocketCamStatus,
    OverlayViewDevice,
}

impl PropertyId {
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            PropertyId::FriendlyNameDevice => PROPERTY_FRIENDLY_NAME_DEVICE,
            PropertyId::BatteryLevelDevice => PROPERTY_BATTERY_LEVEL_DEVICE,
            PropertyId::DataSourceDevice => PROPERTY_DATA_SOURCE_DEVICE,
            PropertyId::TriggerDevice => PROPERTY_TRIGGER_DEVICE,
            PropertyId::Favorite => PROPERTY_FAVORITE,
            PropertyId::SocketCamStatus => PROPERTY_SOCKETCAM_STATUS,
            PropertyId::OverlayViewDevice => PROPERTY_OVERLAY_VIEW_DEVICE,
        }
    }

    /// # Errors
    /// Returns `Error::InvalidPropertyId` for codes outside the known set.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            PROPERTY_FRIENDLY_NAME_DEVICE => Ok(PropertyId::FriendlyNameDevice),
            PROPERTY_BATTERY_LEVEL_DEVICE => Ok(PropertyId::BatteryLevelDevice),
            PROPERTY_DATA_SOURCE_DEVICE => Ok(PropertyId::DataSourceDevice),
            PROPERTY_TRIGGER_DEVICE => Ok(PropertyId::TriggerDevice),
            PROPERTY_FAVORITE => Ok(PropertyId::Favorite),
            PROPERTY_SOCKETCAM_STATUS => Ok(PropertyId::SocketCamStatus),
            PROPERTY_OVERLAY_VIEW_DEVICE => Ok(PropertyId::OverlayViewDevice),
            _ => Err(Error::InvalidPropertyId(code)),
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PropertyId::FriendlyNameDevice => "FriendlyNameDevice",
            PropertyId::BatteryLevelDevice => "BatteryLevelDevice",
            PropertyId::DataSourceDevice => "DataSourceDevice",
            PropertyId::TriggerDevice => "TriggerDevice",
            PropertyId::Favorite => "Favorite",
            PropertyId::SocketCamStatus => "SocketCamStatus",
            PropertyId::OverlayViewDevice => "OverlayViewDevice",
        };
        f.write_str(name)
    }
}

/// Wire type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    None,
    Byte,
    Ulong,
    Array,
    String,
    DataSource,
    Object,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Enablement status of a symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataSourceStatus {
    Disable = 0,
    Enable = 1,
    NotSupported = 2,
}

impl DataSourceStatus {
    /// # Errors
    /// Returns `Error::InvalidDataSourceStatus` for codes other than 0, 1 or 2.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DataSourceStatus::Disable),
            1 => Ok(DataSourceStatus::Enable),
            2 => Ok(DataSourceStatus::NotSupported),
            _ => Err(Error::InvalidDataSourceStatus(value)),
        }
    }
}

/// Symbology configuration exchanged through the data source property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Symbology identifier (e.g. EAN-13).
    pub id: u32,

    /// Which aspects of the data source the request addresses.
    pub flags: u32,

    /// Enablement status; absent in a get request.
    pub status: Option<DataSourceStatus>,
}

impl DataSource {
    /// Request the status of a symbology.
    #[must_use]
    pub fn status_query(id: u32) -> Self {
        Self {
            id,
            flags: DATA_SOURCE_FLAG_STATUS,
            status: None,
        }
    }

    /// Change the status of a symbology.
    #[must_use]
    pub fn with_status(id: u32, status: DataSourceStatus) -> Self {
        Self {
            id,
            flags: DATA_SOURCE_FLAG_STATUS,
            status: Some(status),
        }
    }
}

/// Typed property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    None,
    Byte(u8),
    Ulong(u32),
    Array(Vec<u8>),
    String(String),
    DataSource(DataSource),
    Object(BTreeMap<String, u32>),
}

impl PropertyValue {
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::None => PropertyType::None,
            PropertyValue::Byte(_) => PropertyType::Byte,
            PropertyValue::Ulong(_) => PropertyType::Ulong,
            PropertyValue::Array(_) => PropertyType::Array,
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::DataSource(_) => PropertyType::DataSource,
            PropertyValue::Object(_) => PropertyType::Object,
        }
    }

    /// Returns `true` for values that carry no content.
    ///
    /// An empty favorite list is reported as an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::None => true,
            PropertyValue::String(s) => s.is_empty(),
            PropertyValue::Array(a) => a.is_empty(),
            PropertyValue::Object(o) => o.is_empty(),
            PropertyValue::Byte(_) | PropertyValue::Ulong(_) | PropertyValue::DataSource(_) => {
                false
            }
        }
    }

    /// # Errors
    /// Returns `Error::UnexpectedPropertyValue` if the value is not a byte.
    pub fn expect_byte(&self) -> Result<u8> {
        match self {
            PropertyValue::Byte(b) => Ok(*b),
            other => Err(other.mismatch(PropertyType::Byte)),
        }
    }

    /// Numeric value as an unsigned 32-bit integer; bytes are widened.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedPropertyValue` for non numeric values.
    pub fn expect_ulong(&self) -> Result<u32> {
        match self {
            PropertyValue::Ulong(v) => Ok(*v),
            PropertyValue::Byte(b) => Ok(u32::from(*b)),
            other => Err(other.mismatch(PropertyType::Ulong)),
        }
    }

    /// # Errors
    /// Returns `Error::UnexpectedPropertyValue` if the value is not a string.
    pub fn expect_string(&self) -> Result<&str> {
        match self {
            PropertyValue::String(s) => Ok(s),
            other => Err(other.mismatch(PropertyType::String)),
        }
    }

    /// # Errors
    /// Returns `Error::UnexpectedPropertyValue` if the value is not a data source.
    pub fn expect_data_source(&self) -> Result<&DataSource> {
        match self {
            PropertyValue::DataSource(ds) => Ok(ds),
            other => Err(other.mismatch(PropertyType::DataSource)),
        }
    }

    fn mismatch(&self, expected: PropertyType) -> Error {
        Error::UnexpectedPropertyValue {
            expected: expected.to_string(),
            actual: self.property_type().to_string(),
        }
    }
}

/// A property request: the property id and the value to send.
///
/// Get requests carry [`PropertyValue::None`] unless the property needs an
/// argument (a data source query names the symbology it asks about).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub value: PropertyValue,
}

impl Property {
    #[must_use]
    pub fn new(id: PropertyId, value: PropertyValue) -> Self {
        Self { id, value }
    }

    /// A get request without argument.
    #[must_use]
    pub fn query(id: PropertyId) -> Self {
        Self::new(id, PropertyValue::None)
    }

    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }
}

/// Kind of notification delivered by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    DeviceArrival,
    DeviceRemoval,
    DecodedData,
    BatteryLevel,
    DeviceManagerArrival,
    DeviceManagerRemoval,
    /// Any event id this layer does not react to.
    Unknown(i32),
}

impl EventKind {
    #[inline]
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            EVENT_DEVICE_ARRIVAL => EventKind::DeviceArrival,
            EVENT_DEVICE_REMOVAL => EventKind::DeviceRemoval,
            EVENT_DECODED_DATA => EventKind::DecodedData,
            EVENT_BATTERY_LEVEL => EventKind::BatteryLevel,
            EVENT_DEVICE_MANAGER_ARRIVAL => EventKind::DeviceManagerArrival,
            EVENT_DEVICE_MANAGER_REMOVAL => EventKind::DeviceManagerRemoval,
            other => EventKind::Unknown(other),
        }
    }

    #[inline]
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            EventKind::DeviceArrival => EVENT_DEVICE_ARRIVAL,
            EventKind::DeviceRemoval => EVENT_DEVICE_REMOVAL,
            EventKind::DecodedData => EVENT_DECODED_DATA,
            EventKind::BatteryLevel => EVENT_BATTERY_LEVEL,
            EventKind::DeviceManagerArrival => EVENT_DEVICE_MANAGER_ARRIVAL,
            EventKind::DeviceManagerRemoval => EVENT_DEVICE_MANAGER_REMOVAL,
            EventKind::Unknown(code) => code,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventKind::DeviceArrival => write!(f, "DeviceArrival"),
            EventKind::DeviceRemoval => write!(f, "DeviceRemoval"),
            EventKind::DecodedData => write!(f, "DecodedData"),
            EventKind::BatteryLevel => write!(f, "BatteryLevel"),
            EventKind::DeviceManagerArrival => write!(f, "DeviceManagerArrival"),
            EventKind::DeviceManagerRemoval => write!(f, "DeviceManagerRemoval"),
            EventKind::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Category (value shape) of a peer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum EventCategory {
    None = 0,
    Byte = 1,
    Ulong = 2,
    Array = 3,
    String = 4,
    DecodedData = 5,
    DeviceInfo = 6,
}

impl EventCategory {
    /// # Errors
    /// Returns `Error::InvalidEventCategory` for codes outside 0..=6.
    #[inline]
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            EVENT_TYPE_NONE => Ok(EventCategory::None),
            EVENT_TYPE_BYTE => Ok(EventCategory::Byte),
            EVENT_TYPE_ULONG => Ok(EventCategory::Ulong),
            EVENT_TYPE_ARRAY => Ok(EventCategory::Array),
            EVENT_TYPE_STRING => Ok(EventCategory::String),
            EVENT_TYPE_DECODED_DATA => Ok(EventCategory::DecodedData),
            EVENT_TYPE_DEVICE_INFO => Ok(EventCategory::DeviceInfo),
            _ => Err(Error::InvalidEventCategory(code)),
        }
    }

    #[inline]
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use rstest::rstest;

    #[test]
    fn test_guid_rejects_blank() {
        assert!(Guid::new("").is_err());
        assert!(Guid::new("   ").is_err());
        let guid: Guid = "b876d9a8-85b6-1bb5-f1f6-1bb5d78a2c6e".parse().unwrap();
        assert_eq!(guid.as_str(), "b876d9a8-85b6-1bb5-f1f6-1bb5d78a2c6e");
    }

    #[rstest]
    #[case(DEVICE_TYPE_SCANNER_S740, DeviceInterface::Bluetooth)]
    #[case(DEVICE_TYPE_READER_D600, DeviceInterface::BluetoothLe)]
    #[case(DEVICE_TYPE_SOCKETCAM_C820, DeviceInterface::SoftScan)]
    #[case(0x00FF_0001, DeviceInterface::Unknown)]
    fn test_device_interface_from_type(#[case] raw: u32, #[case] expected: DeviceInterface) {
        assert_eq!(DeviceType::new(raw).interface(), expected);
    }

    #[rstest]
    #[case(DEVICE_TYPE_READER_D600, true, false)]
    #[case(DEVICE_TYPE_READER_S550, true, false)]
    #[case(DEVICE_TYPE_SCANNER_S740, false, false)]
    #[case(DEVICE_TYPE_SOCKETCAM_C860, false, true)]
    fn test_device_families(#[case] raw: u32, #[case] nfc: bool, #[case] socketcam: bool) {
        let ty = DeviceType::new(raw);
        assert_eq!(ty.is_nfc(), nfc);
        assert_eq!(ty.is_socketcam(), socketcam);
    }

    #[rstest]
    #[case(1, TriggerMode::Start)]
    #[case(2, TriggerMode::Stop)]
    #[case(5, TriggerMode::ContinuousScan)]
    fn test_trigger_mode_codes(#[case] code: u8, #[case] expected: TriggerMode) {
        let mode = TriggerMode::from_u8(code).unwrap();
        assert_eq!(mode, expected);
        assert_eq!(mode.to_u8(), code);
    }

    #[test]
    fn test_trigger_mode_invalid_and_continuous() {
        assert!(TriggerMode::from_u8(0).is_err());
        assert!(TriggerMode::from_u8(3).is_err());
        assert!(TriggerMode::ContinuousScan.is_continuous());
        assert!(!TriggerMode::Start.is_continuous());
        assert_eq!(TriggerMode::default(), TriggerMode::Start);
    }

    #[test]
    fn test_property_id_code_mapping() {
        let all = [
            PropertyId::FriendlyNameDevice,
            PropertyId::BatteryLevelDevice,
            PropertyId::DataSourceDevice,
            PropertyId::TriggerDevice,
            PropertyId::Favorite,
            PropertyId::SocketCamStatus,
            PropertyId::OverlayViewDevice,
        ];
        for id in all {
            assert_eq!(PropertyId::from_code(id.code()).unwrap(), id);
        }
        assert!(PropertyId::from_code(0xDEAD_BEEF).is_err());
    }

    #[rstest]
    #[case(EVENT_DEVICE_ARRIVAL, EventKind::DeviceArrival)]
    #[case(EVENT_DEVICE_REMOVAL, EventKind::DeviceRemoval)]
    #[case(EVENT_DECODED_DATA, EventKind::DecodedData)]
    #[case(EVENT_BATTERY_LEVEL, EventKind::BatteryLevel)]
    #[case(EVENT_DEVICE_MANAGER_ARRIVAL, EventKind::DeviceManagerArrival)]
    #[case(EVENT_DEVICE_MANAGER_REMOVAL, EventKind::DeviceManagerRemoval)]
    #[case(EVENT_POWER, EventKind::Unknown(EVENT_POWER))]
    #[case(3, EventKind::Unknown(3))]
    #[case(4, EventKind::Unknown(4))]
    #[case(7, EventKind::Unknown(7))]
    fn test_event_kind_from_code(#[case] code: i32, #[case] expected: EventKind) {
        assert_eq!(EventKind::from_code(code), expected);
        assert_eq!(expected.code(), code);
    }

    #[test]
    fn test_event_category_from_code() {
        assert_eq!(
            EventCategory::from_code(EVENT_TYPE_DEVICE_INFO).unwrap(),
            EventCategory::DeviceInfo
        );
        assert!(EventCategory::from_code(42).is_err());
    }

    #[test]
    fn test_property_value_accessors() {
        assert_eq!(PropertyValue::Byte(3).expect_byte().unwrap(), 3);
        assert_eq!(PropertyValue::Byte(3).expect_ulong().unwrap(), 3);
        assert_eq!(PropertyValue::Ulong(0x1A00).expect_ulong().unwrap(), 0x1A00);
        assert_eq!(
            PropertyValue::String("S740".into()).expect_string().unwrap(),
            "S740"
        );

        let err = PropertyValue::None.expect_string().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected property value: expected String, got None"
        );
    }

    #[test]
    fn test_property_value_is_empty() {
        assert!(PropertyValue::None.is_empty());
        assert!(PropertyValue::String(String::new()).is_empty());
        assert!(!PropertyValue::String("*".into()).is_empty());
        assert!(!PropertyValue::Byte(0).is_empty());
    }

    #[test]
    fn test_property_query_has_no_value() {
        let property = Property::query(PropertyId::BatteryLevelDevice);
        assert_eq!(property.property_type(), PropertyType::None);
    }

    #[test]
    fn test_data_source_requests() {
        let query = DataSource::status_query(DATA_SOURCE_EAN13);
        assert_eq!(query.flags, DATA_SOURCE_FLAG_STATUS);
        assert!(query.status.is_none());

        let set = DataSource::with_status(DATA_SOURCE_EAN13, DataSourceStatus::Enable);
        assert_eq!(set.status, Some(DataSourceStatus::Enable));
        assert!(DataSourceStatus::from_u8(9).is_err());
    }

    #[test]
    fn test_host_platform_serialization() {
        let json = serde_json::to_string(&HostPlatform::Android).unwrap();
        assert_eq!(json, "\"android\"");
        let platform: HostPlatform = serde_json::from_str("\"ios\"").unwrap();
        assert_eq!(platform, HostPlatform::Ios);
        assert!(HostPlatform::Android.has_extension_lifecycle());
        assert!(!HostPlatform::Ios.has_extension_lifecycle());
    }
}
