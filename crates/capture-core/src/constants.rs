//! Core constants for the capture session layer.
//!
//! This module collects the numeric codes shared with the capture peer
//! (event ids, error codes, property ids, device type codes) together with
//! the defaults used by session configuration.
//!
//! # Device Type Layout
//!
//! Device type codes reported by the peer pack the connection interface in
//! the third byte and a product identifier in the low half-word:
//!
//! ```text
//! 0x00 II PPPP
//!      ^^ ^^^^
//!      |  product id
//!      interface (see DeviceInterface)
//! ```
//!
//! # Usage
//!
//! ```
//! use capture_core::constants::*;
//!
//! assert_eq!((DEVICE_TYPE_SCANNER_S740 >> 16) & 0xFF, 3);
//! assert!(NFC_DEVICE_TYPES.contains(&DEVICE_TYPE_READER_D600));
//! assert_eq!(ESKT_ALREADY_CLOSED, -38);
//! ```

// ============================================================================
// Event Identifiers
// ============================================================================

/// A device became available and can be opened.
pub const EVENT_DEVICE_ARRIVAL: i32 = 1;

/// A previously announced device is no longer available.
pub const EVENT_DEVICE_REMOVAL: i32 = 2;

/// A device decoded a barcode or read a tag.
pub const EVENT_DECODED_DATA: i32 = 5;

/// Power state change notification.
pub const EVENT_POWER: i32 = 6;

/// Battery level push notification.
pub const EVENT_BATTERY_LEVEL: i32 = 8;

/// A device manager (bridge) became available.
pub const EVENT_DEVICE_MANAGER_ARRIVAL: i32 = 11;

/// A device manager (bridge) is no longer available.
pub const EVENT_DEVICE_MANAGER_REMOVAL: i32 = 12;

// ============================================================================
// Event Categories
// ============================================================================

/// Event carries no value.
pub const EVENT_TYPE_NONE: i32 = 0;

/// Event value is a single byte.
pub const EVENT_TYPE_BYTE: i32 = 1;

/// Event value is an unsigned 32-bit integer.
pub const EVENT_TYPE_ULONG: i32 = 2;

/// Event value is a byte array.
pub const EVENT_TYPE_ARRAY: i32 = 3;

/// Event value is a string.
pub const EVENT_TYPE_STRING: i32 = 4;

/// Event value is a decoded data record.
pub const EVENT_TYPE_DECODED_DATA: i32 = 5;

/// Event value is a device descriptor.
pub const EVENT_TYPE_DEVICE_INFO: i32 = 6;

// ============================================================================
// Error Codes
// ============================================================================

/// No error.
pub const ESKT_NOERROR: i32 = 0;

/// The operation was cancelled by the user.
///
/// Decoded data events carrying this result code are scan cancellations
/// (for example the SocketCam view was dismissed) and hold no data.
pub const ESKT_CANCEL: i32 = -3;

/// The peer could not open its transport.
///
/// On Android this is reported when the companion application that hosts
/// the capture service is not installed.
pub const ESKT_UNABLE_OPEN_DEVICE: i32 = -27;

/// The resource was already closed through another path.
///
/// Disabling SocketCam on Android closes the camera device from the native
/// extension; the subsequent close from the session reports this code and
/// must be ignored.
pub const ESKT_ALREADY_CLOSED: i32 = -38;

/// The target does not support the requested property.
pub const ESKT_NOT_SUPPORTED: i32 = -15;

/// The handle does not refer to an open session or device.
pub const ESKT_INVALID_HANDLE: i32 = -18;

/// Locally generated code for a peer call that did not resolve in time.
pub const ESKT_WAIT_TIMEOUT: i32 = 1;

// ============================================================================
// Property Identifiers
// ============================================================================

/// Friendly (display) name of a device.
pub const PROPERTY_FRIENDLY_NAME_DEVICE: u32 = 0x4005_0200;

/// Battery level of a device.
pub const PROPERTY_BATTERY_LEVEL_DEVICE: u32 = 0x4001_0A00;

/// Symbology (data source) configuration of a device.
pub const PROPERTY_DATA_SOURCE_DEVICE: u32 = 0x4008_0300;

/// Trigger control of a device.
pub const PROPERTY_TRIGGER_DEVICE: u32 = 0x4001_0500;

/// Favorite devices of a device manager.
pub const PROPERTY_FAVORITE: u32 = 0x4005_0600;

/// SocketCam extension status of the session.
pub const PROPERTY_SOCKETCAM_STATUS: u32 = 0x8001_0700;

/// Overlay view configuration of a SocketCam device.
pub const PROPERTY_OVERLAY_VIEW_DEVICE: u32 = 0x4009_0800;

// ============================================================================
// Device Types
// ============================================================================

/// Socket Mobile 7Ci barcode scanner (Bluetooth classic).
pub const DEVICE_TYPE_SCANNER_7CI: u32 = 0x0003_0002;

/// Socket Mobile S740 barcode scanner (Bluetooth classic).
pub const DEVICE_TYPE_SCANNER_S740: u32 = 0x0003_0014;

/// Socket Mobile S700 barcode scanner (Bluetooth classic).
pub const DEVICE_TYPE_SCANNER_S700: u32 = 0x0003_0015;

/// Socket Mobile D600 NFC reader (Bluetooth LE).
pub const DEVICE_TYPE_READER_D600: u32 = 0x0005_0001;

/// Socket Mobile S550 NFC reader (Bluetooth LE).
pub const DEVICE_TYPE_READER_S550: u32 = 0x0005_0002;

/// Socket Mobile S370 NFC reader and barcode scanner (Bluetooth LE).
pub const DEVICE_TYPE_READER_S370: u32 = 0x0005_0003;

/// Socket Mobile S320 barcode scanner (Bluetooth LE).
pub const DEVICE_TYPE_SCANNER_S320: u32 = 0x0005_0010;

/// SocketCam C820 camera scanner.
pub const DEVICE_TYPE_SOCKETCAM_C820: u32 = 0x0006_0001;

/// SocketCam C860 camera scanner.
pub const DEVICE_TYPE_SOCKETCAM_C860: u32 = 0x0006_0002;

/// Device types belonging to the NFC reader family.
///
/// These devices report their battery level as a plain percentage.
pub const NFC_DEVICE_TYPES: &[u32] = &[
    DEVICE_TYPE_READER_D600,
    DEVICE_TYPE_READER_S550,
    DEVICE_TYPE_READER_S370,
];

/// Device types belonging to the SocketCam camera scanner family.
pub const SOCKETCAM_DEVICE_TYPES: &[u32] = &[DEVICE_TYPE_SOCKETCAM_C820, DEVICE_TYPE_SOCKETCAM_C860];

// ============================================================================
// Data Sources
// ============================================================================

/// EAN-13 symbology data source id.
pub const DATA_SOURCE_EAN13: u32 = 7;

/// QR Code symbology data source id.
pub const DATA_SOURCE_QR_CODE: u32 = 26;

/// Data source flag selecting the enable/disable status.
pub const DATA_SOURCE_FLAG_STATUS: u32 = 0x01;

// ============================================================================
// SocketCam
// ============================================================================

/// Context value written to the overlay view property of a SocketCam device.
pub const SOCKETCAM_CONTEXT: u32 = 0x1234;

/// Key of the context value in the overlay view property object.
pub const SOCKETCAM_CONTEXT_KEY: &str = "SocketCamContext";

/// Extension lifecycle status reporting the native extension is ready.
pub const EXTENSION_STATUS_READY: i32 = 2;

// ============================================================================
// Session Defaults
// ============================================================================

/// First sequence id assigned to a decoded data record.
pub const DEFAULT_SEQUENCE_BASE: u64 = 1;

/// Default timeout for a single peer call, in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5000;

/// Default capacity of the session message queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Favorite value meaning "any device in range".
pub const FAVORITE_WILDCARD: &str = "*";

/// Status text shown when the peer reports the companion app is missing.
pub const COMPANION_APP_HINT: &str = "Is Socket Mobile Companion app installed?";
