//! Notifications pushed by the peer.
//!
//! The peer reports everything that happens on its side (device arrival and
//! removal, decoded data, battery changes) through a single [`EventSink`]
//! handed to it when the session is opened. The session consumes the other
//! end, an [`EventStream`], from one processing loop.
//!
//! ```text
//! ┌──────────┐  deliver()   ┌─────────────────┐  recv()   ┌──────────────┐
//! │ Peer     │─────────────►│  mpsc channel   │──────────►│ Session loop │
//! │ callbacks│              └─────────────────┘           └──────────────┘
//! └──────────┘
//! ```

use bytes::Bytes;
use capture_core::constants::{ESKT_CANCEL, EXTENSION_STATUS_READY};
use capture_core::{EventCategory, EventKind, Handle};
use tokio::sync::mpsc;

use crate::error::{PeerError, Result};
use crate::types::DeviceInfo;

/// Decoded data payload as produced by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Raw decoded bytes.
    pub data: Bytes,

    /// Symbology identifier.
    pub symbology_id: u32,

    /// Human readable symbology name (e.g., "QR Code").
    pub symbology_name: String,
}

impl DecodedPayload {
    pub fn new(data: impl Into<Bytes>, symbology_id: u32, symbology_name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            symbology_id,
            symbology_name: symbology_name.into(),
        }
    }
}

/// Kind specific value of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValue {
    None,
    DeviceInfo(DeviceInfo),
    DecodedData(DecodedPayload),
    Level(u32),
}

/// One notification from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    /// What happened.
    pub kind: EventKind,

    /// Shape of `value`.
    pub category: EventCategory,

    /// Kind specific payload.
    pub value: EventValue,

    /// Result code attached by the peer, if any.
    pub result: Option<i32>,
}

impl CaptureEvent {
    pub fn device_arrival(info: DeviceInfo) -> Self {
        Self::with_device_info(EventKind::DeviceArrival, info)
    }

    pub fn device_removal(info: DeviceInfo) -> Self {
        Self::with_device_info(EventKind::DeviceRemoval, info)
    }

    pub fn device_manager_arrival(info: DeviceInfo) -> Self {
        Self::with_device_info(EventKind::DeviceManagerArrival, info)
    }

    pub fn device_manager_removal(info: DeviceInfo) -> Self {
        Self::with_device_info(EventKind::DeviceManagerRemoval, info)
    }

    pub fn decoded_data(payload: DecodedPayload) -> Self {
        Self {
            kind: EventKind::DecodedData,
            category: EventCategory::DecodedData,
            value: EventValue::DecodedData(payload),
            result: None,
        }
    }

    /// A decoded data notification reporting the scan was cancelled.
    pub fn cancelled_scan() -> Self {
        Self {
            kind: EventKind::DecodedData,
            category: EventCategory::DecodedData,
            value: EventValue::None,
            result: Some(ESKT_CANCEL),
        }
    }

    pub fn battery_level(percent: u32) -> Self {
        Self {
            kind: EventKind::BatteryLevel,
            category: EventCategory::Ulong,
            value: EventValue::Level(percent),
            result: None,
        }
    }

    /// An event this layer has no dedicated constructor for.
    pub fn other(code: i32) -> Self {
        Self {
            kind: EventKind::from_code(code),
            category: EventCategory::None,
            value: EventValue::None,
            result: None,
        }
    }

    /// Returns `true` if the peer tagged the event as a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.result == Some(ESKT_CANCEL)
    }

    /// Device descriptor carried by arrival and removal events.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        match &self.value {
            EventValue::DeviceInfo(info) => Some(info),
            _ => None,
        }
    }

    fn with_device_info(kind: EventKind, info: DeviceInfo) -> Self {
        Self {
            kind,
            category: EventCategory::DeviceInfo,
            value: EventValue::DeviceInfo(info),
            result: None,
        }
    }
}

/// Out-of-band lifecycle report of the native SocketCam extension.
///
/// Only Android hosts run the extension; it is not part of the capture
/// event vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNotification {
    /// Lifecycle status code.
    pub status: i32,

    /// Human readable status.
    pub message: String,
}

impl ExtensionNotification {
    pub fn new(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` once the extension can serve SocketCam requests.
    pub fn is_ready(&self) -> bool {
        self.status == EXTENSION_STATUS_READY
    }
}

/// Anything the peer pushes towards the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerNotification {
    /// A capture event and the handle of the connection it originated from.
    Event { event: CaptureEvent, handle: Handle },

    /// A SocketCam extension lifecycle report.
    Extension(ExtensionNotification),
}

/// Sending half of the peer notification channel.
///
/// Cloned freely by peer implementations; every clone feeds the same
/// session loop.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<PeerNotification>,
}

impl EventSink {
    /// Create a connected sink and stream pair.
    pub fn channel(capacity: usize) -> (EventSink, EventStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (EventSink { tx }, EventStream { rx })
    }

    /// Deliver a capture event, waiting for queue space.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if the session stopped listening.
    pub async fn deliver(&self, event: CaptureEvent, handle: Handle) -> Result<()> {
        self.tx
            .send(PeerNotification::Event { event, handle })
            .await
            .map_err(|_| PeerError::SinkClosed)
    }

    /// Deliver a capture event without waiting.
    ///
    /// Meant for synchronous callback contexts. A full queue is reported as
    /// an error instead of blocking the caller.
    pub fn try_deliver(&self, event: CaptureEvent, handle: Handle) -> Result<()> {
        match self.tx.try_send(PeerNotification::Event { event, handle }) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Event queue full, dropping notification");
                Err(PeerError::rejected(
                    capture_core::constants::ESKT_WAIT_TIMEOUT,
                    "event queue full",
                ))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PeerError::SinkClosed),
        }
    }

    /// Deliver a SocketCam extension lifecycle report.
    ///
    /// # Errors
    ///
    /// Returns `PeerError::SinkClosed` if the session stopped listening.
    pub async fn extension_status(&self, notification: ExtensionNotification) -> Result<()> {
        self.tx
            .send(PeerNotification::Extension(notification))
            .await
            .map_err(|_| PeerError::SinkClosed)
    }

    /// Returns `true` if the receiving session is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of the peer notification channel.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<PeerNotification>,
}

impl EventStream {
    /// Receive the next notification.
    ///
    /// Returns `None` once every sink has been dropped.
    pub async fn recv(&mut self) -> Option<PeerNotification> {
        self.rx.recv().await
    }

    /// Receive a notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<PeerNotification> {
        self.rx.try_recv().ok()
    }
}
