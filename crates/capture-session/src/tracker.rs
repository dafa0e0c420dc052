//! Decoded data tracker.
//!
//! Keeps the most recent decode and hands out strictly increasing sequence
//! ids. The counter is owned by the session; nothing here is global.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One decoded data record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedData {
    /// Payload bytes rendered as text.
    pub payload: String,

    /// Payload length in bytes.
    pub length: usize,

    pub symbology_name: String,

    /// Strictly increasing, never reused within a session.
    pub sequence_id: u64,

    /// Name of the originating device; `None` when the origin handle was
    /// not registered.
    pub device_name: Option<String>,

    pub received_at: DateTime<Utc>,
}

impl fmt::Display for DecodedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.symbology_name.to_uppercase(),
            self.length,
            self.payload
        )
    }
}

/// Most recent decode and the sequence counter.
#[derive(Debug, Clone)]
pub struct DecodedDataTracker {
    next_id: u64,
    current: Option<DecodedData>,
}

impl DecodedDataTracker {
    /// Create a tracker whose first record gets `sequence_base`.
    pub fn new(sequence_base: u64) -> Self {
        Self {
            next_id: sequence_base,
            current: None,
        }
    }

    /// Record a decode, superseding the previous one.
    ///
    /// Bytes that are not valid UTF-8 are rendered lossily.
    ///
    /// # Examples
    ///
    /// ```
    /// use capture_session::tracker::DecodedDataTracker;
    ///
    /// let mut tracker = DecodedDataTracker::new(1);
    /// let first = tracker.record(&[72, 73], "QR Code", None);
    /// assert_eq!(first.payload, "HI");
    /// assert_eq!(first.length, 2);
    /// assert_eq!(first.sequence_id, 1);
    ///
    /// let second = tracker.record(b"4006381333931", "EAN 13", Some("S740"));
    /// assert_eq!(second.sequence_id, 2);
    /// assert_eq!(second.to_string(), "EAN 13 (13): 4006381333931");
    /// ```
    pub fn record(&mut self, data: &[u8], symbology_name: &str, device_name: Option<&str>) -> DecodedData {
        let decoded = DecodedData {
            payload: String::from_utf8_lossy(data).into_owned(),
            length: data.len(),
            symbology_name: symbology_name.to_string(),
            sequence_id: self.next_id,
            device_name: device_name.map(str::to_string),
            received_at: Utc::now(),
        };
        self.next_id += 1;
        self.current = Some(decoded.clone());
        decoded
    }

    pub fn current(&self) -> Option<&DecodedData> {
        self.current.as_ref()
    }

    /// Sequence id the next record will get.
    pub fn next_sequence_id(&self) -> u64 {
        self.next_id
    }
}
