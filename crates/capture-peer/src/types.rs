//! Common types exchanged with the peer.
//!
//! This module defines the application credentials presented when opening
//! a session and the device descriptor carried by arrival and removal
//! notifications.

use capture_core::{DeviceType, Guid};
use serde::{Deserialize, Serialize};

/// Credentials identifying the host application to the peer.
///
/// The peer validates them when the session is opened; the session layer
/// treats them as opaque strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredentials {
    /// Application id, e.g. `android:com.example.app`.
    pub app_id: String,

    /// Developer id issued with the application key.
    pub developer_id: String,

    /// Signed application key.
    pub app_key: String,
}

impl AppCredentials {
    /// Create a new set of credentials.
    pub fn new(
        app_id: impl Into<String>,
        developer_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            developer_id: developer_id.into(),
            app_key: app_key.into(),
        }
    }

    /// Returns `true` if any field is blank.
    pub fn is_incomplete(&self) -> bool {
        self.app_id.trim().is_empty()
            || self.developer_id.trim().is_empty()
            || self.app_key.trim().is_empty()
    }
}

/// Device descriptor delivered with arrival and removal notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable device identifier.
    pub guid: Guid,

    /// Display name (e.g., "Socket S740 [E2ABB4]").
    pub name: String,

    /// Device type code.
    pub device_type: DeviceType,
}

impl DeviceInfo {
    /// Create a new DeviceInfo.
    pub fn new(guid: Guid, name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            guid,
            name: name.into(),
            device_type,
        }
    }
}
