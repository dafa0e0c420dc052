//! Session configuration.
//!
//! # Example
//!
//! ```
//! use capture_session::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{
//!     "platform": "android",
//!     "credentials": {
//!         "app_id": "android:com.example.app",
//!         "developer_id": "dev",
//!         "app_key": "key"
//!     },
//!     "call_timeout_ms": 2000
//! }"#).unwrap();
//!
//! assert_eq!(config.call_timeout().as_millis(), 2000);
//! assert_eq!(config.sequence_base, 1);
//! ```

use std::path::Path;
use std::time::Duration;

use capture_core::constants::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEQUENCE_BASE, FAVORITE_WILDCARD,
};
use capture_core::{Error, HostPlatform, Result};
use capture_peer::AppCredentials;
use serde::{Deserialize, Serialize};

/// Configuration of a capture session.
///
/// Missing keys fall back to [`SessionConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host platform; selects the SocketCam status set.
    pub platform: HostPlatform,

    /// Credentials presented to the peer on open.
    pub credentials: AppCredentials,

    /// Sequence id of the first decoded data record.
    pub sequence_base: u64,

    /// Timeout of a single peer call, in milliseconds.
    pub call_timeout_ms: u64,

    /// Capacity of the peer event and session message queues.
    pub channel_capacity: usize,

    /// Favorite written to a device manager that has none.
    pub favorite: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            platform: HostPlatform::default(),
            credentials: AppCredentials::default(),
            sequence_base: DEFAULT_SEQUENCE_BASE,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            favorite: FAVORITE_WILDCARD.to_string(),
        }
    }
}

impl SessionConfig {
    /// Default configuration for a platform with the given credentials.
    pub fn new(platform: HostPlatform, credentials: AppCredentials) -> Self {
        Self {
            platform,
            credentials,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config`
    /// if it cannot be parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded session configuration");
        Ok(config)
    }

    /// Check the configuration before opening a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingConfig` for blank credentials and
    /// `Error::Config` for out of range values.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.app_id.trim().is_empty() {
            return Err(Error::MissingConfig("credentials.app_id".to_string()));
        }
        if self.credentials.developer_id.trim().is_empty() {
            return Err(Error::MissingConfig("credentials.developer_id".to_string()));
        }
        if self.credentials.app_key.trim().is_empty() {
            return Err(Error::MissingConfig("credentials.app_key".to_string()));
        }
        if self.call_timeout_ms == 0 {
            return Err(Error::Config("call_timeout_ms must be positive".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(Error::Config("channel_capacity must be positive".to_string()));
        }
        if self.favorite.is_empty() {
            return Err(Error::Config("favorite must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
