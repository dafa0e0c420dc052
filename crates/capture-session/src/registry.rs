//! Device registry.
//!
//! In-memory table of opened devices keyed by guid. Mutations never touch
//! the list a reader already holds: every change builds a new list and
//! swaps it in, so a [`DeviceList`] obtained through
//! [`DeviceRegistry::snapshot`] stays frozen.
//!
//! # Examples
//!
//! ```
//! use capture_core::constants::DEVICE_TYPE_SCANNER_S740;
//! use capture_core::{DeviceType, Guid, Handle};
//! use capture_session::registry::{DeviceRegistry, Registration};
//!
//! let mut registry: DeviceRegistry<()> = DeviceRegistry::new();
//! let guid = Guid::new("G1").unwrap();
//! let s740 = DeviceType::new(DEVICE_TYPE_SCANNER_S740);
//!
//! let first = registry.register_arrival(guid.clone(), "S740", s740, Handle::new(7), ());
//! assert!(matches!(first, Registration::Added(_)));
//!
//! let again = registry.register_arrival(guid.clone(), "S740", s740, Handle::new(8), ());
//! assert!(matches!(again, Registration::AlreadyRegistered(_)));
//! assert_eq!(registry.len(), 1);
//! assert_eq!(registry.find_by_guid(&guid).unwrap().handle, Handle::new(7));
//! ```

use std::sync::Arc;

use capture_core::{DeviceType, Guid, Handle};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// A registered (opened) device.
#[derive(Debug, Clone)]
pub struct Device<C> {
    pub guid: Guid,

    /// Display name; follows successful friendly name changes.
    pub name: String,

    pub device_type: DeviceType,

    /// Handle of the connection at registration time.
    pub handle: Handle,

    /// Open connection used for property calls and close.
    pub connection: C,
}

impl<C> Device<C> {
    /// Connection-free view of the record.
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            guid: self.guid.clone(),
            name: self.name.clone(),
            device_type: self.device_type,
            handle: self.handle,
        }
    }
}

/// Device record without its connection, as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub guid: Guid,
    pub name: String,
    pub device_type: DeviceType,
    pub handle: Handle,
}

/// Outcome of [`DeviceRegistry::register_arrival`].
#[derive(Debug, Clone)]
pub enum Registration<C> {
    /// A new record was stored.
    Added(Device<C>),

    /// The guid was already registered; the existing record is returned
    /// and nothing changed.
    AlreadyRegistered(Device<C>),
}

impl<C> Registration<C> {
    pub fn device(&self) -> &Device<C> {
        match self {
            Registration::Added(device) | Registration::AlreadyRegistered(device) => device,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Registration::Added(_))
    }
}

/// Immutable view of the registered devices in arrival order.
pub type DeviceList<C> = Arc<Vec<Device<C>>>;

/// Table of registered devices, at most one per guid.
#[derive(Debug)]
pub struct DeviceRegistry<C> {
    devices: DeviceList<C>,
}

impl<C: Clone> DeviceRegistry<C> {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(Vec::new()),
        }
    }

    /// Register a device that was just opened.
    ///
    /// A duplicate guid is logged and answered with the existing record;
    /// the registry is left untouched.
    pub fn register_arrival(
        &mut self,
        guid: Guid,
        name: impl Into<String>,
        device_type: DeviceType,
        handle: Handle,
        connection: C,
    ) -> Registration<C> {
        if let Some(existing) = self.devices.iter().find(|d| d.guid == guid) {
            warn!(guid = %guid, name = %existing.name, "Device already registered");
            return Registration::AlreadyRegistered(existing.clone());
        }

        let device = Device {
            guid,
            name: name.into(),
            device_type,
            handle,
            connection,
        };
        debug!(guid = %device.guid, handle = %device.handle, "Registering device");

        let mut next = Vec::with_capacity(self.devices.len() + 1);
        next.extend(self.devices.iter().cloned());
        next.push(device.clone());
        self.devices = Arc::new(next);

        Registration::Added(device)
    }

    /// # Errors
    ///
    /// Returns `SessionError::DeviceNotFound` if no device has this handle.
    pub fn find_by_handle(&self, handle: Handle) -> Result<&Device<C>> {
        self.devices
            .iter()
            .find(|d| d.handle == handle)
            .ok_or_else(|| SessionError::not_found(format!("handle {handle}")))
    }

    /// # Errors
    ///
    /// Returns `SessionError::DeviceNotFound` if the guid is not registered.
    pub fn find_by_guid(&self, guid: &Guid) -> Result<&Device<C>> {
        self.devices
            .iter()
            .find(|d| &d.guid == guid)
            .ok_or_else(|| SessionError::not_found(guid))
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.devices.iter().any(|d| &d.guid == guid)
    }

    /// Remove a device and return its record. The connection is not closed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DeviceNotFound` if the guid is not registered.
    pub fn remove(&mut self, guid: &Guid) -> Result<Device<C>> {
        let index = self
            .devices
            .iter()
            .position(|d| &d.guid == guid)
            .ok_or_else(|| SessionError::not_found(guid))?;

        let mut next: Vec<Device<C>> = self.devices.iter().cloned().collect();
        let removed = next.remove(index);
        self.devices = Arc::new(next);

        debug!(guid = %guid, "Removed device");
        Ok(removed)
    }

    /// Record a successful friendly name change.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DeviceNotFound` if the guid is not registered.
    pub fn rename(&mut self, guid: &Guid, name: impl Into<String>) -> Result<Device<C>> {
        let index = self
            .devices
            .iter()
            .position(|d| &d.guid == guid)
            .ok_or_else(|| SessionError::not_found(guid))?;

        let mut next: Vec<Device<C>> = self.devices.iter().cloned().collect();
        next[index].name = name.into();
        let renamed = next[index].clone();
        self.devices = Arc::new(next);

        Ok(renamed)
    }

    /// Current device list. Later mutations do not affect it.
    pub fn snapshot(&self) -> DeviceList<C> {
        Arc::clone(&self.devices)
    }

    /// Remove every device and return them in arrival order.
    pub fn drain(&mut self) -> Vec<Device<C>> {
        let drained = self.devices.iter().cloned().collect();
        self.devices = Arc::new(Vec::new());
        drained
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<C: Clone> Default for DeviceRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
