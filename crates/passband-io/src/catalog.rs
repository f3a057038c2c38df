//! Device enumeration and validation.
//!
//! [`DeviceCatalog`] owns the [`AudioBackend`] and answers the questions the
//! control side asks before touching hardware: which devices exist, which can
//! capture or play, and what the host considers its defaults.

use serde::Serialize;

use crate::backend::AudioBackend;
use crate::{Error, Result};

/// Identifier of a device within one enumeration.
pub type DeviceId = usize;

/// An enumerated audio device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Id used for selection.
    pub id: DeviceId,
    /// Human-readable device name.
    pub name: String,
    /// Maximum capture channels (0 for playback-only devices).
    pub max_inputs: u16,
    /// Maximum playback channels (0 for capture-only devices).
    pub max_outputs: u16,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the host's default capture device.
    pub is_default_input: bool,
    /// Whether this is the host's default playback device.
    pub is_default_output: bool,
}

impl DeviceInfo {
    /// Whether the device can capture.
    pub fn has_input(&self) -> bool {
        self.max_inputs > 0
    }

    /// Whether the device can play.
    pub fn has_output(&self) -> bool {
        self.max_outputs > 0
    }
}

/// Backend name and default devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// Backend name (e.g. "cpal").
    pub backend: String,
    /// Default capture device, if any.
    pub default_input: Option<DeviceInfo>,
    /// Default playback device, if any.
    pub default_output: Option<DeviceInfo>,
    /// Number of enumerated devices.
    pub device_count: usize,
}

/// Device enumeration facade over an [`AudioBackend`].
pub struct DeviceCatalog {
    backend: Box<dyn AudioBackend>,
}

impl DeviceCatalog {
    /// Wrap a backend.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    /// Enumerate devices. Ids are only meaningful until the next enumeration.
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.backend.list_devices()
    }

    /// Enumerate devices, logging and swallowing enumeration failures.
    pub fn devices_or_empty(&self) -> Vec<DeviceInfo> {
        match self.list_devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "device enumeration failed");
                Vec::new()
            }
        }
    }

    /// Look up a device by id.
    pub fn find(&self, id: DeviceId) -> Result<DeviceInfo> {
        self.list_devices()?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(Error::DeviceNotFound(id))
    }

    /// Look up a device by id and require capture channels.
    pub fn input_device(&self, id: DeviceId) -> Result<DeviceInfo> {
        let device = self.find(id)?;
        if !device.has_input() {
            return Err(Error::Device(format!(
                "device {id} ({}) has no input channels",
                device.name
            )));
        }
        Ok(device)
    }

    /// Look up a device by id and require playback channels.
    pub fn output_device(&self, id: DeviceId) -> Result<DeviceInfo> {
        let device = self.find(id)?;
        if !device.has_output() {
            return Err(Error::Device(format!(
                "device {id} ({}) has no output channels",
                device.name
            )));
        }
        Ok(device)
    }

    /// Backend name and default devices.
    pub fn host_info(&self) -> Result<HostInfo> {
        let devices = self.list_devices()?;
        let defaults = self.backend.default_devices()?;
        let lookup = |id: Option<DeviceId>| id.and_then(|id| devices.iter().find(|d| d.id == id).cloned());
        Ok(HostInfo {
            backend: self.backend.name().to_string(),
            default_input: lookup(defaults.input),
            default_output: lookup(defaults.output),
            device_count: devices.len(),
        })
    }
}

impl std::fmt::Debug for DeviceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCatalog")
            .field("backend", &self.backend.name())
            .finish()
    }
}
