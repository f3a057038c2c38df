//! Audio I/O and control layer for passband.
//!
//! This crate connects the DSP in `passband-core` to real hardware:
//!
//! - **Hardware abstraction**: [`AudioBackend`] / [`BackendStream`], with
//!   [`CpalBackend`] as the default implementation
//! - **Devices**: [`DeviceCatalog`] enumerates and validates device ids
//! - **Parameters**: [`ParameterStore`] publishes lock-free snapshots to the
//!   audio thread
//! - **Streams**: [`StreamController`] owns the single live stream and its
//!   lifecycle state machine
//! - **Processing**: [`FilterProcessor`] is the [`AudioCallback`] that runs the
//!   signal chain
//! - **Facade**: [`AudioEngine`] ties everything together for control surfaces
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use passband_io::{AudioEngine, CpalBackend};
//!
//! let mut engine = AudioEngine::new(Box::new(CpalBackend::new()));
//! for device in engine.list_devices()? {
//!     println!("{}: {}", device.id, device.name);
//! }
//! engine.select_devices(0, 1, 256)?;
//! engine.start()?;
//! engine.update_parameters(Some(1000.0), Some(300.0))?;
//! ```

pub mod backend;
pub mod catalog;
pub mod controller;
pub mod cpal_backend;
pub mod duplex;
pub mod engine;
pub mod params;
pub mod processor;

pub use backend::{AudioBackend, BackendStream, DefaultDevices, ErrorCallback, StreamConfig};
pub use catalog::{DeviceCatalog, DeviceId, DeviceInfo, HostInfo};
pub use controller::{StreamController, StreamState};
pub use cpal_backend::CpalBackend;
pub use engine::{AudioEngine, EngineStatus};
pub use params::ParameterStore;
pub use processor::{AudioCallback, FaultCounter, FilterProcessor};

/// Error types for audio I/O and control operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter request was rejected.
    #[error("Invalid parameter: {0}")]
    Validation(String),

    /// A device exists but cannot be used as requested.
    #[error("Device error: {0}")]
    Device(String),

    /// No device with the given id is currently enumerated.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// Stream lifecycle misuse or a hardware start/stop failure.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// The host failed to enumerate devices.
    #[error("Device enumeration failed: {0}")]
    DeviceEnumeration(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::Validation("center_freq must be finite".into()).to_string(),
            "Invalid parameter: center_freq must be finite"
        );
        assert_eq!(Error::DeviceNotFound(7).to_string(), "Device not found: 7");
        assert!(Error::Stream("not running".into()).to_string().contains("not running"));
    }
}
