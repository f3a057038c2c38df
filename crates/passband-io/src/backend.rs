//! Pluggable audio backend abstraction.
//!
//! This module defines the [`AudioBackend`] trait, which decouples the stream
//! controller from any specific platform audio API. The default implementation
//! wraps [cpal](https://crates.io/crates/cpal) ([`CpalBackend`](crate::CpalBackend));
//! tests substitute a deterministic mock.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   AudioEngine / StreamController │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │  list_devices / open_stream      │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │ MockBackend │
//! │  (default)  │  │   (tests)   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! The trait is object-safe: the processing callback is a boxed
//! [`AudioCallback`] and streams come back as `Box<dyn BackendStream>`, which
//! keeps platform types out of the controller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{DeviceId, DeviceInfo};
use crate::processor::AudioCallback;
use crate::Result;

/// Configuration of the live duplex stream.
///
/// Created on device selection; replaces the previous configuration as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Id of the capture device.
    pub input_device: DeviceId,
    /// Id of the playback device.
    pub output_device: DeviceId,
    /// Sample rate in Hz, taken from the output device's default.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
}

/// System default devices, if the host reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultDevices {
    /// Default capture device.
    pub input: Option<DeviceId>,
    /// Default playback device.
    pub output: Option<DeviceId>,
}

/// Error callback signature.
///
/// Called when the backend reports a runtime stream error. Shared between the
/// capture and playback halves of a duplex stream, hence `Arc` and `Fn`.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// A live duplex stream owned by the controller.
///
/// Dropping the stream releases the hardware; [`close`](BackendStream::close)
/// does the same explicitly.
pub trait BackendStream: Send {
    /// Begin (or resume) audio flow.
    fn start(&mut self) -> Result<()>;

    /// Pause audio flow. Takes effect at the next callback boundary.
    fn stop(&mut self) -> Result<()>;

    /// Release the underlying hardware streams. Idempotent.
    fn close(&mut self);
}

/// Pluggable audio backend trait.
///
/// Abstracts over platform-specific audio APIs to provide device enumeration
/// and duplex stream construction.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "mock").
    fn name(&self) -> &str;

    /// List all available audio devices. Ids are stable for one enumeration.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Ids of the system default devices.
    fn default_devices(&self) -> Result<DefaultDevices>;

    /// Open a duplex stream in the paused state.
    ///
    /// Capture comes from `config.input_device` (first channel only), the
    /// `callback` runs once per output block on the real-time thread, and its
    /// mono output is written to every channel of `config.output_device`.
    ///
    /// ## Arguments
    ///
    /// - `config`: Devices, sample rate, and buffer size
    /// - `callback`: Real-time block processor
    /// - `on_error`: Called when the backend encounters a streaming error
    fn open_stream(
        &self,
        config: &StreamConfig,
        callback: Box<dyn AudioCallback>,
        on_error: ErrorCallback,
    ) -> Result<Box<dyn BackendStream>>;
}
