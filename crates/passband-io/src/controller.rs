//! Stream lifecycle state machine.
//!
//! [`StreamController`] owns at most one live [`BackendStream`]. Transitions:
//!
//! ```text
//!                  select_devices
//! Uninitialized ─────────────────▶ Configured ──start──▶ Running
//!       ▲                            ▲   ▲                 │
//!       │ failed open                │   └──── start ──── Stopped ◀─ stop
//!       └──── select_devices ◀───────┴── (any non-closed state)
//!
//! close: any state ──▶ Closed (terminal)
//! ```
//!
//! Device switching is synchronous: the previous stream is stopped and closed
//! before the new one is opened, so two streams never run at once.

use std::fmt;
use std::sync::Arc;

use passband_core::ChainSettings;
use serde::Serialize;

use crate::backend::{BackendStream, ErrorCallback, StreamConfig};
use crate::catalog::{DeviceCatalog, DeviceId};
use crate::params::ParameterStore;
use crate::processor::{FaultCounter, FilterProcessor};
use crate::{Error, Result};

/// Lifecycle state of the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// No devices selected.
    Uninitialized,
    /// Stream opened, not yet started.
    Configured,
    /// Audio is flowing.
    Running,
    /// Stream paused after running.
    Stopped,
    /// Released for good.
    Closed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Owner of the single live stream.
pub struct StreamController {
    state: StreamState,
    config: Option<StreamConfig>,
    stream: Option<Box<dyn BackendStream>>,
    params: ParameterStore,
    settings: ChainSettings,
    faults: FaultCounter,
}

impl StreamController {
    /// Create an uninitialized controller.
    ///
    /// Every stream it opens gets a fresh [`FilterProcessor`] reading `params`
    /// and reporting into `faults`.
    pub fn new(params: ParameterStore, settings: ChainSettings, faults: FaultCounter) -> Self {
        Self {
            state: StreamState::Uninitialized,
            config: None,
            stream: None,
            params,
            settings: settings.sanitized(),
            faults,
        }
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Configuration of the live stream, if any.
    pub fn config(&self) -> Option<StreamConfig> {
        self.config
    }

    /// Select devices and open a new stream in the `Configured` state.
    ///
    /// Ids and buffer size are validated before anything is released; a
    /// rejected request leaves the current stream untouched. Once validation
    /// passes the previous stream is stopped and closed. If the new stream then
    /// fails to open, the controller is left `Uninitialized`.
    pub fn select_devices(
        &mut self,
        catalog: &DeviceCatalog,
        input: DeviceId,
        output: DeviceId,
        buffer_size: u32,
    ) -> Result<StreamConfig> {
        if self.state == StreamState::Closed {
            return Err(Error::Stream("controller is closed".into()));
        }
        if buffer_size == 0 {
            return Err(Error::Validation("buffer_size must be greater than 0".into()));
        }
        catalog.input_device(input)?;
        let output_info = catalog.output_device(output)?;

        self.release();

        let config = StreamConfig {
            input_device: input,
            output_device: output,
            sample_rate: output_info.default_sample_rate,
            buffer_size,
        };
        self.params.set_sample_rate(config.sample_rate as f32)?;
        self.params.set_buffer_size(buffer_size)?;

        let processor = FilterProcessor::new(self.params.clone(), self.settings, self.faults.clone());
        let on_error: ErrorCallback = Arc::new(|message: &str| {
            tracing::error!(error = message, "audio stream error");
        });

        let stream = match catalog
            .backend()
            .open_stream(&config, Box::new(processor), on_error)
        {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(input, output, error = %e, "failed to open stream");
                return Err(e);
            }
        };

        self.stream = Some(stream);
        self.config = Some(config);
        self.transition(StreamState::Configured);
        Ok(config)
    }

    /// Start audio flow.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            StreamState::Configured | StreamState::Stopped => {
                let stream = self
                    .stream
                    .as_mut()
                    .ok_or_else(|| Error::Stream("no stream is open".into()))?;
                stream.start()?;
                self.transition(StreamState::Running);
                Ok(())
            }
            StreamState::Running => Err(Error::Stream("stream is already running".into())),
            StreamState::Uninitialized => Err(Error::Stream("no devices selected".into())),
            StreamState::Closed => Err(Error::Stream("controller is closed".into())),
        }
    }

    /// Pause audio flow. Idempotent when already paused or never started.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            StreamState::Running => {
                if let Some(stream) = self.stream.as_mut() {
                    stream.stop()?;
                }
                self.transition(StreamState::Stopped);
                Ok(())
            }
            StreamState::Stopped | StreamState::Configured => Ok(()),
            StreamState::Uninitialized => Err(Error::Stream("no devices selected".into())),
            StreamState::Closed => Err(Error::Stream("controller is closed".into())),
        }
    }

    /// Release the stream for good. Idempotent.
    pub fn close(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        self.release();
        self.transition(StreamState::Closed);
    }

    /// Stop and close the live stream, returning to `Uninitialized`.
    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if self.state == StreamState::Running
                && let Err(e) = stream.stop()
            {
                tracing::warn!(error = %e, "failed to stop stream before closing");
            }
            stream.close();
        }
        self.config = None;
        self.transition(StreamState::Uninitialized);
    }

    fn transition(&mut self, next: StreamState) {
        if self.state != next {
            tracing::info!(from = %self.state, to = %next, "stream state changed");
            self.state = next;
        }
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }
}

impl fmt::Debug for StreamController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamController")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
