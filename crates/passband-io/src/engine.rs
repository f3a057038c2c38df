//! Control-side facade over devices, parameters, and the stream.

use passband_core::{ChainSettings, FilterParameters};
use serde::Serialize;

use crate::backend::{AudioBackend, StreamConfig};
use crate::catalog::{DeviceCatalog, DeviceId, DeviceInfo, HostInfo};
use crate::controller::{StreamController, StreamState};
use crate::params::ParameterStore;
use crate::processor::FaultCounter;
use crate::Result;

/// Snapshot of the engine for control surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    /// Parameters currently seen by the audio thread.
    pub params: FilterParameters,
    /// Stream lifecycle state.
    pub stream_state: StreamState,
    /// Live stream configuration, if devices are selected.
    pub stream_config: Option<StreamConfig>,
    /// Blocks silenced by numeric faults since the engine was created.
    pub faulted_blocks: u64,
}

/// The audio engine: explicit owner of every piece of runtime state.
///
/// There are no globals; a control surface holds an `AudioEngine` and calls
/// into it from one thread. The audio thread only sees the [`ParameterStore`]
/// snapshot and the fault counter.
pub struct AudioEngine {
    catalog: DeviceCatalog,
    controller: StreamController,
    params: ParameterStore,
    faults: FaultCounter,
}

impl AudioEngine {
    /// Create an engine with default parameters and chain settings.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self::with_settings(backend, FilterParameters::default(), ChainSettings::default())
    }

    /// Create an engine with explicit startup parameters and chain settings.
    pub fn with_settings(
        backend: Box<dyn AudioBackend>,
        params: FilterParameters,
        settings: ChainSettings,
    ) -> Self {
        let params = ParameterStore::new(params);
        let faults = FaultCounter::new();
        tracing::info!(
            backend = backend.name(),
            center_freq = params.get().center_freq,
            bandwidth = params.get().bandwidth,
            pre_gain = settings.pre_gain,
            post_gain = settings.post_gain,
            "audio engine created"
        );
        Self {
            catalog: DeviceCatalog::new(backend),
            controller: StreamController::new(params.clone(), settings, faults.clone()),
            params,
            faults,
        }
    }

    /// Enumerate devices.
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.catalog.list_devices()
    }

    /// Backend name and default devices.
    pub fn host_info(&self) -> Result<HostInfo> {
        self.catalog.host_info()
    }

    /// Select devices, replacing any live stream. The new stream is not started.
    pub fn select_devices(
        &mut self,
        input: DeviceId,
        output: DeviceId,
        buffer_size: u32,
    ) -> Result<StreamConfig> {
        tracing::info!(input, output, buffer_size, "selecting devices");
        let config = self
            .controller
            .select_devices(&self.catalog, input, output, buffer_size)?;
        tracing::info!(
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "devices selected"
        );
        Ok(config)
    }

    /// Start audio flow.
    pub fn start(&mut self) -> Result<()> {
        self.controller.start()
    }

    /// Pause audio flow.
    pub fn stop(&mut self) -> Result<()> {
        self.controller.stop()
    }

    /// Update center frequency and/or bandwidth. Takes effect at the next block.
    pub fn update_parameters(
        &self,
        center_freq: Option<f32>,
        bandwidth: Option<f32>,
    ) -> Result<FilterParameters> {
        let params = self.params.set(center_freq, bandwidth).inspect_err(|e| {
            tracing::warn!(?center_freq, ?bandwidth, error = %e, "parameter update rejected");
        })?;
        tracing::info!(
            center_freq = params.center_freq,
            bandwidth = params.bandwidth,
            "parameters updated"
        );
        Ok(params)
    }

    /// Current parameters.
    pub fn parameters(&self) -> FilterParameters {
        self.params.get()
    }

    /// Engine snapshot.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            params: self.params.get(),
            stream_state: self.controller.state(),
            stream_config: self.controller.config(),
            faulted_blocks: self.faults.get(),
        }
    }

    /// Release the stream for good.
    pub fn close(&mut self) {
        self.controller.close();
        tracing::info!(faulted_blocks = self.faults.get(), "audio engine closed");
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("catalog", &self.catalog)
            .field("controller", &self.controller)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
