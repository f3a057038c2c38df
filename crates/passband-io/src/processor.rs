//! The real-time processing callback.
//!
//! [`AudioCallback`] is what a backend stream invokes once per output block.
//! [`FilterProcessor`] is the production implementation: it reads the latest
//! parameter snapshot, runs the [`SignalChain`], and counts faulted blocks.
//!
//! ## Real-Time Safety
//!
//! `process` runs on the driver's audio thread. Implementations must not
//! allocate, lock, log, or perform I/O. Faults are reported through a relaxed
//! atomic counter and picked up by the control side.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use passband_core::{ChainSettings, SignalChain};

use crate::params::ParameterStore;

/// Per-block processor invoked on the real-time thread.
pub trait AudioCallback: Send {
    /// Process one mono block. `input` and `output` have the same length.
    fn process(&mut self, input: &[f32], output: &mut [f32]);
}

/// Shared count of blocks silenced by a numeric fault.
#[derive(Debug, Clone, Default)]
pub struct FaultCounter(Arc<AtomicU64>);

impl FaultCounter {
    /// New counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one faulted block.
    #[inline]
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Faulted blocks so far.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// [`AudioCallback`] running the bandpass signal chain.
pub struct FilterProcessor {
    chain: SignalChain,
    params: ParameterStore,
    faults: FaultCounter,
}

impl FilterProcessor {
    /// Create a processor with fresh filter state.
    pub fn new(params: ParameterStore, settings: ChainSettings, faults: FaultCounter) -> Self {
        Self {
            chain: SignalChain::new(settings),
            params,
            faults,
        }
    }
}

impl AudioCallback for FilterProcessor {
    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let params = self.params.get();
        if self.chain.process(input, output, &params).is_fault() {
            self.faults.increment();
        }
    }
}
