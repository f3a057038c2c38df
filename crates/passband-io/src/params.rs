//! Shared, lock-free filter parameters.
//!
//! [`ParameterStore`] is the bridge between the control context and the audio
//! thread. The current [`FilterParameters`] are published via `ArcSwap`, so the
//! callback gets a consistent snapshot with a single wait-free load and never
//! observes a half-applied update. Writers serialize on a short `parking_lot`
//! mutex so read-modify-write updates (e.g. re-clamping the bandwidth against
//! a new center) cannot interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use passband_core::{DEFAULT_BUFFER_SIZE, FilterParameters, clamp_bandwidth, clamp_center};

use crate::{Error, Result};

struct Shared {
    params: ArcSwap<FilterParameters>,
    buffer_size: AtomicU32,
    write_lock: Mutex<()>,
}

/// Thread-safe parameter store. Cloning shares the same state.
#[derive(Clone)]
pub struct ParameterStore {
    inner: Arc<Shared>,
}

impl ParameterStore {
    /// Create a store holding `initial`.
    ///
    /// Center and bandwidth are clamped on the way in; a non-positive or
    /// non-finite sample rate falls back to the default.
    pub fn new(initial: FilterParameters) -> Self {
        let sample_rate = if initial.sample_rate.is_finite() && initial.sample_rate > 0.0 {
            initial.sample_rate
        } else {
            FilterParameters::default().sample_rate
        };
        let params = if initial.center_freq.is_finite() && initial.bandwidth.is_finite() {
            FilterParameters::clamped(initial.center_freq, initial.bandwidth, sample_rate)
        } else {
            FilterParameters::default().with_sample_rate(sample_rate)
        };
        Self {
            inner: Arc::new(Shared {
                params: ArcSwap::from_pointee(params),
                buffer_size: AtomicU32::new(DEFAULT_BUFFER_SIZE),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Current parameters. Wait-free; safe on the audio thread.
    #[inline]
    pub fn get(&self) -> FilterParameters {
        **self.inner.params.load()
    }

    /// Update center frequency and/or bandwidth.
    ///
    /// Center is clamped to `[20, 20000]` Hz and bandwidth to `[1, center]` Hz.
    /// When only the center changes, the stored bandwidth is re-clamped against
    /// the new center. Returns the parameters now in effect.
    pub fn set(&self, center_freq: Option<f32>, bandwidth: Option<f32>) -> Result<FilterParameters> {
        if let Some(center) = center_freq
            && !center.is_finite()
        {
            return Err(Error::Validation(format!(
                "center_freq must be finite, got {center}"
            )));
        }
        if let Some(bw) = bandwidth
            && !bw.is_finite()
        {
            return Err(Error::Validation(format!(
                "bandwidth must be finite, got {bw}"
            )));
        }

        let _guard = self.inner.write_lock.lock();
        let current = self.get();
        let center = center_freq.map_or(current.center_freq, clamp_center);
        let bandwidth = clamp_bandwidth(bandwidth.unwrap_or(current.bandwidth), center);
        let next = FilterParameters::new(center, bandwidth, current.sample_rate);
        self.inner.params.store(Arc::new(next));
        Ok(next)
    }

    /// Publish the stream sample rate.
    pub fn set_sample_rate(&self, sample_rate: f32) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::Validation(format!(
                "sample_rate must be positive, got {sample_rate}"
            )));
        }
        let _guard = self.inner.write_lock.lock();
        let next = self.get().with_sample_rate(sample_rate);
        self.inner.params.store(Arc::new(next));
        Ok(())
    }

    /// Stream buffer size in frames.
    pub fn buffer_size(&self) -> u32 {
        self.inner.buffer_size.load(Ordering::Acquire)
    }

    /// Publish the stream buffer size.
    pub fn set_buffer_size(&self, frames: u32) -> Result<()> {
        if frames == 0 {
            return Err(Error::Validation("buffer_size must be greater than 0".into()));
        }
        self.inner.buffer_size.store(frames, Ordering::Release);
        Ok(())
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(FilterParameters::default())
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("params", &self.get())
            .field("buffer_size", &self.buffer_size())
            .finish()
    }
}
