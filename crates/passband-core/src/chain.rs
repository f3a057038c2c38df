//! Per-block signal chain: input gain → bandpass → output gain → limiter.
//!
//! [`SignalChain`] owns the persistent [`FilterState`]; coefficients are
//! rebuilt from the supplied [`FilterParameters`] at the top of every block,
//! so parameter changes take effect at the next block boundary without
//! resetting the filter history.
//!
//! # Real-Time Safety
//!
//! `process` never allocates, locks, or panics. A non-finite sample anywhere
//! in the block silences the whole block, clears the filter history, and is
//! reported as [`BlockOutcome::Fault`].

use core::fmt;

use crate::design::{FilterCoefficients, FilterState};
use crate::limiter::{DEFAULT_CEILING, DEFAULT_KNEE, SoftLimiter};
use crate::params::FilterParameters;

/// Default input gain (+6 dB).
pub const DEFAULT_PRE_GAIN: f32 = 2.0;

/// Default output gain (unity).
pub const DEFAULT_POST_GAIN: f32 = 1.0;

/// Tunable gain staging and limiter policy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainSettings {
    /// Linear gain applied before the filter.
    pub pre_gain: f32,
    /// Linear gain applied after the filter.
    pub post_gain: f32,
    /// Level where soft compression begins.
    pub knee: f32,
    /// Hard output ceiling.
    pub ceiling: f32,
}

impl ChainSettings {
    /// Replace invalid fields with defaults.
    ///
    /// Gains must be finite and non-negative, the ceiling must lie in
    /// `(0, 1]`, and the knee in `[0, ceiling)`.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let gain_ok = |g: f32| g.is_finite() && g >= 0.0;
        let ceiling = if self.ceiling.is_finite() && self.ceiling > 0.0 && self.ceiling <= 1.0 {
            self.ceiling
        } else {
            defaults.ceiling
        };
        let knee = if self.knee.is_finite() && self.knee >= 0.0 && self.knee < ceiling {
            self.knee
        } else {
            (defaults.knee / defaults.ceiling) * ceiling
        };
        Self {
            pre_gain: if gain_ok(self.pre_gain) { self.pre_gain } else { defaults.pre_gain },
            post_gain: if gain_ok(self.post_gain) { self.post_gain } else { defaults.post_gain },
            knee,
            ceiling,
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            pre_gain: DEFAULT_PRE_GAIN,
            post_gain: DEFAULT_POST_GAIN,
            knee: DEFAULT_KNEE,
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// A numeric fault detected while processing a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingFault {
    /// Index of the first non-finite sample in the block.
    pub sample_index: usize,
}

impl fmt::Display for ProcessingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "non-finite sample at index {}; block replaced with silence",
            self.sample_index
        )
    }
}

impl core::error::Error for ProcessingFault {}

/// Result of processing one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum BlockOutcome {
    /// The block was filtered normally.
    Processed,
    /// The block was silenced after a numeric fault.
    Fault(ProcessingFault),
}

impl BlockOutcome {
    /// Whether the block was silenced.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// Stateful mono processing chain.
#[derive(Debug, Clone)]
pub struct SignalChain {
    settings: ChainSettings,
    limiter: SoftLimiter,
    state: FilterState,
}

impl SignalChain {
    /// Create a chain with the given settings (sanitized).
    pub fn new(settings: ChainSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            settings,
            limiter: SoftLimiter::new(settings.knee, settings.ceiling),
            state: FilterState::new(),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> ChainSettings {
        self.settings
    }

    /// Filter history carried between blocks.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Clear the filter history.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Process one block.
    ///
    /// `output` receives `input.len()` processed samples; any extra output
    /// slots are zeroed.
    pub fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        params: &FilterParameters,
    ) -> BlockOutcome {
        let coeffs = FilterCoefficients::bandpass(params);
        let pre_gain = f64::from(self.settings.pre_gain);
        let post_gain = f64::from(self.settings.post_gain);
        let len = input.len().min(output.len());

        for (index, (out, &sample)) in output.iter_mut().zip(input).enumerate() {
            let filtered = coeffs.process_sample(&mut self.state, f64::from(sample) * pre_gain);
            let shaped = (filtered * post_gain) as f32;
            if !shaped.is_finite() {
                return self.fault(output, index);
            }
            *out = self.limiter.process(shaped);
        }

        if !self.state.is_finite() {
            return self.fault(output, len);
        }
        self.state.flush_denormals();
        output[len..].fill(0.0);
        BlockOutcome::Processed
    }

    fn fault(&mut self, output: &mut [f32], sample_index: usize) -> BlockOutcome {
        output.fill(0.0);
        self.state.reset();
        BlockOutcome::Fault(ProcessingFault { sample_index })
    }
}

impl Default for SignalChain {
    fn default() -> Self {
        Self::new(ChainSettings::default())
    }
}
