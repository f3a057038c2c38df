//! Memoryless soft-knee limiter.
//!
//! Below the knee the signal passes untouched. Above it, [`soft_knee`] bends
//! the transfer curve toward the ceiling, then a hard clamp guarantees the
//! ceiling is never exceeded, whatever the input level.
//!
//! Unlike a lookahead limiter this adds no latency and keeps no state, which
//! suits a pass-through effect where every block must leave the callback
//! immediately.

use crate::math::{hard_clip, soft_knee};

/// Default level where soft compression begins (linear).
pub const DEFAULT_KNEE: f32 = 0.7;

/// Default hard output ceiling (linear).
pub const DEFAULT_CEILING: f32 = 0.95;

/// Soft-knee limiter with a hard ceiling.
///
/// # Example
///
/// ```rust
/// use passband_core::SoftLimiter;
///
/// let limiter = SoftLimiter::default();
/// assert_eq!(limiter.process(0.5), 0.5);
/// assert!(limiter.process(8.0) <= 0.95);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftLimiter {
    knee: f32,
    ceiling: f32,
}

impl SoftLimiter {
    /// Create a limiter. Requires `0 <= knee < ceiling`.
    pub fn new(knee: f32, ceiling: f32) -> Self {
        debug_assert!(knee >= 0.0 && knee < ceiling);
        Self { knee, ceiling }
    }

    /// Knee level (linear).
    pub fn knee(&self) -> f32 {
        self.knee
    }

    /// Ceiling level (linear).
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Limit one sample.
    #[inline]
    pub fn process(&self, input: f32) -> f32 {
        hard_clip(soft_knee(input, self.knee, self.ceiling), self.ceiling)
    }

    /// Limit a block in place.
    pub fn process_block(&self, buffer: &mut [f32]) {
        for sample in buffer {
            *sample = self.process(*sample);
        }
    }
}

impl Default for SoftLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_KNEE, DEFAULT_CEILING)
    }
}
