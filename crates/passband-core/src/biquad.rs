//! Second-order IIR section (biquad) and its delay registers.
//!
//! Coefficients and state are kept apart: a [`SecondOrderSection`] is a pure
//! value that can be recomputed every block, while [`SectionState`] carries the
//! filter history across blocks so the cascade behaves as one continuous IIR
//! process.
//!
//! Uses the transposed Direct Form II structure, which needs two registers
//! per section:
//!
//! ```text
//! y[n]  = b0*x[n] + s1
//! s1'   = b1*x[n] - a1*y[n] + s2
//! s2'   = b2*x[n] - a2*y[n]
//! ```
//!
//! Coefficients and registers are `f64`. Narrow passbands at low center
//! frequencies put the poles within ~1e-4 of the unit circle, where `f32`
//! round-off noise is amplified by several orders of magnitude.

use crate::math::flush_denormal;

/// Coefficients of one second-order section, normalized so `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderSection {
    /// Feedforward coefficient for x[n].
    pub b0: f64,
    /// Feedforward coefficient for x[n-1].
    pub b1: f64,
    /// Feedforward coefficient for x[n-2].
    pub b2: f64,
    /// Leading feedback coefficient, always 1.0 after normalization.
    pub a0: f64,
    /// Feedback coefficient for y[n-1].
    pub a1: f64,
    /// Feedback coefficient for y[n-2].
    pub a2: f64,
}

impl SecondOrderSection {
    /// Section that passes the signal through unchanged.
    pub const fn passthrough() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Bandpass section with zeros at DC and Nyquist: numerator `1 - z^-2`.
    pub const fn bandpass(a1: f64, a2: f64) -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: -1.0,
            a0: 1.0,
            a1,
            a2,
        }
    }

    /// Coefficients in `[b0, b1, b2, a0, a1, a2]` order (one SOS row).
    pub const fn to_array(&self) -> [f64; 6] {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
    }

    /// Whether both poles lie strictly inside the unit circle.
    ///
    /// Uses the stability triangle for `1 + a1 z^-1 + a2 z^-2`:
    /// `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Process one sample, updating `state` in place.
    #[inline]
    pub fn process(&self, state: &mut SectionState, input: f64) -> f64 {
        let output = self.b0 * input + state.s1;
        state.s1 = self.b1 * input - self.a1 * output + state.s2;
        state.s2 = self.b2 * input - self.a2 * output;
        output
    }
}

impl Default for SecondOrderSection {
    fn default() -> Self {
        Self::passthrough()
    }
}

/// Delay registers for one [`SecondOrderSection`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionState {
    s1: f64,
    s2: f64,
}

impl SectionState {
    /// Zeroed registers.
    pub const fn new() -> Self {
        Self { s1: 0.0, s2: 0.0 }
    }

    /// Clear the registers.
    pub fn clear(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    /// Whether both registers hold finite values.
    pub fn is_finite(&self) -> bool {
        self.s1.is_finite() && self.s2.is_finite()
    }

    /// Whether both registers are exactly zero.
    pub fn is_silent(&self) -> bool {
        self.s1 == 0.0 && self.s2 == 0.0
    }

    /// Flush subnormal register values to zero.
    pub fn flush_denormals(&mut self) {
        self.s1 = flush_denormal(self.s1);
        self.s2 = flush_denormal(self.s2);
    }
}
