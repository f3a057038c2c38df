//! Butterworth bandpass design.
//!
//! [`butterworth_bandpass`] maps `(center, bandwidth, sample_rate)` to a
//! cascade of two second-order sections. It is pure, allocation-free, and
//! cheap enough to run at the top of every audio block.
//!
//! # Algorithm
//!
//! 1. Passband edges `center ± bandwidth/2` are normalized to Nyquist and
//!    clamped into `[MIN_EDGE_NORM, MAX_EDGE_NORM]` (see [`NormalizedBand`]).
//! 2. The order-2 analog Butterworth prototype has poles `(-1 ± j)/√2`.
//! 3. Edges are pre-warped, `w = 4·tan(π·Wn/2)`, and the prototype is moved to
//!    the band with the lowpass→bandpass transform. Each prototype pole `p`
//!    yields `p·bw/2 ± sqrt((p·bw/2)² - w1·w2)`; two zeros land at `s = 0`.
//! 4. The bilinear transform maps poles with `z = (4 + s)/(4 - s)`. The zeros
//!    land at `z = +1` and `z = -1`, so every section gets numerator `1 - z^-2`.
//! 5. Conjugate pole pairs become the two sections; the overall gain is kept
//!    separate so each section stays at unit numerator scale.
//!
//! The result matches `scipy.signal.butter(2, [lo, hi], 'band', output='sos')`
//! up to how the zeros are distributed between the sections.
//!
//! # Degenerate bands
//!
//! When clamping collapses the band (both edges pinned to the same limit, or a
//! request narrower than [`MIN_BAND_WIDTH_NORM`]), the band is rebuilt with the
//! minimum width centered on the clamped normalized center, then shifted back
//! inside the allowed interval. The passband is never zero-width.

use core::f64::consts::{FRAC_1_SQRT_2, PI};

use libm::tan;
use num_complex::Complex64;

use crate::biquad::{SecondOrderSection, SectionState};
use crate::params::{
    DEFAULT_CENTER_HZ, DEFAULT_SAMPLE_RATE, FilterParameters, MIN_BANDWIDTH_HZ,
};

/// Lowest normalized band edge (fraction of Nyquist).
pub const MIN_EDGE_NORM: f64 = 0.001;

/// Highest normalized band edge (fraction of Nyquist).
pub const MAX_EDGE_NORM: f64 = 0.99;

/// Narrowest normalized passband the designer will produce.
pub const MIN_BAND_WIDTH_NORM: f64 = 1e-5;

/// Number of cascaded second-order sections.
pub const SECTION_COUNT: usize = 2;

/// Twice the normalized sampling frequency used by the bilinear transform (fs = 2).
const FS2: f64 = 4.0;

/// Passband edges normalized to Nyquist, after clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBand {
    /// Lower edge, in `[MIN_EDGE_NORM, MAX_EDGE_NORM)`.
    pub low: f64,
    /// Upper edge, in `(low, MAX_EDGE_NORM]`.
    pub high: f64,
}

impl NormalizedBand {
    /// Normalize and clamp the passband described by `center ± bandwidth/2`.
    ///
    /// Non-finite or non-positive inputs are replaced before normalization:
    /// center and sample rate fall back to their defaults, bandwidth to
    /// [`MIN_BANDWIDTH_HZ`].
    pub fn from_hz(center_freq: f32, bandwidth: f32, sample_rate: f32) -> Self {
        let center = positive_or(center_freq, DEFAULT_CENTER_HZ);
        let bandwidth = positive_or(bandwidth, MIN_BANDWIDTH_HZ);
        let sample_rate = positive_or(sample_rate, DEFAULT_SAMPLE_RATE);

        let nyquist = sample_rate * 0.5;
        let half = bandwidth * 0.5;
        let low = ((center - half) / nyquist).clamp(MIN_EDGE_NORM, MAX_EDGE_NORM);
        let high = ((center + half) / nyquist).clamp(MIN_EDGE_NORM, MAX_EDGE_NORM);

        if high - low >= MIN_BAND_WIDTH_NORM {
            return Self { low, high };
        }

        let mid = (center / nyquist).clamp(MIN_EDGE_NORM, MAX_EDGE_NORM);
        let low = (mid - MIN_BAND_WIDTH_NORM * 0.5)
            .clamp(MIN_EDGE_NORM, MAX_EDGE_NORM - MIN_BAND_WIDTH_NORM);
        Self {
            low,
            high: low + MIN_BAND_WIDTH_NORM,
        }
    }

    /// Normalized width of the band.
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

fn positive_or(value: f32, fallback: f32) -> f64 {
    if value.is_finite() && value > 0.0 {
        f64::from(value)
    } else {
        f64::from(fallback)
    }
}

/// Overall gain and cascaded sections of the bandpass filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    /// Gain applied to the input before the first section.
    pub gain: f64,
    /// Sections in processing order.
    pub sections: [SecondOrderSection; SECTION_COUNT],
}

impl FilterCoefficients {
    /// Design the bandpass for the given parameters.
    pub fn bandpass(params: &FilterParameters) -> Self {
        butterworth_bandpass(params.center_freq, params.bandwidth, params.sample_rate)
    }

    /// Whether every section is stable.
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(SecondOrderSection::is_stable)
    }

    /// Run one sample through the cascade.
    #[inline]
    pub fn process_sample(&self, state: &mut FilterState, input: f64) -> f64 {
        let mut sample = input * self.gain;
        for (section, registers) in self.sections.iter().zip(state.sections.iter_mut()) {
            sample = section.process(registers, sample);
        }
        sample
    }

    /// Magnitude response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f32, sample_rate: f32) -> f64 {
        let omega = 2.0 * PI * f64::from(freq_hz) / f64::from(sample_rate);
        let z_inv = Complex64::from_polar(1.0, -omega);
        let z_inv2 = z_inv * z_inv;
        let response = self.sections.iter().fold(Complex64::new(self.gain, 0.0), |acc, s| {
            let num = z_inv2 * s.b2 + z_inv * s.b1 + s.b0;
            let den = z_inv2 * s.a2 + z_inv * s.a1 + s.a0;
            acc * num / den
        });
        response.norm()
    }
}

/// Persistent delay registers for the whole cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    sections: [SectionState; SECTION_COUNT],
}

impl FilterState {
    /// Zeroed state.
    pub const fn new() -> Self {
        Self {
            sections: [SectionState::new(); SECTION_COUNT],
        }
    }

    /// Clear every register.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
    }

    /// Whether every register is finite.
    pub fn is_finite(&self) -> bool {
        self.sections.iter().all(SectionState::is_finite)
    }

    /// Whether every register is exactly zero.
    pub fn is_silent(&self) -> bool {
        self.sections.iter().all(SectionState::is_silent)
    }

    /// Flush subnormal register values.
    pub fn flush_denormals(&mut self) {
        for section in &mut self.sections {
            section.flush_denormals();
        }
    }
}

/// Design an order-2 Butterworth bandpass as two second-order sections.
///
/// # Example
///
/// ```rust
/// use passband_core::butterworth_bandpass;
///
/// let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
/// assert!(coeffs.is_stable());
/// assert!((coeffs.magnitude_at(700.0, 48000.0) - 1.0).abs() < 0.05);
/// ```
pub fn butterworth_bandpass(center_freq: f32, bandwidth: f32, sample_rate: f32) -> FilterCoefficients {
    design_band(NormalizedBand::from_hz(center_freq, bandwidth, sample_rate))
}

/// Design the bandpass for an already-normalized band.
pub fn design_band(band: NormalizedBand) -> FilterCoefficients {
    let w_low = FS2 * tan(PI * band.low * 0.5);
    let w_high = FS2 * tan(PI * band.high * 0.5);
    let bw = w_high - w_low;
    let wo_sq = w_low * w_high;

    // Upper-half-plane prototype pole; its conjugate yields the mirrored poles.
    let prototype = Complex64::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    let shifted = prototype * (bw * 0.5);
    let spread = (shifted * shifted - wo_sq).sqrt();
    let analog = [shifted + spread, shifted - spread];

    let mut sections = [SecondOrderSection::passthrough(); SECTION_COUNT];
    let mut denominator = 1.0;
    for (section, pole) in sections.iter_mut().zip(analog) {
        let distance = FS2 - pole;
        denominator *= distance.norm_sqr();
        let z = (FS2 + pole) / distance;
        *section = SecondOrderSection::bandpass(-2.0 * z.re, z.norm_sqr());
    }

    // k * prod(fs2 - zeros) / prod(fs2 - poles) with k = bw², zeros = [0, 0].
    let gain = bw * bw * FS2 * FS2 / denominator;

    FilterCoefficients { gain, sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band_normalization() {
        let band = NormalizedBand::from_hz(700.0, 250.0, 48000.0);
        assert!((band.low - 0.023_958).abs() < 1e-5, "low = {}", band.low);
        assert!((band.high - 0.034_375).abs() < 1e-5, "high = {}", band.high);
    }

    #[test]
    fn edges_are_clamped() {
        let band = NormalizedBand::from_hz(20000.0, 20000.0, 44100.0);
        assert!((band.low - 10000.0 / 22050.0).abs() < 1e-9);
        assert_eq!(band.high, MAX_EDGE_NORM);

        let band = NormalizedBand::from_hz(20.0, 20.0, 48000.0);
        assert_eq!(band.low, MIN_EDGE_NORM);
    }

    #[test]
    fn collapsed_band_gets_minimum_width() {
        // Both edges fall below MIN_EDGE_NORM and clamp to the same value.
        let band = NormalizedBand::from_hz(20.0, 1.0, 48000.0);
        assert!(band.width() >= MIN_BAND_WIDTH_NORM * 0.999);
        assert!(band.low >= MIN_EDGE_NORM);
        assert!(band.high > band.low);

        // Both edges above MAX_EDGE_NORM.
        let band = NormalizedBand::from_hz(23990.0, 2.0, 48000.0);
        assert!(band.high <= MAX_EDGE_NORM + 1e-12);
        assert!(band.high > band.low);
    }

    #[test]
    fn degenerate_inputs_are_replaced() {
        let band = NormalizedBand::from_hz(700.0, 0.0, 48000.0);
        assert!(band.width() > 0.0);

        let band = NormalizedBand::from_hz(f32::NAN, f32::INFINITY, -1.0);
        assert!(band.low.is_finite() && band.high.is_finite());
        assert!(band.high > band.low);
    }

    #[test]
    fn design_is_deterministic() {
        let a = butterworth_bandpass(1234.0, 321.0, 44100.0);
        let b = butterworth_bandpass(1234.0, 321.0, 44100.0);
        assert_eq!(a, b);
    }

    #[test]
    fn sections_are_normalized_bandpass() {
        let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
        assert_eq!(coeffs.sections.len(), 2);
        for section in &coeffs.sections {
            let [b0, b1, b2, a0, _, _] = section.to_array();
            assert_eq!((b0, b1, b2, a0), (1.0, 0.0, -1.0, 1.0));
            assert!(section.is_stable());
        }
        assert!(coeffs.gain > 0.0 && coeffs.gain < 1.0);
    }

    #[test]
    fn unity_gain_at_geometric_center() {
        let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
        let geometric = libm::sqrtf(575.0 * 825.0);
        let gain = coeffs.magnitude_at(geometric, 48000.0);
        assert!((gain - 1.0).abs() < 1e-3, "gain at center = {gain}");
    }

    #[test]
    fn half_power_at_band_edges() {
        let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
        let half_power = FRAC_1_SQRT_2;
        for edge in [575.0, 825.0] {
            let gain = coeffs.magnitude_at(edge, 48000.0);
            assert!((gain - half_power).abs() < 0.01, "gain at {edge} Hz = {gain}");
        }
    }

    #[test]
    fn stopband_is_attenuated() {
        let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
        assert!(coeffs.magnitude_at(5000.0, 48000.0) < 0.01);
        assert!(coeffs.magnitude_at(60.0, 48000.0) < 0.01);
        assert!(coeffs.magnitude_at(0.0, 48000.0) < 1e-9);
    }

    #[test]
    fn state_reset_and_flush() {
        let coeffs = butterworth_bandpass(700.0, 250.0, 48000.0);
        let mut state = FilterState::new();
        coeffs.process_sample(&mut state, 1.0);
        assert!(!state.is_silent());
        state.reset();
        assert!(state.is_silent());
    }
}
