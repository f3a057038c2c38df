//! Live-tunable filter parameters and their validation rules.
//!
//! [`FilterParameters`] is the value the control context publishes and the
//! audio callback reads once per block. The clamp helpers encode the control
//! rules: center frequency in `[20, 20000]` Hz, bandwidth in `[1, center]` Hz.
//! Bandwidth may never exceed the center frequency, so a low center also
//! narrows the widest achievable passband.

/// Default center frequency in Hz.
pub const DEFAULT_CENTER_HZ: f32 = 700.0;

/// Default bandwidth in Hz.
pub const DEFAULT_BANDWIDTH_HZ: f32 = 250.0;

/// Default sample rate in Hz, replaced by the device rate on selection.
pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;

/// Default stream buffer size in frames.
pub const DEFAULT_BUFFER_SIZE: u32 = 256;

/// Lowest accepted center frequency in Hz.
pub const MIN_CENTER_HZ: f32 = 20.0;

/// Highest accepted center frequency in Hz.
pub const MAX_CENTER_HZ: f32 = 20000.0;

/// Narrowest accepted bandwidth in Hz.
pub const MIN_BANDWIDTH_HZ: f32 = 1.0;

/// Bandpass filter parameters.
///
/// `center_freq` and `bandwidth` come from the control surface; `sample_rate`
/// follows the active stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterParameters {
    /// Center frequency in Hz.
    pub center_freq: f32,
    /// Passband width in Hz.
    pub bandwidth: f32,
    /// Stream sample rate in Hz.
    pub sample_rate: f32,
}

impl FilterParameters {
    /// Create parameters without applying the control clamps.
    pub const fn new(center_freq: f32, bandwidth: f32, sample_rate: f32) -> Self {
        Self {
            center_freq,
            bandwidth,
            sample_rate,
        }
    }

    /// Create parameters with the control clamps applied to center and bandwidth.
    ///
    /// Inputs must be finite; the store rejects non-finite requests before
    /// they reach this point.
    pub fn clamped(center_freq: f32, bandwidth: f32, sample_rate: f32) -> Self {
        let center_freq = clamp_center(center_freq);
        Self {
            center_freq,
            bandwidth: clamp_bandwidth(bandwidth, center_freq),
            sample_rate,
        }
    }

    /// Return a copy with a different sample rate.
    pub const fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Nyquist frequency (half the sample rate).
    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Passband edges `(center - bw/2, center + bw/2)` in Hz, before any clamping.
    pub fn band_edges(&self) -> (f32, f32) {
        let half = self.bandwidth * 0.5;
        (self.center_freq - half, self.center_freq + half)
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER_HZ, DEFAULT_BANDWIDTH_HZ, DEFAULT_SAMPLE_RATE)
    }
}

/// Clamp a center frequency into `[MIN_CENTER_HZ, MAX_CENTER_HZ]`.
#[inline]
pub fn clamp_center(center_freq: f32) -> f32 {
    center_freq.clamp(MIN_CENTER_HZ, MAX_CENTER_HZ)
}

/// Clamp a bandwidth into `[MIN_BANDWIDTH_HZ, center_freq]`.
///
/// `center_freq` is expected to be already clamped, which guarantees
/// `center_freq >= MIN_BANDWIDTH_HZ`.
#[inline]
pub fn clamp_bandwidth(bandwidth: f32, center_freq: f32) -> f32 {
    bandwidth.clamp(MIN_BANDWIDTH_HZ, center_freq.max(MIN_BANDWIDTH_HZ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_values() {
        let params = FilterParameters::default();
        assert_eq!(params.center_freq, 700.0);
        assert_eq!(params.bandwidth, 250.0);
        assert_eq!(params.sample_rate, 48000.0);
    }

    #[test]
    fn band_edges_for_default_parameters() {
        let (low, high) = FilterParameters::default().band_edges();
        assert_eq!(low, 575.0);
        assert_eq!(high, 825.0);
    }

    #[test]
    fn center_is_clamped_to_audible_range() {
        assert_eq!(clamp_center(5.0), MIN_CENTER_HZ);
        assert_eq!(clamp_center(30000.0), MAX_CENTER_HZ);
        assert_eq!(clamp_center(1000.0), 1000.0);
    }

    #[test]
    fn bandwidth_cannot_exceed_center() {
        assert_eq!(clamp_bandwidth(500.0, 100.0), 100.0);
        assert_eq!(clamp_bandwidth(0.0, 100.0), MIN_BANDWIDTH_HZ);
        assert_eq!(clamp_bandwidth(-3.0, 100.0), MIN_BANDWIDTH_HZ);
    }

    #[test]
    fn clamped_applies_both_rules() {
        let params = FilterParameters::clamped(10.0, 400.0, 44100.0);
        assert_eq!(params.center_freq, 20.0);
        assert_eq!(params.bandwidth, 20.0);
        assert_eq!(params.sample_rate, 44100.0);
    }

    #[test]
    fn nyquist_is_half_rate() {
        assert_eq!(FilterParameters::default().nyquist(), 24000.0);
    }
}
