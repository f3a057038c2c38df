//! Passband Core - bandpass design and the real-time signal chain
//!
//! This crate holds everything that runs inside the audio callback. It has no
//! knowledge of devices or streams; `passband-io` feeds it blocks.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`FilterParameters`] - Center frequency, bandwidth, and sample rate
//! - [`clamp_center`] / [`clamp_bandwidth`] - Control-surface clamping rules
//!
//! ## Filter Design
//!
//! - [`butterworth_bandpass`] - Order-2 Butterworth bandpass as two cascaded sections
//! - [`NormalizedBand`] - Band edges normalized to Nyquist, with degenerate-band handling
//! - [`FilterCoefficients`] / [`FilterState`] - Coefficients and persistent filter history
//! - [`SecondOrderSection`] - Transposed Direct Form II biquad
//!
//! ## Dynamics
//!
//! - [`SoftLimiter`] - tanh soft knee with a hard ceiling
//!
//! ## Signal Chain
//!
//! - [`SignalChain`] - Input gain → bandpass → output gain → limiter, block by block
//! - [`BlockOutcome`] / [`ProcessingFault`] - Per-block fault reporting
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for targets without an allocator:
//!
//! ```toml
//! [dependencies]
//! passband-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use passband_core::{FilterParameters, SignalChain};
//!
//! let mut chain = SignalChain::default();
//! let params = FilterParameters::default();
//! let input = [0.0f32; 256];
//! let mut output = [0.0f32; 256];
//! let outcome = chain.process(&input, &mut output, &params);
//! assert!(!outcome.is_fault());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod chain;
pub mod design;
pub mod limiter;
pub mod math;
pub mod params;

pub use biquad::{SecondOrderSection, SectionState};
pub use chain::{
    BlockOutcome, ChainSettings, DEFAULT_POST_GAIN, DEFAULT_PRE_GAIN, ProcessingFault, SignalChain,
};
pub use design::{
    FilterCoefficients, FilterState, MAX_EDGE_NORM, MIN_BAND_WIDTH_NORM, MIN_EDGE_NORM,
    NormalizedBand, SECTION_COUNT, butterworth_bandpass, design_band,
};
pub use limiter::{DEFAULT_CEILING, DEFAULT_KNEE, SoftLimiter};
pub use math::{flush_denormal, hard_clip, linear_to_db, soft_knee};
pub use params::{
    DEFAULT_BANDWIDTH_HZ, DEFAULT_BUFFER_SIZE, DEFAULT_CENTER_HZ, DEFAULT_SAMPLE_RATE,
    FilterParameters, MAX_CENTER_HZ, MIN_BANDWIDTH_HZ, MIN_CENTER_HZ, clamp_bandwidth,
    clamp_center,
};
