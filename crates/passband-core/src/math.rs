//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers shared by the signal chain and the filter designer.
//! All functions are suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`linear_to_db`] - Convert linear gain to decibels
//!
//! # Limiting
//!
//! - [`hard_clip`] - Brickwall clamp to ±threshold
//! - [`soft_knee`] - Smooth compression between a knee and a ceiling

use libm::{logf, tanhf};

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are floored at -200 dB.
///
/// # Example
/// ```rust
/// use passband_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Hard clip to ±threshold range.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Soft-knee compression curve.
///
/// Identity below `knee`. Above it, the excess is squashed with `tanh` so the
/// magnitude bends toward `ceiling`. Far above the knee `tanh` saturates in
/// `f32` and the output sits exactly at the ceiling, never above it. The curve
/// is continuous with unit slope at the knee. Requires `0 <= knee < ceiling`.
///
/// ```rust
/// use passband_core::math::soft_knee;
///
/// assert_eq!(soft_knee(0.5, 0.7, 0.95), 0.5);
/// assert!(soft_knee(5.0, 0.7, 0.95) <= 0.95);
/// assert!(soft_knee(-5.0, 0.7, 0.95) >= -0.95);
/// assert!(soft_knee(0.8, 0.7, 0.95) < 0.8);
/// ```
#[inline]
pub fn soft_knee(x: f32, knee: f32, ceiling: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= knee {
        return x;
    }
    let range = ceiling - knee;
    let shaped = knee + range * tanhf((magnitude - knee) / range);
    shaped.min(ceiling).copysign(x)
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormal values cause large slowdowns on most CPUs. Filter state decays
/// toward zero indefinitely after the input goes silent, so the delay
/// registers are flushed once per block.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < 1e-30 { 0.0 } else { x }
}
