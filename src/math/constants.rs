//! Frozen angle constants

use std::f64::consts;

pub const PI: f64 = consts::PI;
/// π / 2
pub const FRAC_PI_2: f64 = consts::FRAC_PI_2;
/// π / 4
pub const FRAC_PI_4: f64 = consts::FRAC_PI_4;
/// 2π
pub const TAU: f64 = consts::TAU;
/// 3π / 2
pub const THREE_FRAC_PI_2: f64 = PI + FRAC_PI_2;

/// Angles below this (radians) count as parallel
pub const ANGLE_EPSILON: f64 = 1.0e-4;

/// Scale used when truncating values to 4 decimal digits
pub const TRUNC4_SCALE: f64 = 10_000.0;

/// Truncate toward zero at the 4th decimal digit
#[inline]
pub fn trunc4(value: f64) -> f64 {
    (value * TRUNC4_SCALE).trunc() / TRUNC4_SCALE
}
