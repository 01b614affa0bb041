//! Spherical direction angles
//!
//! Polar 0 points along +x and increases clockwise when viewed from above.
//! Azimuth 0 points straight up (+y) and increases as the direction tilts
//! toward horizontal and beyond.

use crate::core::types::DVec3;
use crate::math::constants::{FRAC_PI_2, PI, TAU, THREE_FRAC_PI_2};
use crate::math::vector::Vector;

/// Direction without magnitude
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphericalAngles {
    /// Rotation about the vertical axis, `0..2π`
    pub polar: f64,
    /// Tilt from vertical, `0..=π`
    pub azimuth: f64,
}

impl SphericalAngles {
    pub fn new(polar: f64, azimuth: f64) -> Self {
        Self { polar, azimuth }
    }

    /// Angles of `v`. A zero vector yields polar 0 and azimuth 0.
    pub fn from_vector(v: &Vector) -> Self {
        let (x, z) = (v.x(), v.z());

        let polar = if x > 0.0 && z >= 0.0 {
            (z / x).atan()
        } else if x < 0.0 && z >= 0.0 {
            PI - (z / x.abs()).atan()
        } else if x < 0.0 && z < 0.0 {
            PI + (z.abs() / x.abs()).atan()
        } else if x > 0.0 && z < 0.0 {
            TAU - (z.abs() / x).atan()
        } else if z > 0.0 {
            FRAC_PI_2
        } else if z < 0.0 {
            THREE_FRAC_PI_2
        } else {
            0.0
        };

        if v.is_zero() {
            log::warn!("Finding angles of a zero-length vector");
            return Self { polar, azimuth: 0.0 };
        }

        Self { polar, azimuth: (v.y() / v.mag()).clamp(-1.0, 1.0).acos() }
    }

    /// Vector of length `mag` pointing along these angles
    pub fn to_vector(&self, mag: f64) -> Vector {
        let len_sin_azi = mag * self.azimuth.sin();
        Vector::from_dvec3(DVec3::new(
            len_sin_azi * self.polar.cos(),
            mag * self.azimuth.cos(),
            len_sin_azi * self.polar.sin(),
        ))
    }
}
