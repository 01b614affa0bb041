//! Oriented local frame
//!
//! A frame is built from the angles of a direction that acts as its "up".
//! Offsets given as polar/azimuth/distance relative to that up are turned into
//! world-space vectors. The rotation is Rodrigues' formula about the
//! horizontal axis perpendicular to both world up and the frame's up.

use crate::core::types::{DMat3, DVec3};
use crate::math::angles::SphericalAngles;
use crate::math::constants::FRAC_PI_2;
use crate::math::vector::Vector;

/// Immutable orientation built from a direction
#[derive(Clone, Copy, Debug)]
pub struct OrientedFrame {
    rotation: DMat3,
    polar_orientation: f64,
}

impl OrientedFrame {
    /// Frame whose local +y points along `up`
    pub fn new(up: SphericalAngles) -> Self {
        // Rotating by -azimuth about u tilts +y onto the target direction.
        let angle = -up.azimuth;
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        let m_cos = 1.0 - cos_a;

        // Axis lies in the horizontal plane, so its y component is zero.
        let axis_polar = up.polar + FRAC_PI_2;
        let ux = axis_polar.cos();
        let uz = axis_polar.sin();

        let rows = [
            [ux * ux * m_cos + cos_a, -uz * sin_a, ux * uz * m_cos],
            [uz * sin_a, cos_a, -ux * sin_a],
            [ux * uz * m_cos, ux * sin_a, uz * uz * m_cos + cos_a],
        ];

        Self {
            rotation: DMat3::from_cols_array_2d(&rows).transpose(),
            polar_orientation: up.polar,
        }
    }

    /// Frame oriented along `v`
    pub fn along(v: &Vector) -> Self {
        Self::new(v.angles())
    }

    /// World-space vector for a local polar/azimuth offset of length `distance`
    pub fn make_vector(&self, polar: f64, azimuth: f64, distance: f64) -> Vector {
        let added_polar = polar + self.polar_orientation;
        let dist_sin_azi = distance * azimuth.sin();
        let local = DVec3::new(
            dist_sin_azi * added_polar.cos(),
            distance * azimuth.cos(),
            dist_sin_azi * added_polar.sin(),
        );
        Vector::from_dvec3(self.rotation * local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::{PI, TAU};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_zero_azimuth_follows_up() {
        for v in [
            Vector::new(0.0, 1.0, 0.0),
            Vector::new(1.0, 1.0, 0.0),
            Vector::new(-0.4, 0.2, 0.9),
            Vector::new(0.3, -1.0, -0.2),
        ] {
            let frame = OrientedFrame::along(&v);
            let made = frame.make_vector(0.0, 0.0, v.mag());
            assert!((made.as_dvec3() - v.as_dvec3()).length() < EPS, "{v}");
        }
    }

    #[test]
    fn test_ring_is_perpendicular_to_up() {
        let v = Vector::new(0.5, 1.0, -0.25);
        let frame = OrientedFrame::along(&v);
        let sides = 7;
        for i in 0..sides {
            let polar = -(i as f64) * TAU / sides as f64;
            let spoke = frame.make_vector(polar, FRAC_PI_2, 2.0);
            assert!(spoke.dot(&v).abs() < EPS);
            assert!((spoke.mag() - 2.0).abs() < EPS);
        }
    }

    #[test]
    fn test_upright_frame_is_identity() {
        let frame = OrientedFrame::new(SphericalAngles::new(0.0, 0.0));
        let made = frame.make_vector(PI, FRAC_PI_2, 1.0);
        assert!((made.as_dvec3() - DVec3::new(-1.0, 0.0, 0.0)).length() < EPS);
    }
}
