//! Influence kernel of a single fully dense voxel.
//!
//! The kernel lists every voxel offset below a source voxel that lies inside
//! both the detection sphere and the downward detection cone, together with
//! how much blockage and light-direction change a fully dense source applies
//! at that offset. It depends only on the grid configuration, so it is
//! computed once per grid and shared by every update.

use crate::core::error::Error;
use crate::core::types::{DVec3, IVec3, Result};
use crate::math::constants::{trunc4, ANGLE_EPSILON};
use crate::math::vector::Vector;

use super::config::GridConfig;

/// One affected offset and its full-density contribution.
#[derive(Debug, Clone, Copy)]
pub struct KernelEntry {
    /// Target cell minus source cell.
    pub offset: IVec3,
    /// Light-direction change at full density, pointing from source to target.
    pub contribution: Vector,
    /// Blockage added at full density.
    pub blockage_strength: f64,
}

/// Precomputed offsets plus the normalizing maxima.
#[derive(Debug, Clone)]
pub struct Kernel {
    entries: Vec<KernelEntry>,
    max_blockage: f64,
    max_light: Vector,
}

impl Kernel {
    /// Build the kernel for `config`.
    ///
    /// Fails when no voxel lies inside the cone, since the grid would then
    /// have no way to normalize blockage.
    pub fn compute(config: &GridConfig) -> Result<Self> {
        let unit_size = config.unit_size;
        let range = config.detection_range;
        let max_index_diff = (range / unit_size).floor() as i32;
        let straight_down = Vector::new(0.0, -1.0, 0.0);

        let mut entries = Vec::new();
        let mut max_blockage = 0.0;
        let mut light_total = DVec3::ZERO;

        for dy in -max_index_diff..=0 {
            for dz in -max_index_diff..=max_index_diff {
                for dx in -max_index_diff..=max_index_diff {
                    let offset = IVec3::new(dx, dy, dz);
                    if offset == IVec3::ZERO {
                        continue;
                    }

                    let to_target = Vector::from_dvec3(offset.as_dvec3() * unit_size);
                    let true_distance = to_target.mag();
                    if true_distance >= range {
                        continue;
                    }

                    // Non-zero offset, so the angle is always defined. Offsets on
                    // the cone surface are inside whichever way acos rounds.
                    let angle = to_target.angle_between(&straight_down)?;
                    if angle > config.cone_range_angle + ANGLE_EPSILON {
                        continue;
                    }

                    let blockage_strength = trunc4(1.0 - true_distance / range);
                    if blockage_strength <= 0.0 {
                        continue;
                    }

                    let contribution = to_target.resized(blockage_strength)?;
                    max_blockage += blockage_strength;
                    light_total += contribution.as_dvec3();

                    entries.push(KernelEntry { offset, contribution, blockage_strength });
                }
            }
        }

        if entries.is_empty() {
            return Err(Error::Config(format!(
                "detection range {range} with cone angle {} reaches no voxel of size {unit_size}",
                config.cone_range_angle
            )));
        }

        // The search ran downward; light points back up toward the sources.
        let mut max_light = Vector::from_dvec3(light_total).flipped_y();
        max_light.trunc4();
        if max_light.is_zero() {
            return Err(Error::Config("kernel produced a zero maximum light vector".to_string()));
        }

        for entry in &mut entries {
            let scaled = entry.contribution.mag() * max_light.mag() * config.intensity;
            entry.contribution.resize(scaled)?;
        }

        log::debug!(
            "Kernel: {} offsets, max blockage {:.4}, max light {}",
            entries.len(),
            max_blockage,
            max_light
        );

        Ok(Self { entries, max_blockage, max_light })
    }

    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total blockage a voxel would receive with every source fully dense.
    pub fn max_blockage(&self) -> f64 {
        self.max_blockage
    }

    /// Light direction of a completely unobstructed voxel.
    pub fn max_light(&self) -> Vector {
        self.max_light
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::FRAC_PI_4;

    fn config() -> GridConfig {
        GridConfig::cube(3.0, 0.25, 1.0, FRAC_PI_4, 0.5)
    }

    #[test]
    fn test_offsets_inside_cone_and_range() {
        let config = config();
        let kernel = Kernel::compute(&config).unwrap();
        assert!(!kernel.is_empty());

        for entry in kernel.entries() {
            let v = entry.offset.as_dvec3() * config.unit_size;
            assert!(entry.offset.y < 0);
            assert!(v.length() < config.detection_range);
            let horizontal = (v.x * v.x + v.z * v.z).sqrt();
            assert!(horizontal <= -v.y + 1e-9, "offset {} outside 45° cone", entry.offset);
        }
    }

    #[test]
    fn test_cone_surface_offsets_included() {
        let mut config = config();
        config.detection_range = 1.5;
        let kernel = Kernel::compute(&config).unwrap();
        for offset in [
            IVec3::new(1, -1, 0),
            IVec3::new(-1, -1, 0),
            IVec3::new(0, -1, 1),
            IVec3::new(0, -1, -1),
            IVec3::new(2, -2, 0),
            IVec3::new(3, -3, 0),
        ] {
            assert!(
                kernel.entries().iter().any(|e| e.offset == offset),
                "offset {offset} on the 45° cone is missing"
            );
        }
        assert!(!kernel.entries().iter().any(|e| e.offset == IVec3::new(2, -1, 0)));
    }

    #[test]
    fn test_directly_below_strength() {
        let kernel = Kernel::compute(&config()).unwrap();
        let below = kernel
            .entries()
            .iter()
            .find(|e| e.offset == IVec3::new(0, -1, 0))
            .unwrap();
        assert_eq!(below.blockage_strength, 0.75);
        assert!(below.contribution.y() < 0.0);
        assert_eq!(below.contribution.x(), 0.0);
    }

    #[test]
    fn test_max_light_points_up() {
        let kernel = Kernel::compute(&config()).unwrap();
        let light = kernel.max_light();
        assert!(light.y() > 0.0);
        assert!(light.x().abs() < 1e-3 && light.z().abs() < 1e-3);
        let sum: f64 = kernel.entries().iter().map(|e| e.blockage_strength).sum();
        assert!((sum - kernel.max_blockage()).abs() < 1e-9);
    }

    #[test]
    fn test_contribution_scaled_by_intensity() {
        let base = Kernel::compute(&config()).unwrap();
        let mut doubled_config = config();
        doubled_config.intensity = 1.0;
        let doubled = Kernel::compute(&doubled_config).unwrap();

        for (a, b) in base.entries().iter().zip(doubled.entries()) {
            assert_eq!(a.offset, b.offset);
            assert!((b.contribution.mag() - 2.0 * a.contribution.mag()).abs() < 1e-9);
            let expected = a.blockage_strength * base.max_light().mag() * 0.5;
            assert!((a.contribution.mag() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_range_below_one_unit_is_config_error() {
        let config = GridConfig::cube(3.0, 0.25, 0.2, FRAC_PI_4, 0.5);
        assert!(matches!(Kernel::compute(&config), Err(Error::Config(_))));
    }
}
