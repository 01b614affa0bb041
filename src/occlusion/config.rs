//! Occlusion grid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{DVec3, IVec3, Result};
use crate::math::constants::{FRAC_PI_2, PI};

/// Largest element count accepted on any axis by default.
pub const DEFAULT_MAX_ELEMENTS_PER_AXIS: u32 = 512;

/// Parameters that fully determine a grid's geometry and kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Extents of the covered cuboid. X and Z are centered on the origin, Y starts at 0.
    pub size: [f64; 3],
    /// Edge length of every voxel.
    pub unit_size: f64,
    /// World-space radius beyond which a voxel has no influence.
    pub detection_range: f64,
    /// Half-angle of the influence cone, measured from straight down (radians).
    pub cone_range_angle: f64,
    /// Global multiplier on light-direction contributions.
    pub intensity: f64,
    /// Upper bound on elements per axis; larger grids are rejected.
    pub max_elements_per_axis: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: [3.25, 3.25, 3.25],
            unit_size: 0.25,
            detection_range: 2.4,
            cone_range_angle: PI / 8.0,
            intensity: 0.5,
            max_elements_per_axis: DEFAULT_MAX_ELEMENTS_PER_AXIS,
        }
    }
}

impl GridConfig {
    /// Cube of edge `size` with the remaining parameters explicit.
    pub fn cube(size: f64, unit_size: f64, detection_range: f64, cone_range_angle: f64, intensity: f64) -> Self {
        Self {
            size: [size; 3],
            unit_size,
            detection_range,
            cone_range_angle,
            intensity,
            max_elements_per_axis: DEFAULT_MAX_ELEMENTS_PER_AXIS,
        }
    }

    pub fn size_vec(&self) -> DVec3 {
        DVec3::from_array(self.size)
    }

    /// Elements per axis, rounding up so the requested volume is always covered.
    pub fn element_counts(&self) -> Result<IVec3> {
        self.validate()?;
        let mut counts = [0i32; 3];
        for (axis, count) in counts.iter_mut().enumerate() {
            let elements = (self.size[axis] / self.unit_size).ceil();
            if elements > self.max_elements_per_axis as f64 {
                return Err(Error::Config(format!(
                    "{elements} elements on axis {axis} exceeds the maximum of {}",
                    self.max_elements_per_axis
                )));
            }
            *count = elements as i32;
        }
        Ok(IVec3::from_array(counts))
    }

    /// Reject parameters that cannot produce a usable grid.
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_size.is_finite() && self.unit_size > 0.0) {
            return Err(Error::Config(format!("unit size must be positive, got {}", self.unit_size)));
        }
        for (axis, extent) in self.size.iter().enumerate() {
            if !(extent.is_finite() && *extent > 0.0) {
                return Err(Error::Config(format!("extent on axis {axis} must be positive, got {extent}")));
            }
        }
        if !(self.detection_range.is_finite() && self.detection_range > 0.0) {
            return Err(Error::Config(format!(
                "detection range must be positive, got {}",
                self.detection_range
            )));
        }
        if !(self.cone_range_angle > 0.0 && self.cone_range_angle <= FRAC_PI_2) {
            return Err(Error::Config(format!(
                "cone range angle must be in (0, π/2], got {}",
                self.cone_range_angle
            )));
        }
        if !(self.intensity.is_finite() && self.intensity > 0.0) {
            return Err(Error::Config(format!("intensity must be positive, got {}", self.intensity)));
        }
        if self.max_elements_per_axis == 0 {
            return Err(Error::Config("max elements per axis must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
