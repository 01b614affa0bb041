//! Light-occlusion grid
//!
//! Obstructions ("block points") overhead cast a cone of shade downward. The
//! grid keeps, per voxel, how blocked it is and which way the most light
//! comes from, so a growing tip can ask where to grow.

pub mod config;
pub mod dense;
pub mod grid;
pub mod kernel;

pub use config::GridConfig;
pub use dense::Dense3;
pub use grid::{BlockPoint, BlockPointId, LightSample, OcclusionGrid, Unit};
pub use kernel::{Kernel, KernelEntry};
