//! Light-occlusion grid.
//!
//! Block points deposit density into the voxel that contains them. Whenever
//! the clamped density of a voxel changes, the change is pushed through the
//! kernel to every voxel inside the downward detection cone, updating their
//! blockage and light direction. Queries then read a single voxel.
//!
//! World-to-cell mapping is plain integer division of the shifted coordinate
//! by the unit size: X and Z are shifted by half the grid extent, Y is not.

use crate::core::error::Error;
use crate::core::types::{DVec3, IVec3, Point, Result};
use crate::math::aabb::Aabb;
use crate::math::vector::Vector;

use super::config::GridConfig;
use super::dense::Dense3;
use super::kernel::Kernel;

/// One grid cell.
#[derive(Debug, Clone)]
pub struct Unit {
    center: Point,
    density: f64,
    blockage: f64,
    light_direction: Vector,
}

impl Unit {
    /// Geometric center of the cell.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Raw summed density of the block points inside, not clamped.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Density as seen by propagation, clamped to `0..=1`.
    ///
    /// Add/remove cycles can leave the raw sum a rounding error below zero.
    pub fn effective_density(&self) -> f64 {
        self.density.clamp(0.0, 1.0)
    }

    /// Accumulated, unnormalized blockage.
    pub fn blockage(&self) -> f64 {
        self.blockage
    }

    /// Accumulated light direction (not unit length).
    pub fn light_direction(&self) -> Vector {
        self.light_direction
    }
}

/// Stable handle to a block point owned by a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPointId(pub u32);

/// A point obstruction placed in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPoint {
    pub location: Point,
    pub density: f64,
    pub cell: IVec3,
}

/// Result of a grid query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit-length direction with the most light.
    pub direction: DVec3,
    /// Blockage as a fraction of the maximum possible, nominally `0..=1`.
    pub blockage: f64,
}

/// Voxel grid tracking how block points shade the volume beneath them.
#[derive(Debug, Clone)]
pub struct OcclusionGrid {
    config: GridConfig,
    elements: IVec3,
    /// World position of the corner of cell (0, 0, 0).
    origin: DVec3,
    kernel: Kernel,
    units: Dense3<Unit>,
    block_points: Vec<Option<BlockPoint>>,
}

impl OcclusionGrid {
    /// Build a grid, failing on any configuration that cannot cover its volume.
    pub fn new(config: GridConfig) -> Result<Self> {
        let elements = config.element_counts()?;
        let kernel = Kernel::compute(&config)?;

        let unit_size = config.unit_size;
        // Centered on the covered cells, so a rounded-up extra cell splits evenly.
        let covered = elements.as_dvec3() * unit_size;
        let origin = DVec3::new(-covered.x / 2.0, 0.0, -covered.z / 2.0);
        let max_light = kernel.max_light();

        let units = Dense3::populate_from(elements, |cell| Unit {
            center: origin + (cell.as_dvec3() + DVec3::splat(0.5)) * unit_size,
            density: 0.0,
            blockage: 0.0,
            light_direction: max_light,
        });

        log::debug!(
            "Occlusion grid {}x{}x{} ({} units, kernel of {})",
            elements.x,
            elements.y,
            elements.z,
            units.len(),
            kernel.len()
        );

        Ok(Self {
            config,
            elements,
            origin,
            kernel,
            units,
            block_points: Vec::new(),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn element_counts(&self) -> IVec3 {
        self.elements
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// World-space volume covered by the cells (may exceed the requested size).
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.origin, self.origin + self.elements.as_dvec3() * self.config.unit_size)
    }

    pub fn unit(&self, cell: IVec3) -> Option<&Unit> {
        self.units.get(cell)
    }

    pub fn units(&self) -> impl Iterator<Item = (IVec3, &Unit)> + '_ {
        self.units.iter()
    }

    pub fn block_point(&self, id: BlockPointId) -> Option<&BlockPoint> {
        self.block_points.get(id.0 as usize)?.as_ref()
    }

    /// Live block points with their handles.
    pub fn block_points(&self) -> impl Iterator<Item = (BlockPointId, &BlockPoint)> + '_ {
        self.block_points
            .iter()
            .enumerate()
            .filter_map(|(i, bp)| bp.as_ref().map(|bp| (BlockPointId(i as u32), bp)))
    }

    /// Cell containing `location`. Points on the upper faces belong to the last cell.
    pub fn cell_of(&self, location: Point) -> Result<IVec3> {
        let shifted = (location - self.origin) / self.config.unit_size;
        if !shifted.is_finite() || shifted.cmplt(DVec3::ZERO).any() {
            return Err(Error::OutOfRange(location));
        }
        let on_upper_face = shifted.cmpeq(self.elements.as_dvec3());
        let cell = IVec3::select(on_upper_face, self.elements - IVec3::ONE, shifted.floor().as_ivec3());
        if self.units.contains(cell) {
            Ok(cell)
        } else {
            Err(Error::OutOfRange(location))
        }
    }

    /// Place a block point and propagate its density.
    pub fn add_block_point(&mut self, location: Point, density: f64) -> Result<BlockPointId> {
        if !(0.0..=1.0).contains(&density) {
            return Err(Error::InvalidDensity(density));
        }
        let cell = self.cell_of(location)?;

        let point = BlockPoint { location, density, cell };
        self.adjust_grid(&point, 1.0);

        let id = BlockPointId(self.block_points.len() as u32);
        self.block_points.push(Some(point));
        Ok(id)
    }

    /// Move a block point, re-propagating only if it changes cell.
    pub fn move_block_point(&mut self, id: BlockPointId, new_location: Point) -> Result<()> {
        let new_cell = self.cell_of(new_location)?;
        let mut point = self.block_point(id).cloned().ok_or(Error::UnknownBlockPoint(id))?;

        if new_cell != point.cell {
            self.adjust_grid(&point, -1.0);
            point.cell = new_cell;
            self.adjust_grid(&point, 1.0);
        }
        point.location = new_location;

        self.block_points[id.0 as usize] = Some(point);
        Ok(())
    }

    /// Withdraw a block point's contribution and retire its handle.
    pub fn remove_block_point(&mut self, id: BlockPointId) -> Result<BlockPoint> {
        let point = self
            .block_points
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(Error::UnknownBlockPoint(id))?;
        self.adjust_grid(&point, -1.0);
        Ok(point)
    }

    /// Light direction (unit length) and normalized blockage at `location`.
    pub fn direction_and_blockage(&self, location: Point) -> Result<LightSample> {
        let cell = self.cell_of(location)?;
        let unit = self.units.get(cell).ok_or(Error::OutOfRange(location))?;

        let direction = unit
            .light_direction
            .resized_or_zero(1.0, "OcclusionGrid::direction_and_blockage")
            .as_dvec3();

        Ok(LightSample {
            direction,
            blockage: (unit.blockage / self.kernel.max_blockage()).max(0.0),
        })
    }

    /// In-range cells a fully dense voxel at `cell` would influence.
    pub fn units_affected_by(&self, cell: IVec3) -> impl Iterator<Item = IVec3> + '_ {
        self.kernel
            .entries()
            .iter()
            .map(move |entry| cell + entry.offset)
            .filter(|target| self.units.contains(*target))
    }

    /// Apply `sign * point.density` at the point's cell and push the change in
    /// clamped density through the kernel.
    fn adjust_grid(&mut self, point: &BlockPoint, sign: f64) {
        let Some(source) = self.units.get_mut(point.cell) else {
            log::warn!("Block point cell {} is outside the grid", point.cell);
            return;
        };

        let before = source.effective_density();
        source.density += sign * point.density;
        let after = source.effective_density();

        let delta = after - before;
        if delta == 0.0 {
            return;
        }

        let max_light_mag = self.kernel.max_light().mag();
        for entry in self.kernel.entries() {
            let Some(target) = self.units.get_mut(point.cell + entry.offset) else {
                continue;
            };

            target.light_direction += entry.contribution * delta;
            if target.light_direction.mag() > max_light_mag {
                target.light_direction = target
                    .light_direction
                    .resized_or_zero(max_light_mag, "OcclusionGrid::adjust_grid");
            }
            target.blockage += entry.blockage_strength * delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::FRAC_PI_4;

    fn scenario_grid() -> OcclusionGrid {
        OcclusionGrid::new(GridConfig::cube(3.0, 0.25, 1.0, FRAC_PI_4, 0.5)).unwrap()
    }

    fn snapshot(grid: &OcclusionGrid) -> Vec<(f64, f64, DVec3)> {
        grid.units()
            .map(|(_, u)| (u.density(), u.blockage(), u.light_direction().as_dvec3()))
            .collect()
    }

    #[test]
    fn test_construction() {
        let grid = scenario_grid();
        assert_eq!(grid.element_counts(), IVec3::splat(12));
        let corner = grid.unit(IVec3::ZERO).unwrap();
        assert_eq!(corner.center(), DVec3::new(-1.375, 0.125, -1.375));
        assert_eq!(corner.light_direction(), grid.kernel().max_light());
        assert_eq!(grid.bounds().min, DVec3::new(-1.5, 0.0, -1.5));
    }

    #[test]
    fn test_too_many_elements_fails() {
        let mut config = GridConfig::cube(100.0, 0.1, 1.0, FRAC_PI_4, 0.5);
        config.max_elements_per_axis = 256;
        assert!(matches!(OcclusionGrid::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_cell_mapping() {
        let grid = scenario_grid();
        assert_eq!(grid.cell_of(DVec3::new(0.0, 0.0, 0.0)).unwrap(), IVec3::new(6, 0, 6));
        assert_eq!(grid.cell_of(DVec3::new(-0.01, 0.3, 0.26)).unwrap(), IVec3::new(5, 1, 7));
        assert!(grid.cell_of(DVec3::new(0.0, -0.01, 0.0)).is_err());
        assert!(grid.cell_of(DVec3::new(1.5001, 1.0, 0.0)).is_err());
        assert!(grid.cell_of(DVec3::new(f64::NAN, 1.0, 0.0)).is_err());
    }

    #[test]
    fn test_upper_faces_map_to_last_cell() {
        let grid = scenario_grid();
        assert_eq!(grid.cell_of(DVec3::new(1.5, 1.0, 0.0)).unwrap(), IVec3::new(11, 4, 6));
        assert_eq!(grid.cell_of(DVec3::new(1.5, 3.0, 1.5)).unwrap(), IVec3::splat(11));
        assert!(grid.cell_of(DVec3::new(0.0, 3.0001, 0.0)).is_err());
    }

    #[test]
    fn test_rounded_up_cells_stay_centered() {
        let grid = OcclusionGrid::new(GridConfig::cube(1.1, 0.5, 1.0, FRAC_PI_4, 0.5)).unwrap();
        assert_eq!(grid.element_counts(), IVec3::splat(3));
        let bounds = grid.bounds();
        assert_eq!(bounds.min, DVec3::new(-0.75, 0.0, -0.75));
        assert_eq!(bounds.max, DVec3::new(0.75, 1.5, 0.75));
        assert_eq!(grid.unit(IVec3::new(1, 0, 1)).unwrap().center(), DVec3::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn test_add_remove_cycle_never_goes_negative() {
        let mut grid = scenario_grid();
        let location = DVec3::new(0.1, 2.6, 0.1);
        let cell = grid.cell_of(location).unwrap();
        let ids: Vec<_> = [0.7, 0.2, 0.1]
            .into_iter()
            .map(|d| grid.add_block_point(location, d).unwrap())
            .collect();
        for id in ids {
            grid.remove_block_point(id).unwrap();
        }

        let unit = grid.unit(cell).unwrap();
        assert!(unit.effective_density() >= 0.0);
        for (_, unit) in grid.units() {
            let sample = grid.direction_and_blockage(unit.center()).unwrap();
            assert!(sample.blockage >= 0.0);
        }
    }

    #[test]
    fn test_single_block_point_overhead() {
        let mut grid = scenario_grid();
        let test_location = DVec3::new(0.1, 1.1, 0.1);
        grid.add_block_point(test_location + DVec3::new(0.0, 0.25, 0.0), 1.0).unwrap();

        let sample = grid.direction_and_blockage(test_location).unwrap();
        assert!(sample.blockage > 0.0);
        assert!((sample.direction.length() - 1.0).abs() < 1e-9);

        let horizontal = (sample.direction.x.powi(2) + sample.direction.z.powi(2)).sqrt();
        assert!(sample.direction.y > 0.0);
        assert!(horizontal < sample.direction.y);
    }

    #[test]
    fn test_out_of_range_add_leaves_grid_unchanged() {
        let mut grid = OcclusionGrid::new(GridConfig::cube(1.0, 0.5, 1.0, FRAC_PI_4, 0.5)).unwrap();
        let before = snapshot(&grid);

        let result = grid.add_block_point(DVec3::new(10.0, 10.0, 10.0), 1.0);
        assert!(matches!(result, Err(Error::OutOfRange(_))));
        assert_eq!(snapshot(&grid), before);
        assert_eq!(grid.block_points().count(), 0);
    }

    #[test]
    fn test_invalid_density_rejected() {
        let mut grid = scenario_grid();
        assert!(matches!(
            grid.add_block_point(DVec3::new(0.0, 2.0, 0.0), 1.5),
            Err(Error::InvalidDensity(_))
        ));
    }

    #[test]
    fn test_density_clamp_only_propagates_clamped_delta() {
        let mut grid = scenario_grid();
        let source = DVec3::new(0.1, 2.6, 0.1);
        let below = DVec3::new(0.1, 2.35, 0.1);

        grid.add_block_point(source, 0.75).unwrap();
        let after_first = grid.direction_and_blockage(below).unwrap().blockage;

        grid.add_block_point(source, 0.75).unwrap();
        let after_second = grid.direction_and_blockage(below).unwrap().blockage;

        grid.add_block_point(source, 0.75).unwrap();
        let after_third = grid.direction_and_blockage(below).unwrap().blockage;

        let cell = grid.cell_of(source).unwrap();
        let unit = grid.unit(cell).unwrap();
        assert_eq!(unit.density(), 2.25);
        assert_eq!(unit.effective_density(), 1.0);

        // Only 0.25 of the second point's density fits under the clamp.
        assert!((after_second - after_first * (1.0 / 0.75)).abs() < 1e-9);
        assert_eq!(after_third, after_second);
    }

    #[test]
    fn test_removal_restores_below_clamp() {
        let mut grid = scenario_grid();
        let source = DVec3::new(0.1, 2.6, 0.1);
        let below = DVec3::new(0.1, 2.35, 0.1);

        let a = grid.add_block_point(source, 1.0).unwrap();
        let b = grid.add_block_point(source, 1.0).unwrap();
        let saturated = grid.direction_and_blockage(below).unwrap().blockage;

        grid.remove_block_point(a).unwrap();
        assert_eq!(grid.direction_and_blockage(below).unwrap().blockage, saturated);

        grid.remove_block_point(b).unwrap();
        assert!(grid.direction_and_blockage(below).unwrap().blockage.abs() < 1e-9);
        assert!(matches!(grid.remove_block_point(b), Err(Error::UnknownBlockPoint(_))));
    }

    #[test]
    fn test_move_equals_remove_then_add() {
        let start = DVec3::new(-0.3, 2.2, 0.4);
        let end = DVec3::new(0.45, 2.7, -0.2);

        let mut moved = scenario_grid();
        moved.add_block_point(DVec3::new(0.2, 2.9, 0.2), 0.6).unwrap();
        let id = moved.add_block_point(start, 0.8).unwrap();
        moved.move_block_point(id, end).unwrap();

        let mut rebuilt = scenario_grid();
        rebuilt.add_block_point(DVec3::new(0.2, 2.9, 0.2), 0.6).unwrap();
        let id2 = rebuilt.add_block_point(start, 0.8).unwrap();
        let removed = rebuilt.remove_block_point(id2).unwrap();
        rebuilt.add_block_point(end, removed.density).unwrap();

        assert_eq!(snapshot(&moved), snapshot(&rebuilt));
        assert_eq!(moved.block_point(id).unwrap().location, end);
    }

    #[test]
    fn test_move_within_cell_updates_location_only() {
        let mut grid = scenario_grid();
        let id = grid.add_block_point(DVec3::new(0.01, 2.01, 0.01), 1.0).unwrap();
        let before = snapshot(&grid);

        grid.move_block_point(id, DVec3::new(0.2, 2.2, 0.2)).unwrap();
        assert_eq!(snapshot(&grid), before);
        assert_eq!(grid.block_point(id).unwrap().location, DVec3::new(0.2, 2.2, 0.2));
    }

    #[test]
    fn test_move_out_of_range_fails_without_change() {
        let mut grid = scenario_grid();
        let id = grid.add_block_point(DVec3::new(0.0, 2.0, 0.0), 1.0).unwrap();
        let before = snapshot(&grid);

        assert!(grid.move_block_point(id, DVec3::new(0.0, 20.0, 0.0)).is_err());
        assert_eq!(snapshot(&grid), before);
        assert_eq!(grid.block_point(id).unwrap().location, DVec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_blockage_radially_symmetric() {
        let mut grid = OcclusionGrid::new(GridConfig::cube(3.25, 0.25, 1.0, FRAC_PI_4, 0.5)).unwrap();
        let top = grid.element_counts().y - 1;
        // 13 elements per axis: cell 6 is centered on the vertical axis.
        let source = grid.unit(IVec3::new(6, top, 6)).unwrap().center();
        grid.add_block_point(source, 1.0).unwrap();

        for (cell, unit) in grid.units() {
            let d = cell - IVec3::new(6, 0, 6);
            let mirrors = [
                IVec3::new(-d.x, d.y, d.z),
                IVec3::new(d.x, d.y, -d.z),
                IVec3::new(d.z, d.y, d.x),
                IVec3::new(-d.z, d.y, -d.x),
            ];
            for m in mirrors {
                let other = grid.unit(m + IVec3::new(6, 0, 6)).unwrap();
                assert!(
                    (unit.blockage() - other.blockage()).abs() < 1e-9,
                    "{cell} vs {}",
                    m + IVec3::new(6, 0, 6)
                );
            }
        }
    }

    #[test]
    fn test_normalized_blockage_bounded() {
        let mut grid = scenario_grid();
        let counts = grid.element_counts();
        // Saturate the whole top two layers.
        for y in [counts.y - 1, counts.y - 2] {
            for z in 0..counts.z {
                for x in 0..counts.x {
                    let center = grid.unit(IVec3::new(x, y, z)).unwrap().center();
                    grid.add_block_point(center, 1.0).unwrap();
                }
            }
        }

        for (_, unit) in grid.units() {
            let sample = grid.direction_and_blockage(unit.center()).unwrap();
            assert!(sample.blockage >= 0.0);
            assert!(sample.blockage <= 1.0 + 1e-9);
            assert!(unit.light_direction().mag() <= grid.kernel().max_light().mag() + 1e-9);
        }
    }

    #[test]
    fn test_units_affected_by_clips_to_grid() {
        let grid = scenario_grid();
        let top_center = IVec3::new(6, 11, 6);
        let affected: Vec<_> = grid.units_affected_by(top_center).collect();
        assert_eq!(affected.len(), grid.kernel().len());

        let bottom = IVec3::new(6, 0, 6);
        assert_eq!(grid.units_affected_by(bottom).count(), 0);
    }
}
