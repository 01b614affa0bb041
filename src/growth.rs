//! Light-seeking branch growth.
//!
//! Each step samples the occlusion grid at the branch tip, bends the current
//! heading toward the light by a fixed weight and appends one segment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Point, Result};
use crate::math::vector::Vector;
use crate::occlusion::OcclusionGrid;
use crate::skeleton::{BranchId, SegmentGraph, SegmentId};

/// Growth tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Length of every new segment.
    pub segment_length: f64,
    /// Radius of the first segment.
    pub base_radius: f64,
    /// Radius multiplier applied after each step.
    pub taper: f64,
    /// Radius never shrinks below this.
    pub min_radius: f64,
    /// Maximum number of segments to add.
    pub steps: u32,
    /// How strongly the heading turns toward the light each step, `0..=1`.
    pub light_weight: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            segment_length: 0.25,
            base_radius: 0.08,
            taper: 0.9,
            min_radius: 0.01,
            steps: 12,
            light_weight: 0.35,
        }
    }
}

impl GrowthParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            return Err(Error::Config(format!("segment length must be positive, got {}", self.segment_length)));
        }
        if !(self.base_radius > 0.0 && self.min_radius > 0.0 && self.min_radius <= self.base_radius) {
            return Err(Error::Config(format!(
                "radii must satisfy 0 < min ({}) <= base ({})",
                self.min_radius, self.base_radius
            )));
        }
        if !(self.taper > 0.0 && self.taper <= 1.0) {
            return Err(Error::Config(format!("taper must be in (0, 1], got {}", self.taper)));
        }
        if !(0.0..=1.0).contains(&self.light_weight) {
            return Err(Error::Config(format!("light weight must be in [0, 1], got {}", self.light_weight)));
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
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}

/// Where a new branch joins the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attachment {
    /// Free-standing root at a point.
    Root(Point),
    /// Continue from the end of an existing segment.
    Above(SegmentId),
    /// Leave an existing segment partway along it.
    Lateral { parent: SegmentId, at: Point },
}

/// Grow `branch` from `attachment`, starting along `direction`.
///
/// Stops after `params.steps` segments or as soon as the tip leaves the
/// grid. Returns the new segments in order from base to tip.
pub fn grow_branch(
    grid: &OcclusionGrid,
    graph: &mut SegmentGraph,
    branch: BranchId,
    attachment: Attachment,
    direction: Vector,
    params: &GrowthParams,
) -> Result<Vec<SegmentId>> {
    params.validate()?;
    let mut heading = direction.normalized()?;
    let mut radius = params.base_radius;
    let mut tip = match attachment {
        Attachment::Root(point) | Attachment::Lateral { at: point, .. } => point,
        Attachment::Above(parent) => graph.segment(parent)?.end(),
    };

    let mut grown: Vec<SegmentId> = Vec::with_capacity(params.steps as usize);
    for _ in 0..params.steps {
        let sample = match grid.direction_and_blockage(tip) {
            Ok(sample) => sample,
            Err(Error::OutOfRange(_)) => {
                log::debug!("Branch {:?} tip left the grid at {} after {} segments", branch, tip, grown.len());
                break;
            }
            Err(e) => return Err(e),
        };

        let light = Vector::from_dvec3(sample.direction);
        let blended = heading * (1.0 - params.light_weight) + light * params.light_weight;
        if !blended.is_zero() {
            heading = blended.normalized()?;
        }
        let vector = heading.resized(params.segment_length)?;

        let id = match (grown.last(), attachment) {
            (Some(&previous), _) => graph.add_segment_above(previous, vector, radius, branch)?,
            (None, Attachment::Root(point)) => graph.add_segment(point, vector, radius, branch),
            (None, Attachment::Above(parent)) => graph.add_segment_above(parent, vector, radius, branch)?,
            (None, Attachment::Lateral { parent, at }) => {
                graph.add_lateral_segment(parent, at, vector, radius, branch)?
            }
        };
        grown.push(id);

        tip = graph.segment(id)?.end();
        radius = (radius * params.taper).max(params.min_radius);
    }

    Ok(grown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DVec3;
    use crate::occlusion::GridConfig;
    use crate::skeleton::BranchInfo;

    fn setup() -> (OcclusionGrid, SegmentGraph, BranchId) {
        let grid = OcclusionGrid::new(GridConfig::default()).unwrap();
        let mut graph = SegmentGraph::new();
        let branch = graph.add_branch(BranchInfo::new(0.01, 6));
        (grid, graph, branch)
    }

    #[test]
    fn test_open_sky_grows_straight_up() {
        let (grid, mut graph, branch) = setup();
        let params = GrowthParams { steps: 4, ..Default::default() };
        let ids = grow_branch(
            &grid,
            &mut graph,
            branch,
            Attachment::Root(DVec3::new(0.0, 0.1, 0.0)),
            Vector::new(0.0, 1.0, 0.0),
            &params,
        )
        .unwrap();

        assert_eq!(ids.len(), 4);
        let mut previous_radius = f64::INFINITY;
        for (i, id) in ids.iter().enumerate() {
            let segment = graph.segment(*id).unwrap();
            assert!(segment.vector().x().abs() < 1e-9 && segment.vector().z().abs() < 1e-9);
            assert!((segment.start().y - (0.1 + 0.25 * i as f64)).abs() < 1e-9);
            assert!(segment.radius() <= previous_radius);
            previous_radius = segment.radius();
        }
        for pair in ids.windows(2) {
            assert_eq!(graph.next_on_path(pair[0]).unwrap(), Some(pair[1]));
        }
    }

    #[test]
    fn test_stops_when_tip_leaves_grid() {
        crate::core::logging::init_test();
        let (grid, mut graph, branch) = setup();
        let params = GrowthParams { steps: 50, ..Default::default() };
        let ids = grow_branch(
            &grid,
            &mut graph,
            branch,
            Attachment::Root(DVec3::new(0.0, 0.1, 0.0)),
            Vector::new(0.0, 1.0, 0.0),
            &params,
        )
        .unwrap();
        // Tips at 0.1, 0.35, ... 3.1 are inside the 3.25 high grid.
        assert_eq!(ids.len(), 13);
    }

    #[test]
    fn test_bends_away_from_canopy() {
        let (mut grid, mut graph, branch) = setup();
        for x in [0.5, 0.75, 1.0] {
            for z in [-0.25, 0.0, 0.25] {
                grid.add_block_point(DVec3::new(x, 2.5, z), 1.0).unwrap();
            }
        }

        let params = GrowthParams { steps: 6, light_weight: 0.5, ..Default::default() };
        let ids = grow_branch(
            &grid,
            &mut graph,
            branch,
            Attachment::Root(DVec3::new(0.0, 0.1, 0.0)),
            Vector::new(0.0, 1.0, 0.0),
            &params,
        )
        .unwrap();

        let tip = graph.segment(*ids.last().unwrap()).unwrap().end();
        assert!(tip.x < 0.0, "tip {tip} should lean away from the canopy");
    }

    #[test]
    fn test_lateral_attachment() {
        let (grid, mut graph, branch) = setup();
        let limb = graph.add_branch(BranchInfo::new(0.01, 4));
        let trunk = grow_branch(
            &grid,
            &mut graph,
            branch,
            Attachment::Root(DVec3::new(0.0, 0.1, 0.0)),
            Vector::new(0.0, 1.0, 0.0),
            &GrowthParams { steps: 3, ..Default::default() },
        )
        .unwrap();

        let at = graph.segment(trunk[1]).unwrap().start() + DVec3::new(0.0, 0.1, 0.0);
        let limb_ids = grow_branch(
            &grid,
            &mut graph,
            limb,
            Attachment::Lateral { parent: trunk[1], at },
            Vector::new(1.0, 0.5, 0.0),
            &GrowthParams { steps: 2, base_radius: 0.03, ..Default::default() },
        )
        .unwrap();

        assert_eq!(limb_ids.len(), 2);
        assert_eq!(graph.fork_starts(trunk[1]).unwrap(), vec![limb_ids[0]]);
        assert_eq!(graph.next_on_path(limb_ids[0]).unwrap(), Some(limb_ids[1]));
    }

    #[test]
    fn test_invalid_params() {
        let (grid, mut graph, branch) = setup();
        let params = GrowthParams { light_weight: 1.5, ..Default::default() };
        let result = grow_branch(
            &grid,
            &mut graph,
            branch,
            Attachment::Root(DVec3::ZERO),
            Vector::new(0.0, 1.0, 0.0),
            &params,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_params_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.json");
        let params = GrowthParams { steps: 7, light_weight: 0.6, ..Default::default() };
        params.save_sync(&path).unwrap();
        assert_eq!(GrowthParams::load_sync(&path).unwrap(), params);
    }
}
