//! Segment arena.
//!
//! The graph owns every segment and branch record; everything else refers to
//! them by handle. Same-branch links through `above` must be acyclic.

use crate::core::error::Error;
use crate::core::types::{Point, Result};
use crate::math::vector::Vector;

use super::segment::{BranchId, BranchInfo, Segment, SegmentId};

/// Tree of segments addressed by stable handles.
#[derive(Clone, Debug, Default)]
pub struct SegmentGraph {
    segments: Vec<Segment>,
    branches: Vec<BranchInfo>,
}

impl SegmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Register a branch record.
    pub fn add_branch(&mut self, info: BranchInfo) -> BranchId {
        let id = BranchId(self.branches.len() as u32);
        self.branches.push(info);
        id
    }

    /// Add an unlinked segment (typically a root).
    pub fn add_segment(&mut self, start: Point, vector: Vector, radius: f64, branch: BranchId) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        self.segments.push(Segment {
            vector,
            start,
            radius,
            branch,
            above: Vec::new(),
            lateral: Vec::new(),
        });
        id
    }

    /// Add a segment starting at `parent`'s end and link it above `parent`.
    pub fn add_segment_above(
        &mut self,
        parent: SegmentId,
        vector: Vector,
        radius: f64,
        branch: BranchId,
    ) -> Result<SegmentId> {
        let start = self.segment(parent)?.end();
        let id = self.add_segment(start, vector, radius, branch);
        self.link_above(parent, id)?;
        Ok(id)
    }

    /// Add a segment starting at `start` (somewhere along `parent`) and link it as lateral.
    pub fn add_lateral_segment(
        &mut self,
        parent: SegmentId,
        start: Point,
        vector: Vector,
        radius: f64,
        branch: BranchId,
    ) -> Result<SegmentId> {
        self.segment(parent)?;
        let id = self.add_segment(start, vector, radius, branch);
        self.link_lateral(parent, id)?;
        Ok(id)
    }

    pub fn link_above(&mut self, parent: SegmentId, child: SegmentId) -> Result<()> {
        self.segment(child)?;
        self.segment_mut(parent)?.above.push(child);
        Ok(())
    }

    pub fn link_lateral(&mut self, parent: SegmentId, child: SegmentId) -> Result<()> {
        self.segment(child)?;
        self.segment_mut(parent)?.lateral.push(child);
        Ok(())
    }

    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.segments.get(id.0 as usize).ok_or(Error::UnknownSegment(id))
    }

    fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment> {
        self.segments.get_mut(id.0 as usize).ok_or(Error::UnknownSegment(id))
    }

    pub fn branch(&self, id: BranchId) -> Option<&BranchInfo> {
        self.branches.get(id.0 as usize)
    }

    /// Branch record of a segment.
    pub fn branch_of(&self, id: SegmentId) -> Result<&BranchInfo> {
        let branch = self.segment(id)?.branch;
        self.branch(branch)
            .ok_or_else(|| Error::Config(format!("segment {id:?} refers to unknown branch {branch:?}")))
    }

    /// First segment above `id` on the same branch.
    pub fn next_on_path(&self, id: SegmentId) -> Result<Option<SegmentId>> {
        let segment = self.segment(id)?;
        for &above in &segment.above {
            if self.segment(above)?.branch == segment.branch {
                return Ok(Some(above));
            }
        }
        Ok(None)
    }

    /// Connected upper segments that begin a different branch.
    pub fn fork_starts(&self, id: SegmentId) -> Result<Vec<SegmentId>> {
        let segment = self.segment(id)?;
        let mut forks = Vec::new();
        for upper in segment.connected_upper() {
            if self.segment(upper)?.branch != segment.branch {
                forks.push(upper);
            }
        }
        Ok(forks)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (SegmentId(i as u32), s))
    }
}
