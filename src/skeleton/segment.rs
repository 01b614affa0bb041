//! Segment and branch records.

use crate::core::types::Point;
use crate::math::vector::Vector;

/// Handle to a segment inside a [`super::SegmentGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u32);

/// Handle to the shared per-branch record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub u32);

/// Per-branch metadata shared by every segment of the branch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchInfo {
    /// Extra width added around a lateral branch where it leaves its parent
    pub skin_thickness: f64,
    /// Polygon sides of the branch's mesh; 2 makes a flat ribbon
    pub sides: u32,
}

impl BranchInfo {
    pub fn new(skin_thickness: f64, sides: u32) -> Self {
        Self { skin_thickness, sides }
    }
}

/// One cylindrical piece of a branch.
#[derive(Clone, Debug)]
pub struct Segment {
    pub(crate) vector: Vector,
    pub(crate) start: Point,
    pub(crate) radius: f64,
    pub(crate) branch: BranchId,
    /// Segments starting at this one's end point
    pub(crate) above: Vec<SegmentId>,
    /// Segments starting partway along this one
    pub(crate) lateral: Vec<SegmentId>,
}

impl Segment {
    pub fn vector(&self) -> Vector {
        self.vector
    }

    pub fn length(&self) -> f64 {
        self.vector.mag()
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.start + self.vector
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn above(&self) -> &[SegmentId] {
        &self.above
    }

    pub fn lateral(&self) -> &[SegmentId] {
        &self.lateral
    }

    /// Lateral segments followed by segments above.
    pub fn connected_upper(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.lateral.iter().chain(self.above.iter()).copied()
    }
}
