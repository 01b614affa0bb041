//! Branching skeleton of connected segments

pub mod graph;
pub mod segment;

pub use graph::SegmentGraph;
pub use segment::{BranchId, BranchInfo, Segment, SegmentId};
