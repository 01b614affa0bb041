//! Error types for the phototropism crate

use glam::DVec3;
use thiserror::Error;

use crate::occlusion::BlockPointId;
use crate::skeleton::SegmentId;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Grid or branch configuration that cannot produce a usable structure
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A location that maps outside the grid
    #[error("Location {0} is outside the grid")]
    OutOfRange(DVec3),

    #[error("Block point density {0} is outside [0, 1]")]
    InvalidDensity(f64),

    #[error("Unknown block point {0:?}")]
    UnknownBlockPoint(BlockPointId),

    #[error("Unknown segment {0:?}")]
    UnknownSegment(SegmentId),

    #[error("A branch mesh needs at least 2 sides, got {0}")]
    InvalidSides(u32),

    /// Resize or normalize requested on a zero-length vector
    #[error("Cannot resize a zero-length vector")]
    DegenerateVector,

    #[error("Malformed mesh data: {0}")]
    Mesh(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
