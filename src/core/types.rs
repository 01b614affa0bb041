//! Core type aliases and re-exports

pub use glam::{DMat3, DVec3, IVec3};

/// A position in world space
pub type Point = DVec3;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
