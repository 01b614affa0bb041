//! Phototropism - light-seeking branch growth
//!
//! An occlusion grid tracks how obstructions shade the volume beneath them
//! and answers "which way is the light, and how blocked is it" at any point.
//! A segment graph describes a branching skeleton, and the mesh module skins
//! each branch into a closed polygon mesh with texture coordinates.

pub mod core;
pub mod math;
pub mod occlusion;
pub mod skeleton;
pub mod mesh;
pub mod growth;
