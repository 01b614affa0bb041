//! Vector math and geometric primitives

pub mod aabb;
pub mod angles;
pub mod constants;
pub mod frame;
pub mod vector;

pub use aabb::Aabb;
pub use angles::SphericalAngles;
pub use frame::OrientedFrame;
pub use vector::{angle_between, distance, Vector};
