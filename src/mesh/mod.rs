//! Branch skin meshing
//!
//! Turns same-branch segment chains into closed polygon meshes with UVs and
//! hands them to a [`MeshSink`].

pub mod branch_mesh;
pub mod sink;
pub mod uv;

pub use branch_mesh::{build_branch_meshes, BranchMesh, DIVIDER_RADIUS_RATIO};
pub use sink::{MemorySink, MeshData, MeshSink, ObjSink, RecordedMesh};
