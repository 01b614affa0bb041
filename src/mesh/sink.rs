//! Destinations for finished meshes.
//!
//! A [`MeshSink`] receives a mesh as flat polygon lists (vertex positions,
//! per-face corner counts, corner vertex indices and optional per-corner UVs)
//! and may then attach a name to the created object.

use std::io::Write;

use crate::core::error::Error;
use crate::core::types::{Point, Result};

/// Borrowed polygon mesh in flat-list form.
#[derive(Debug, Clone, Copy)]
pub struct MeshData<'a> {
    pub vertices: &'a [Point],
    /// Corners per face
    pub face_counts: &'a [u32],
    /// Vertex index of each corner, faces back to back
    pub face_connects: &'a [u32],
    /// Per-corner U and V lists
    pub uvs: Option<(&'a [f64], &'a [f64])>,
}

impl MeshData<'_> {
    /// Check that counts, connects and UVs agree with each other.
    pub fn validate(&self) -> Result<()> {
        let corners: u64 = self.face_counts.iter().map(|&c| c as u64).sum();
        if corners != self.face_connects.len() as u64 {
            return Err(Error::Mesh(format!(
                "face counts sum to {corners} but there are {} corners",
                self.face_connects.len()
            )));
        }
        if let Some(&count) = self.face_counts.iter().find(|&&c| c < 3) {
            return Err(Error::Mesh(format!("face with {count} corners")));
        }
        if let Some(&index) = self
            .face_connects
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(Error::Mesh(format!(
                "corner refers to vertex {index} of {}",
                self.vertices.len()
            )));
        }
        if let Some((us, vs)) = self.uvs {
            if us.len() != self.face_connects.len() || vs.len() != self.face_connects.len() {
                return Err(Error::Mesh(format!(
                    "{} U and {} V values for {} corners",
                    us.len(),
                    vs.len(),
                    self.face_connects.len()
                )));
            }
        }
        Ok(())
    }
}

/// Receiver of finished meshes.
pub trait MeshSink {
    /// Reference to a created mesh object
    type Handle;

    fn create_mesh(&mut self, mesh: &MeshData<'_>) -> Result<Self::Handle>;

    /// Attach a display name to a created object. Ignored by default.
    fn name_object(&mut self, handle: &Self::Handle, name: &str) {
        let _ = (handle, name);
    }
}

/// Owned copy of a submitted mesh.
#[derive(Debug, Clone, Default)]
pub struct RecordedMesh {
    pub name: Option<String>,
    pub vertices: Vec<Point>,
    pub face_counts: Vec<u32>,
    pub face_connects: Vec<u32>,
    pub us: Vec<f64>,
    pub vs: Vec<f64>,
}

impl RecordedMesh {
    fn from_data(mesh: &MeshData<'_>) -> Self {
        let (us, vs) = mesh
            .uvs
            .map(|(us, vs)| (us.to_vec(), vs.to_vec()))
            .unwrap_or_default();
        Self {
            name: None,
            vertices: mesh.vertices.to_vec(),
            face_counts: mesh.face_counts.to_vec(),
            face_connects: mesh.face_connects.to_vec(),
            us,
            vs,
        }
    }

    fn has_uvs(&self) -> bool {
        !self.us.is_empty()
    }
}

/// Sink that keeps every mesh in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    meshes: Vec<RecordedMesh>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes(&self) -> &[RecordedMesh] {
        &self.meshes
    }

    pub fn into_meshes(self) -> Vec<RecordedMesh> {
        self.meshes
    }
}

impl MeshSink for MemorySink {
    type Handle = usize;

    fn create_mesh(&mut self, mesh: &MeshData<'_>) -> Result<usize> {
        mesh.validate()?;
        self.meshes.push(RecordedMesh::from_data(mesh));
        Ok(self.meshes.len() - 1)
    }

    fn name_object(&mut self, handle: &usize, name: &str) {
        if let Some(mesh) = self.meshes.get_mut(*handle) {
            mesh.name = Some(name.to_string());
        }
    }
}

/// Sink that writes Wavefront OBJ text.
///
/// Names arrive after geometry, so meshes are buffered and written by
/// [`ObjSink::finish`]. Each corner gets its own `vt` entry.
pub struct ObjSink<W: Write> {
    writer: W,
    meshes: Vec<RecordedMesh>,
}

impl<W: Write> ObjSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, meshes: Vec::new() }
    }

    /// Write every buffered mesh and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.writer, "# phototropism branch meshes")?;

        let mut vertex_base = 1usize;
        let mut uv_base = 1usize;
        for (i, mesh) in self.meshes.iter().enumerate() {
            match &mesh.name {
                Some(name) => writeln!(self.writer, "o {name}")?,
                None => writeln!(self.writer, "o mesh_{i}")?,
            }

            for v in &mesh.vertices {
                writeln!(self.writer, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
            }
            if mesh.has_uvs() {
                for (u, v) in mesh.us.iter().zip(&mesh.vs) {
                    writeln!(self.writer, "vt {u:.6} {v:.6}")?;
                }
            }

            let mut corner = 0usize;
            for &count in &mesh.face_counts {
                write!(self.writer, "f")?;
                for k in 0..count as usize {
                    let vertex = mesh.face_connects[corner + k] as usize + vertex_base;
                    if mesh.has_uvs() {
                        write!(self.writer, " {vertex}/{}", corner + k + uv_base)?;
                    } else {
                        write!(self.writer, " {vertex}")?;
                    }
                }
                writeln!(self.writer)?;
                corner += count as usize;
            }

            vertex_base += mesh.vertices.len();
            if mesh.has_uvs() {
                uv_base += mesh.face_connects.len();
            }
        }

        self.writer.flush()?;
        log::info!("Wrote {} meshes as OBJ", self.meshes.len());
        Ok(self.writer)
    }
}

impl<W: Write> MeshSink for ObjSink<W> {
    type Handle = usize;

    fn create_mesh(&mut self, mesh: &MeshData<'_>) -> Result<usize> {
        mesh.validate()?;
        self.meshes.push(RecordedMesh::from_data(mesh));
        Ok(self.meshes.len() - 1)
    }

    fn name_object(&mut self, handle: &usize, name: &str) {
        if let Some(mesh) = self.meshes.get_mut(*handle) {
            mesh.name = Some(name.to_string());
        }
    }
}
