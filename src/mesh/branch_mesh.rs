//! Skinning a chain of same-branch segments into a polygon mesh.
//!
//! The mesh is a stack of vertex rings, `sides` vertices each, one ring per
//! segment boundary. Consecutive rings are joined by quads and the last ring
//! is closed with a fan of triangles to a single cap vertex. Where the
//! branch narrows sharply a thin "divider" collar ring is inserted so the
//! skin does not pinch around laterals leaving at that joint.
//!
//! When two segments meet at an angle each vertex of the joint ring is slid
//! along the current segment by a per-side "pre-adjust" so the ring lies
//! flush with the joint. The same amounts are carried into the next step so
//! the following ring starts from the mitred position.

use std::collections::VecDeque;

use crate::core::error::Error;
use crate::core::types::{DVec3, Point, Result};
use crate::math::aabb::Aabb;
use crate::math::constants::{ANGLE_EPSILON, FRAC_PI_2, PI, TAU};
use crate::math::frame::OrientedFrame;
use crate::math::vector::Vector;
use crate::skeleton::{Segment, SegmentGraph, SegmentId};

use super::sink::{MeshData, MeshSink};
use super::uv;

/// A divider is inserted when the radius shrinks by more than this ratio.
pub const DIVIDER_RADIUS_RATIO: f64 = 1.15;

/// Vertex, face and UV lists for one branch.
#[derive(Debug, Clone)]
pub struct BranchMesh {
    sides: u32,
    initial_radius: f64,
    first_segment: SegmentId,
    vertices: Vec<Point>,
    face_counts: Vec<u32>,
    face_connects: Vec<u32>,
    us: Vec<f64>,
    vs: Vec<f64>,
}

impl BranchMesh {
    /// Start a mesh with its first ring around `first`'s start point.
    pub fn new(graph: &SegmentGraph, first: SegmentId, sides: u32) -> Result<Self> {
        if sides < 2 {
            return Err(Error::InvalidSides(sides));
        }
        let segment = graph.segment(first)?;
        let radius = segment.radius();
        let mut vertices = Vec::with_capacity(sides as usize * 2 + 1);

        if sides > 2 {
            let frame = OrientedFrame::along(&segment.vector());
            let polar_increment = TAU / sides as f64;
            let mut polar = 0.0;
            for _ in 0..sides {
                vertices.push(segment.start() + frame.make_vector(polar, FRAC_PI_2, radius));
                polar -= polar_increment;
            }
        } else {
            // Flat ribbon: the two vertices sit horizontally across the segment.
            let mut polar = segment.vector().angles().polar + FRAC_PI_2;
            for _ in 0..2 {
                vertices.push(segment.start() + DVec3::new(radius * polar.cos(), 0.0, radius * polar.sin()));
                polar -= PI;
            }
        }

        Ok(Self {
            sides,
            initial_radius: radius,
            first_segment: first,
            vertices,
            face_counts: Vec::new(),
            face_connects: Vec::new(),
            us: Vec::new(),
            vs: Vec::new(),
        })
    }

    /// Build the whole mesh for the branch starting at `first`.
    ///
    /// Segments that start a different branch anywhere along the way are
    /// pushed onto `forks` for the caller to build separately.
    pub fn build(graph: &SegmentGraph, first: SegmentId, forks: &mut VecDeque<SegmentId>) -> Result<Self> {
        let sides = graph.branch_of(first)?.sides;
        let mut mesh = Self::new(graph, first, sides)?;
        mesh.extend_along(graph, forks)?;
        mesh.calculate_uvs();

        log::debug!(
            "Branch mesh from {:?}: {} vertices, {} faces",
            first,
            mesh.vertices.len(),
            mesh.face_counts.len()
        );
        Ok(mesh)
    }

    /// Walk the same-branch chain from the first segment until it ends.
    fn extend_along(&mut self, graph: &SegmentGraph, forks: &mut VecDeque<SegmentId>) -> Result<()> {
        let mut current_id = self.first_segment;
        let mut preadjusts = vec![0.0; self.ring_size()];

        loop {
            forks.extend(graph.fork_starts(current_id)?);
            let current = graph.segment(current_id)?;

            let Some(next_id) = graph.next_on_path(current_id)? else {
                self.complete_path(current, &preadjusts);
                return Ok(());
            };
            let next = graph.segment(next_id)?;

            let half_divider_width = self.find_divider(graph, current.radius(), next)?;
            let ring_to_add_to = self.ring_to_add_to(
                current.radius() - next.radius(),
                current.start(),
                half_divider_width,
            );
            let mut next_preadjusts = self.create_next_ring(current, next, &preadjusts, &ring_to_add_to);
            self.add_ring_faces();

            if half_divider_width > 0.0 {
                self.create_divider_ring(half_divider_width, current, next, &next_preadjusts);
                self.add_ring_faces();
                // The divider ring already absorbed the adjustments.
                next_preadjusts.fill(-half_divider_width);
            }

            preadjusts = next_preadjusts;
            current_id = next_id;
        }
    }

    /// Half-width of the divider above `current`, or 0 when none is needed.
    fn find_divider(&self, graph: &SegmentGraph, current_radius: f64, next: &Segment) -> Result<f64> {
        if current_radius <= next.radius() * DIVIDER_RADIUS_RATIO {
            return Ok(0.0);
        }

        let mut largest = 0.0_f64;
        for &lateral_id in next.lateral() {
            let lateral = graph.segment(lateral_id)?;
            let skin_thickness = graph.branch_of(lateral_id)?.skin_thickness;
            largest = largest.max(lateral.radius() + skin_thickness);
        }

        if largest == 0.0 || largest >= next.length() {
            log::warn!("Creating divider with implausible width {largest}");
        }
        Ok(largest)
    }

    /// Base positions the next ring is grown from: the last ring itself when a
    /// divider follows, otherwise the last ring contracted by `radius_diff`.
    fn ring_to_add_to(&self, radius_diff: f64, center: Point, half_divider_width: f64) -> Vec<Point> {
        let last_ring = self.last_ring();
        if half_divider_width > 0.0 || radius_diff == 0.0 {
            return last_ring.to_vec();
        }
        last_ring
            .iter()
            .map(|&vertex| {
                vertex + Vector::between(vertex, center).resized_or_zero(radius_diff, "BranchMesh::ring_to_add_to")
            })
            .collect()
    }

    /// Push the ring at the top of `current` and return the adjustments for the next step.
    fn create_next_ring(
        &mut self,
        current: &Segment,
        next: &Segment,
        preadjusts: &[f64],
        ring_to_add_to: &[Point],
    ) -> Vec<f64> {
        const CONTEXT: &str = "BranchMesh::create_next_ring";
        let current_vector = current.vector();
        let current_length = current.length();

        let angle = current_vector.angle_between(&next.vector()).unwrap_or_else(|e| {
            log::warn!("{e} (in {CONTEXT}); treating segments as parallel");
            0.0
        });

        if angle.abs() <= ANGLE_EPSILON {
            let mut new_preadjusts = Vec::with_capacity(ring_to_add_to.len());
            for (base, pre) in ring_to_add_to.iter().zip(preadjusts) {
                self.vertices.push(*base + current_vector.resized_or_zero(current_length + pre, CONTEXT));
                new_preadjusts.push(0.0);
            }
            return new_preadjusts;
        }

        let radius = next.radius();
        let angle_out_90 = FRAC_PI_2 - angle;
        let sin_out_90 = angle_out_90.sin();

        // Locate the side of the joint the bend closes toward ("under") and
        // the opposite side ("behind").
        let large_opposite = sin_out_90 * next.length();
        let right_angle_point = next.end() - current_vector.resized_or_zero(large_opposite, CONTEXT);
        let current_end = current.end();
        let to_right_angle = Vector::between(current_end, right_angle_point).resized_or_zero(radius, CONTEXT);
        let point_under = current_end + to_right_angle;
        let point_behind = current_end - to_right_angle;
        let right_angle_vector = Vector::between(point_under, point_behind);

        let top_h = sin_out_90 * radius;
        let top_v = angle_out_90.cos() * radius;
        let bottom_v = angle_out_90.tan() * (radius - top_h);
        let max_adjust = bottom_v - top_v;

        if max_adjust.abs() >= current_length {
            log::warn!("Angle between segments is too sharp; miter adjustment {max_adjust} exceeds segment length");
        }

        let mut new_preadjusts = Vec::with_capacity(ring_to_add_to.len());
        for (base, pre) in ring_to_add_to.iter().zip(preadjusts) {
            // On the plane at the end of, and perpendicular to, the current segment.
            let on_plane = *base + current_vector.resized_or_zero(current_length + pre, CONTEXT);
            let to_under = Vector::between(point_under, on_plane);

            let mut adjust = max_adjust;
            if to_under.mag() > 0.0 {
                match right_angle_vector.angle_between(&to_under) {
                    Ok(a) => {
                        let along = a.cos() * to_under.mag();
                        adjust = (1.0 - along / radius) * max_adjust;
                    }
                    Err(e) => log::warn!("{e} (in {CONTEXT}); using full adjustment"),
                }
            }

            self.vertices.push(on_plane + current_vector.resized_or_zero(adjust, CONTEXT));
            new_preadjusts.push(adjust);
        }
        new_preadjusts
    }

    /// Push the collar ring at the start of `next` and slide the ring below it down.
    fn create_divider_ring(&mut self, half_width: f64, current: &Segment, next: &Segment, preadjusts: &[f64]) {
        const CONTEXT: &str = "BranchMesh::create_divider_ring";
        let top_first = self.vertices.len() - self.ring_size();
        let radius_diff = current.radius() - next.radius();

        for (s, pre) in preadjusts.iter().enumerate() {
            let top = self.vertices[top_first + s];
            let on_next_plane = top + next.vector().resized_or_zero(*pre, CONTEXT);
            let inward = Vector::between(on_next_plane, next.start()).resized_or_zero(radius_diff, CONTEXT);

            self.vertices
                .push(on_next_plane + inward + next.vector().resized_or_zero(half_width, CONTEXT));
            self.vertices[top_first + s] -= current.vector().resized_or_zero(half_width, CONTEXT);
        }
    }

    /// Close the mesh with a last ring and a cap vertex.
    fn complete_path(&mut self, last: &Segment, preadjusts: &[f64]) {
        const CONTEXT: &str = "BranchMesh::complete_path";
        let lower_first = self.vertices.len() - self.ring_size();
        let vector = last.vector();

        for (s, pre) in preadjusts.iter().enumerate() {
            let vertex = self.vertices[lower_first + s] + vector.resized_or_zero(vector.mag() + pre, CONTEXT);
            self.vertices.push(vertex);
        }
        self.add_ring_faces();

        let cap = last.end() + vector.resized_or_zero(last.radius(), CONTEXT);
        self.vertices.push(cap);
        self.add_cap_faces();
    }

    /// Quads between the last two rings, corners from lower-left counter-clockwise.
    fn add_ring_faces(&mut self) {
        let s = self.sides;
        let initial = (self.vertices.len() - 2 * self.ring_size()) as u32;

        if s > 2 {
            for i in 0..s - 1 {
                let v = initial + i;
                self.face_connects.extend_from_slice(&[v, v + 1, v + 1 + s, v + s]);
            }
            let last = initial + s - 1;
            self.face_connects.extend_from_slice(&[last, initial, initial + s, last + s]);
            self.face_counts.extend(std::iter::repeat(4).take(s as usize));
        } else {
            self.face_connects
                .extend_from_slice(&[initial, initial + 1, initial + 1 + s, initial + s]);
            self.face_counts.push(4);
        }
    }

    /// Triangles fanning from the last ring to the cap vertex.
    fn add_cap_faces(&mut self) {
        let s = self.sides;
        let cap = (self.vertices.len() - 1) as u32;
        let initial = cap - s;

        if s > 2 {
            for i in 0..s - 1 {
                let v = initial + i;
                self.face_connects.extend_from_slice(&[v, v + 1, cap]);
            }
            self.face_connects.extend_from_slice(&[initial + s - 1, initial, cap]);
            self.face_counts.extend(std::iter::repeat(3).take(s as usize));
        } else {
            self.face_connects.extend_from_slice(&[initial, initial + 1, cap]);
            self.face_counts.push(3);
        }
    }

    fn calculate_uvs(&mut self) {
        let (us, vs) = uv::corner_uvs(
            self.sides,
            self.initial_radius,
            &self.vertices,
            &self.face_counts,
            &self.face_connects,
        );
        self.us = us;
        self.vs = vs;
    }

    fn ring_size(&self) -> usize {
        self.sides as usize
    }

    fn last_ring(&self) -> &[Point] {
        &self.vertices[self.vertices.len() - self.ring_size()..]
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn first_segment(&self) -> SegmentId {
        self.first_segment
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Number of rings, not counting the cap vertex.
    pub fn ring_count(&self) -> usize {
        self.vertices.len() / self.ring_size()
    }

    pub fn face_counts(&self) -> &[u32] {
        &self.face_counts
    }

    pub fn face_connects(&self) -> &[u32] {
        &self.face_connects
    }

    pub fn us(&self) -> &[f64] {
        &self.us
    }

    pub fn vs(&self) -> &[f64] {
        &self.vs
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Borrowed view in the shape a mesh sink consumes.
    pub fn mesh_data(&self) -> MeshData<'_> {
        MeshData {
            vertices: &self.vertices,
            face_counts: &self.face_counts,
            face_connects: &self.face_connects,
            uvs: Some((&self.us, &self.vs)),
        }
    }

    /// Hand the finished mesh to `sink` and name it.
    pub fn submit<S: MeshSink>(&self, sink: &mut S, name: &str) -> Result<S::Handle> {
        let data = self.mesh_data();
        data.validate()?;
        let handle = sink.create_mesh(&data)?;
        sink.name_object(&handle, name);
        Ok(handle)
    }
}

/// Build a mesh for the branch at `root` and for every branch forking off it.
///
/// Meshes are returned in discovery order, `root`'s first.
pub fn build_branch_meshes(graph: &SegmentGraph, root: SegmentId) -> Result<Vec<BranchMesh>> {
    let mut queue = VecDeque::from([root]);
    let mut meshes = Vec::new();

    while let Some(first) = queue.pop_front() {
        meshes.push(BranchMesh::build(graph, first, &mut queue)?);
    }
    Ok(meshes)
}
