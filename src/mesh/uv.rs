//! Per-corner texture coordinates for branch meshes.
//!
//! U wraps once around the branch: each side of a ring gets an equal slice,
//! running from 1 down toward 0. V grows with distance along the branch,
//! scaled so a texel covers the same world distance in both directions at
//! the branch's base radius. V is tracked per vertex, so a face's upper
//! corners take the V of the corner below plus the edge length between them.

use crate::core::types::Point;
use crate::math::constants::TAU;
use crate::math::vector::distance;

/// Compute U and V for every face corner, in `face_connects` order.
pub fn corner_uvs(
    sides: u32,
    initial_radius: f64,
    vertices: &[Point],
    face_counts: &[u32],
    face_connects: &[u32],
) -> (Vec<f64>, Vec<f64>) {
    let ring = sides as usize;
    let faces_per_ring = if sides == 2 { 1 } else { ring };
    let uv_face_width = 1.0 / faces_per_ring as f64;
    let scaler = v_scaler(sides, initial_radius, uv_face_width);

    // Ring vertices only; the cap vertex is last and gets no V of its own.
    let ring_vertex_count = vertices.len().saturating_sub(1);
    let mut vertex_v = vec![0.0; ring_vertex_count];
    for i in ring..ring_vertex_count {
        vertex_v[i] = vertex_v[i - ring] + distance(vertices[i - ring], vertices[i]) * scaler;
    }

    let mut us = Vec::with_capacity(face_connects.len());
    let mut vs = Vec::with_capacity(face_connects.len());
    let mut cursor = 0;
    let mut side = 0;

    for &count in face_counts {
        let corners = &face_connects[cursor..cursor + count as usize];
        let u_left = 1.0 - side as f64 * uv_face_width;
        let u_right = 1.0 - (side + 1) as f64 * uv_face_width;

        if count == 4 {
            us.extend_from_slice(&[u_left, u_right, u_right, u_left]);
            vs.extend(corners.iter().map(|&c| vertex_v[c as usize]));
        } else {
            let (a, b, cap) = (corners[0] as usize, corners[1] as usize, corners[2] as usize);
            us.extend_from_slice(&[u_left, u_right, u_right + uv_face_width * 0.5]);
            vs.extend_from_slice(&[
                vertex_v[a],
                vertex_v[b],
                vertex_v[b] + distance(vertices[b], vertices[cap]) * scaler,
            ]);
        }

        cursor += count as usize;
        side = (side + 1) % faces_per_ring;
    }

    (us, vs)
}

/// World-to-V scale: UV width of one face over the base ring's chord length.
fn v_scaler(sides: u32, radius: f64, uv_face_width: f64) -> f64 {
    let wedge = TAU / sides as f64;
    let r2 = radius * radius;
    let base_face_width = (2.0 * r2 - 2.0 * r2 * wedge.cos()).max(0.0).sqrt();
    if base_face_width == 0.0 {
        log::warn!("Branch mesh has zero base radius; V coordinates collapse to 0");
        return 0.0;
    }
    uv_face_width / base_face_width
}
