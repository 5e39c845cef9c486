//! Leaf set to GPU buffer data.
//!
//! Every leaf emits the same 6-point stencil: its three corners followed by its
//! three edge midpoints, triangulated into four sub-triangles. Midpoints carry
//! the two coarse corners they collapse onto so the vertex stage can morph
//! them toward the parent edge without access to the tree.

use bytemuck::{Pod, Zeroable};
use glam::{DMat4, DVec3};
use orbis_geodesic::LeafPatch;

use crate::LodDistanceTable;

/// Vertices emitted per leaf.
pub const VERTICES_PER_PATCH: usize = 6;

/// Indices emitted per leaf (four triangles).
pub const INDICES_PER_PATCH: usize = 12;

/// Stencil triangles as offsets into `[c0, c1, c2, m01, m12, m20]`.
const PATCH_TRIANGLES: [u32; INDICES_PER_PATCH] = [
    0, 3, 5, // c0, m01, m20
    3, 1, 4, // m01, c1, m12
    5, 4, 2, // m20, m12, c2
    3, 4, 5, // m01, m12, m20
];

/// One interleaved vertex of a patch stencil.
///
/// Positions are body-local and already scaled by the body radius.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PatchVertex {
    /// Body-local position.
    pub position: [f32; 3],
    /// Subdivision depth of the owning leaf.
    pub lod_level: f32,
    /// 1.0 for edge midpoints, 0.0 for corners.
    pub morph_flag: f32,
    /// Blend toward the coarse edge, in `[0, 1]`.
    pub morph_factor: f32,
    /// First coarse corner the vertex collapses onto.
    pub morph_start: [f32; 3],
    /// Second coarse corner the vertex collapses onto.
    pub morph_end: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<PatchVertex>() == 48);

/// Vertex and index data for one body's leaf set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffers {
    /// `leaf_count * 6` vertices.
    pub vertices: Vec<PatchVertex>,
    /// `leaf_count * 12` indices into `vertices`.
    pub indices: Vec<u32>,
}

impl GeometryBuffers {
    /// Number of leaves these buffers were built from.
    pub fn patch_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_PATCH
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no leaves were emitted.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Morph factor of a midpoint on a level-`level` leaf at `distance` from the camera.
///
/// 0 at the level's own split distance, 1 at the parent's. Root faces have no
/// coarser edge to collapse onto and never morph.
pub fn morph_factor(level: u8, distance: f64, lod_distances: &LodDistanceTable) -> f64 {
    if level == 0 {
        return 0.0;
    }
    match (lod_distances.get(level), lod_distances.get(level - 1)) {
        (Some(near), Some(far)) => smoothstep(near, far, distance),
        _ => 0.0,
    }
}

fn to_f32(v: DVec3) -> [f32; 3] {
    v.as_vec3().to_array()
}

/// Build the buffers for a leaf set.
///
/// `world_matrix` is the body's camera-relative transform and `camera_position`
/// is in the same space; both only feed the morph factors.
pub fn generate(
    leaves: &[LeafPatch],
    radius: f64,
    camera_position: DVec3,
    world_matrix: &DMat4,
    lod_distances: &LodDistanceTable,
) -> GeometryBuffers {
    let mut vertices = Vec::with_capacity(leaves.len() * VERTICES_PER_PATCH);
    let mut indices = Vec::with_capacity(leaves.len() * INDICES_PER_PATCH);

    for leaf in leaves {
        let base = vertices.len() as u32;
        let lod_level = f32::from(leaf.level);
        let corners = leaf.vertices.map(|v| v * radius);
        let midpoints = leaf.edge_midpoints().map(|v| v * radius);

        for corner in corners {
            let position = to_f32(corner);
            vertices.push(PatchVertex {
                position,
                lod_level,
                morph_flag: 0.0,
                morph_factor: 0.0,
                morph_start: position,
                morph_end: position,
            });
        }

        let edges = [(0, 1), (1, 2), (2, 0)];
        for (midpoint, (a, b)) in midpoints.into_iter().zip(edges) {
            let distance = world_matrix
                .transform_point3(midpoint)
                .distance(camera_position);
            vertices.push(PatchVertex {
                position: to_f32(midpoint),
                lod_level,
                morph_flag: 1.0,
                morph_factor: morph_factor(leaf.level, distance, lod_distances) as f32,
                morph_start: to_f32(corners[a]),
                morph_end: to_f32(corners[b]),
            });
        }

        indices.extend(PATCH_TRIANGLES.iter().map(|&offset| base + offset));
    }

    GeometryBuffers { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_geodesic::root_patches;

    fn table() -> LodDistanceTable {
        LodDistanceTable::from_distances((0..12).map(|l| 64.0 / f64::powi(2.0, l)).collect())
    }

    fn leaves(depth: u8) -> Vec<LeafPatch> {
        let mut out = Vec::new();
        let mut roots = root_patches();
        fn collect(p: &mut orbis_geodesic::Patch, depth: u8, out: &mut Vec<LeafPatch>) {
            if p.level() == depth {
                out.push(p.to_leaf());
            } else {
                for c in p.subdivide().iter_mut() {
                    collect(c, depth, out);
                }
            }
        }
        for r in roots.iter_mut() {
            collect(r, depth, &mut out);
        }
        out
    }

    /// Buffer sizes are exactly 6 and 12 per leaf and every index is in range.
    #[test]
    fn test_counts_and_index_bounds() {
        for depth in 0..3 {
            let leaves = leaves(depth);
            let buffers = generate(
                &leaves,
                2.0,
                DVec3::new(0.0, 0.0, 10.0),
                &DMat4::IDENTITY,
                &table(),
            );
            assert_eq!(buffers.vertex_count(), leaves.len() * 6);
            assert_eq!(buffers.index_count(), leaves.len() * 12);
            assert_eq!(buffers.patch_count(), leaves.len());
            let count = buffers.vertex_count() as u32;
            assert!(buffers.indices.iter().all(|&i| i < count), "index out of range");
        }
    }

    #[test]
    fn test_empty_leaf_set() {
        let buffers = generate(&[], 1.0, DVec3::ZERO, &DMat4::IDENTITY, &table());
        assert!(buffers.is_empty());
        assert!(buffers.index_bytes().is_empty());
    }

    #[test]
    fn test_positions_scaled_by_radius() {
        let buffers = generate(&leaves(1), 3.0, DVec3::ZERO, &DMat4::IDENTITY, &table());
        for v in &buffers.vertices {
            let len = glam::Vec3::from_array(v.position).length();
            assert!((len - 3.0).abs() < 1e-5, "vertex at radius {len}");
        }
    }

    /// Corners never morph; midpoints morph toward their own edge.
    #[test]
    fn test_morph_attributes() {
        let leaves = leaves(2);
        let buffers = generate(&leaves, 1.0, DVec3::new(0.0, 0.0, 3.0), &DMat4::IDENTITY, &table());
        for patch in buffers.vertices.chunks(6) {
            for corner in &patch[..3] {
                assert_eq!(corner.morph_flag, 0.0);
                assert_eq!(corner.morph_factor, 0.0);
                assert_eq!(corner.morph_start, corner.position);
            }
            for (i, mid) in patch[3..].iter().enumerate() {
                assert_eq!(mid.morph_flag, 1.0);
                assert!((0.0..=1.0).contains(&mid.morph_factor));
                assert_eq!(mid.morph_start, patch[i].position);
                assert_eq!(mid.morph_end, patch[(i + 1) % 3].position);
            }
        }
    }

    #[test]
    fn test_root_faces_never_morph() {
        let buffers = generate(&leaves(0), 1.0, DVec3::new(0.0, 0.0, 1.5), &DMat4::IDENTITY, &table());
        assert!(buffers.vertices.iter().all(|v| v.morph_factor == 0.0));
    }

    #[test]
    fn test_morph_factor_ramps_between_levels() {
        let t = table();
        // Level 3 splits below 8, its parent below 16.
        assert_eq!(morph_factor(3, 4.0, &t), 0.0);
        assert_eq!(morph_factor(3, 20.0, &t), 1.0);
        let mid = morph_factor(3, 12.0, &t);
        assert!((mid - 0.5).abs() < 1e-12, "midway factor {mid}");
        assert_eq!(morph_factor(20, 1.0, &t), 0.0);
    }

    /// Stencil triangles keep the outward winding of their leaf.
    #[test]
    fn test_triangles_wound_outward() {
        let buffers = generate(&leaves(1), 1.0, DVec3::ZERO, &DMat4::IDENTITY, &table());
        for tri in buffers.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| glam::Vec3::from_array(buffers.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(a + b + c) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn test_byte_views() {
        let buffers = generate(&leaves(0), 1.0, DVec3::ZERO, &DMat4::IDENTITY, &table());
        assert_eq!(buffers.vertex_bytes().len(), 20 * 6 * 48);
        assert_eq!(buffers.index_bytes().len(), 20 * 12 * 4);
    }
}
