//! Per-frame leaf selection over the geodesic patch tree.
//!
//! Each root is descended recursively: culled patches are dropped together with
//! their whole subtree, patches closer than their level's LOD distance are
//! split, everything else becomes a leaf.

use glam::{DMat4, DVec3};
use orbis_geodesic::{BodyDescriptor, LeafPatch, Patch};

use crate::{CullBody, LodDistanceTable, PatchCuller};

/// Shallowest level tested against the frustum. Coarser patches cover so much
/// of the sphere that they are almost always visible.
pub const FRUSTUM_CULL_MIN_LEVEL: u8 = 3;

/// Shallowest level tested against the horizon.
pub const HORIZON_CULL_MIN_LEVEL: u8 = 4;

/// A body placed in camera-relative space for one traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyFrame {
    /// Camera-relative world transform (rotation plus relative translation).
    pub world_matrix: DMat4,
    /// Culling bounds derived from the same transform.
    pub bounds: CullBody,
}

impl BodyFrame {
    /// Frame for `body` under a camera-relative `world_matrix`.
    pub fn new(body: &BodyDescriptor, world_matrix: DMat4) -> Self {
        let center = world_matrix.transform_point3(DVec3::ZERO);
        Self {
            world_matrix,
            bounds: CullBody::from_descriptor(body, center),
        }
    }

    /// World-space (camera-relative) position of a unit-sphere direction on the surface.
    pub fn surface_point(&self, direction: DVec3) -> DVec3 {
        self.world_matrix
            .transform_point3(direction * self.bounds.radius)
    }
}

struct Traversal<'a> {
    camera_position: DVec3,
    frame: &'a BodyFrame,
    lod_distances: &'a LodDistanceTable,
    max_lod: u8,
}

/// Select the leaf set for one body this frame.
///
/// Children are created lazily on `roots`, so passing a retained forest reuses
/// nodes from earlier frames. Cull counters accumulate in `culler`.
pub fn build_leaves(
    camera_position: DVec3,
    frame: &BodyFrame,
    lod_distances: &LodDistanceTable,
    max_lod: u8,
    culler: &mut PatchCuller,
    roots: &mut [Patch],
) -> Vec<LeafPatch> {
    let traversal = Traversal {
        camera_position,
        frame,
        lod_distances,
        max_lod,
    };
    let mut leaves = Vec::new();
    for root in roots.iter_mut() {
        visit(root, &traversal, culler, &mut leaves);
    }
    leaves
}

fn visit(patch: &mut Patch, t: &Traversal<'_>, culler: &mut PatchCuller, out: &mut Vec<LeafPatch>) {
    culler.stats_mut().visited += 1;

    let level = patch.level();
    let bounds = &t.frame.bounds;
    let world_center = t.frame.surface_point(patch.center());

    if level >= FRUSTUM_CULL_MIN_LEVEL {
        let world_radius = patch.bounding_radius() * bounds.radius;
        if !culler.is_patch_in_frustum(world_center, world_radius, bounds, t.camera_position, level) {
            culler.stats_mut().frustum_culled += 1;
            return;
        }
    }

    if level >= HORIZON_CULL_MIN_LEVEL
        && culler.is_patch_backfacing(world_center, t.camera_position, bounds, culler.horizon_bias())
    {
        culler.stats_mut().backface_culled += 1;
        return;
    }

    let distance = world_center.distance(t.camera_position);
    let split = level < t.max_lod
        && t
            .lod_distances
            .get(level)
            .is_some_and(|threshold| distance < threshold);

    if split {
        culler.stats_mut().subdivided += 1;
        for child in patch.subdivide().iter_mut() {
            visit(child, t, culler, out);
        }
    } else {
        culler.stats_mut().leaves += 1;
        out.push(patch.to_leaf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_geodesic::{BodyId, PatchForest, TerrainKind, root_patches};

    fn unit_body() -> BodyDescriptor {
        BodyDescriptor::new(BodyId(1), "Unit", 1.0, DVec3::ZERO, TerrainKind::Cratered)
    }

    /// Camera-relative frame for a body at the origin seen from `camera`.
    fn frame_from(camera: DVec3) -> BodyFrame {
        BodyFrame::new(&unit_body(), DMat4::from_translation(-camera))
    }

    fn looking_at_origin(camera: DVec3) -> PatchCuller {
        let vp = DMat4::perspective_rh(std::f64::consts::FRAC_PI_3, 16.0 / 9.0, 0.001, 1000.0)
            * DMat4::look_at_rh(DVec3::ZERO, -camera.normalize(), DVec3::Y);
        let mut culler = PatchCuller::new();
        culler.extract_frustum_planes(&vp);
        culler
    }

    fn pixel_table() -> LodDistanceTable {
        LodDistanceTable::for_body(1.0, 1.0, 4.0, 720.0, std::f64::consts::FRAC_PI_3)
    }

    /// R = 1, maxLod = 0, camera 100 units out along +Z: the 20 root faces.
    #[test]
    fn test_max_lod_zero_returns_root_faces() {
        let camera = DVec3::new(0.0, 0.0, 100.0);
        let mut culler = looking_at_origin(camera);
        let mut roots = root_patches();
        let leaves = build_leaves(
            DVec3::ZERO,
            &frame_from(camera),
            &pixel_table(),
            0,
            &mut culler,
            &mut roots,
        );
        assert_eq!(leaves.len(), 20);
        assert!(leaves.len() >= 10);
        assert!(leaves.iter().all(|l| l.level == 0));
        assert_eq!(culler.stats().leaves, 20);
    }

    /// With no culling and every threshold exceeded, the tree splits uniformly.
    #[test]
    fn test_uniform_split_without_culling() {
        let mut culler = PatchCuller::new();
        let table = LodDistanceTable::from_distances(vec![f64::MAX; 12]);
        let mut roots = root_patches();
        // Camera at the body center: horizon culling never applies.
        let leaves = build_leaves(
            DVec3::ZERO,
            &frame_from(DVec3::ZERO),
            &table,
            2,
            &mut culler,
            &mut roots,
        );
        assert_eq!(leaves.len(), 20 * 16);
        let stats = culler.stats();
        assert_eq!(stats.subdivided, 20 + 80);
        assert_eq!(stats.visited, 20 + 80 + 320);
    }

    /// Leaves never exceed max LOD and the counters add up.
    #[test]
    fn test_close_camera_refines_and_culls() {
        let camera = DVec3::new(0.0, 0.0, 1.2);
        let mut culler = looking_at_origin(camera);
        let mut roots = root_patches();
        let leaves = build_leaves(
            DVec3::ZERO,
            &frame_from(camera),
            &pixel_table(),
            6,
            &mut culler,
            &mut roots,
        );

        let stats = culler.stats();
        assert!(leaves.iter().all(|l| l.level <= 6));
        assert_eq!(leaves.iter().map(|l| l.level).max(), Some(6));
        assert!(stats.backface_culled > 0, "stats: {stats:?}");
        assert_eq!(
            stats.visited,
            stats.subdivided + stats.leaves + stats.frustum_culled + stats.backface_culled,
            "every visited patch is split, emitted or culled: {stats:?}"
        );
        assert_eq!(stats.leaves as usize, leaves.len());
    }

    /// A table shorter than max LOD stops refinement at its length.
    #[test]
    fn test_short_table_caps_depth() {
        let mut culler = PatchCuller::new();
        let table = LodDistanceTable::from_distances(vec![f64::MAX]);
        let mut roots = root_patches();
        let leaves = build_leaves(
            DVec3::ZERO,
            &frame_from(DVec3::ZERO),
            &table,
            8,
            &mut culler,
            &mut roots,
        );
        assert_eq!(leaves.len(), 80);
        assert!(leaves.iter().all(|l| l.level == 1));
    }

    /// A retained forest keeps its children between traversals.
    #[test]
    fn test_retained_forest_reuses_nodes() {
        let mut forest = PatchForest::new();
        let table = LodDistanceTable::from_distances(vec![f64::MAX; 12]);
        let frame = frame_from(DVec3::ZERO);

        let mut culler = PatchCuller::new();
        let first = build_leaves(DVec3::ZERO, &frame, &table, 1, &mut culler, forest.roots_mut());
        let nodes = forest.node_count();

        let mut culler = PatchCuller::new();
        let second = build_leaves(DVec3::ZERO, &frame, &table, 1, &mut culler, forest.roots_mut());
        assert_eq!(first, second);
        assert_eq!(forest.node_count(), nodes);
    }

    #[test]
    fn test_frame_center_follows_translation() {
        let frame = frame_from(DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(frame.bounds.center, DVec3::new(0.0, 0.0, -5.0));
        assert!((frame.surface_point(DVec3::Z) - DVec3::new(0.0, 0.0, -4.0)).length() < 1e-12);
    }
}
