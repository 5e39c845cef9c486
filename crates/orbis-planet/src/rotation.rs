//! Spin detection for cached body geometry.
//!
//! Cached buffers are body-local, but leaf selection and culling were done for
//! one orientation. Once a body has turned far enough that the difference
//! would show, its cache entries must go.

use glam::{DMat3, DMat4, DVec3};
use orbis_geodesic::{BodyDescriptor, BodyId};
use rustc_hash::FxHashMap;

/// Per-element rotation difference that counts as significant far from the
/// body at max LOD 0.
pub const BASE_ROTATION_THRESHOLD: f64 = 1e-3;

/// Last-seen rotation block per body.
#[derive(Clone, Debug, Default)]
pub struct RotationTracker {
    baselines: FxHashMap<BodyId, DMat3>,
}

/// Threshold for a camera `altitude_ratio` body radii above the surface
/// rendering up to `max_lod`. Shrinks as the camera closes in and as finer
/// geometry is allowed.
pub fn rotation_threshold(altitude_ratio: f64, max_lod: u8) -> f64 {
    let proximity = (altitude_ratio / 10.0).clamp(0.05, 1.0);
    BASE_ROTATION_THRESHOLD * proximity / (1.0 + 0.25 * f64::from(max_lod))
}

fn max_element_difference(a: &DMat3, b: &DMat3) -> f64 {
    let a = a.to_cols_array();
    let b = b.to_cols_array();
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

impl RotationTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the rotation block of `world_matrix` differs from the
    /// stored baseline by more than the adaptive threshold.
    ///
    /// The first observation of a body only stores a baseline. A positive
    /// result replaces the baseline, so the next comparison is against the
    /// latest orientation.
    pub fn has_rotated_significantly(
        &mut self,
        body_id: BodyId,
        world_matrix: &DMat4,
        camera_pos: DVec3,
        body: &BodyDescriptor,
        max_lod: u8,
    ) -> bool {
        let rotation = DMat3::from_mat4(*world_matrix);
        let Some(baseline) = self.baselines.get_mut(&body_id) else {
            self.baselines.insert(body_id, rotation);
            return false;
        };

        let body_center = world_matrix.transform_point3(DVec3::ZERO);
        let altitude_ratio = (camera_pos.distance(body_center) - body.radius) / body.radius;
        let threshold = rotation_threshold(altitude_ratio, max_lod);

        if max_element_difference(baseline, &rotation) > threshold {
            *baseline = rotation;
            true
        } else {
            false
        }
    }

    /// Drop the baseline of one body.
    pub fn forget(&mut self, body_id: BodyId) {
        self.baselines.remove(&body_id);
    }

    /// Drop every baseline.
    pub fn clear(&mut self) {
        self.baselines.clear();
    }

    /// Number of bodies with a baseline.
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    /// Returns true if no body has been observed.
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
