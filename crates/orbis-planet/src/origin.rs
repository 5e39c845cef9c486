//! Floating-origin camera and f32 origin rebasing.
//!
//! All patch math runs with the camera at the origin: every body position is
//! turned into `body_world - camera_world` before culling, LOD selection or
//! geometry generation, which keeps magnitudes bounded wherever the camera is.

use glam::{DMat4, DVec3, Vec3};
use orbis_geodesic::{BodyDescriptor, normalize_or_fallback};

/// The camera as seen by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatingOriginCamera {
    /// Absolute world position.
    pub world_position: DVec3,
    /// Unit view direction.
    pub forward: DVec3,
    /// Up hint for the view matrix.
    pub up: DVec3,
}

impl FloatingOriginCamera {
    /// Camera at `world_position` looking along `forward`. A zero forward
    /// vector falls back to a fixed direction.
    pub fn new(world_position: DVec3, forward: DVec3) -> Self {
        Self {
            world_position,
            forward: normalize_or_fallback(forward),
            up: DVec3::Y,
        }
    }

    /// Camera at `world_position` looking at `target`.
    pub fn looking_at(world_position: DVec3, target: DVec3) -> Self {
        Self::new(world_position, target - world_position)
    }

    /// Override the up hint.
    pub fn with_up(mut self, up: DVec3) -> Self {
        self.up = normalize_or_fallback(up);
        self
    }

    /// Translate an absolute world position into camera-relative space.
    pub fn world_to_camera_relative(&self, world_position: DVec3) -> DVec3 {
        world_position - self.world_position
    }

    /// Camera-relative view matrix: rotation only, the eye sits at the origin.
    pub fn view(&self) -> DMat4 {
        // A forward parallel to the up hint makes look_to degenerate.
        let up = if self.forward.cross(self.up).length_squared() < 1e-12 {
            DVec3::Z
        } else {
            self.up
        };
        DMat4::look_to_rh(DVec3::ZERO, self.forward, up)
    }

    /// The body's world matrix with its translation made camera-relative.
    pub fn camera_relative_world_matrix(&self, body: &BodyDescriptor) -> DMat4 {
        DMat4::from_rotation_translation(
            body.orientation,
            self.world_to_camera_relative(body.world_position),
        )
    }
}

/// Default distance from the render origin before a rebase, in world units.
pub const DEFAULT_REBASE_THRESHOLD: f64 = 10_000.0;

/// Tracks a render origin for collaborators that keep f32 positions.
///
/// When the camera strays more than [`rebase_threshold`](Self::rebase_threshold)
/// from the current origin on any axis, the origin jumps to the camera and the
/// shift is returned so f32 state can be moved by the same amount.
#[derive(Clone, Debug)]
pub struct OriginManager {
    /// Current render origin in world space.
    pub origin: DVec3,
    /// Per-axis distance before rebasing.
    pub rebase_threshold: f64,
}

impl OriginManager {
    /// Origin at zero with the default threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_REBASE_THRESHOLD)
    }

    /// Origin at zero with a custom threshold.
    pub fn with_threshold(rebase_threshold: f64) -> Self {
        Self {
            origin: DVec3::ZERO,
            rebase_threshold,
        }
    }

    /// Rebase if the camera is too far away. Returns the applied shift
    /// (new origin minus old origin).
    pub fn update(&mut self, camera_world: DVec3) -> Option<DVec3> {
        let delta = camera_world - self.origin;
        if delta.abs().max_element() > self.rebase_threshold {
            self.origin = camera_world;
            Some(delta)
        } else {
            None
        }
    }

    /// Camera position relative to the origin, narrowed to f32 for the GPU.
    pub fn local_camera_pos(&self, camera_world: DVec3) -> Vec3 {
        (camera_world - self.origin).as_vec3()
    }
}

impl Default for OriginManager {
    fn default() -> Self {
        Self::new()
    }
}
