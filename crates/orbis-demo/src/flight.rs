//! Scripted approach: the camera descends toward a body from far out to just
//! above the surface, sliding sideways so the leaf set keeps changing.

use glam::DVec3;
use orbis_geodesic::BodyDescriptor;
use orbis_planet::FloatingOriginCamera;

/// Exponential descent over a fixed number of frames.
pub struct Flight {
    frames: u32,
    start_altitude: f64,
    end_altitude: f64,
}

impl Flight {
    /// Descend from `start_altitude` to `end_altitude` (in body radii).
    pub fn new(frames: u32, start_altitude: f64, end_altitude: f64) -> Self {
        Self {
            frames: frames.max(1),
            start_altitude,
            end_altitude,
        }
    }

    /// Altitude in body radii at `frame`.
    pub fn altitude(&self, frame: u32) -> f64 {
        let t = (f64::from(frame) / f64::from(self.frames)).clamp(0.0, 1.0);
        self.start_altitude * (self.end_altitude / self.start_altitude).powf(t)
    }

    /// Camera for `frame`, looking at the target's center.
    pub fn camera(&self, frame: u32, target: &BodyDescriptor) -> FloatingOriginCamera {
        let t = f64::from(frame) / f64::from(self.frames);
        let angle = t * 0.6;
        let dir = DVec3::new(angle.sin(), 0.25, angle.cos()).normalize();
        let distance = target.radius * (1.0 + self.altitude(frame));
        let position = target.world_position + dir * distance;
        FloatingOriginCamera::looking_at(position, target.world_position)
    }
}
