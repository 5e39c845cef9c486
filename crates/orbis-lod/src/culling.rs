//! Patch culling against the view frustum.
//!
//! All positions are camera-relative: the camera sits at the origin and body
//! centers are offset by `body_world - camera_world`.

use std::ops::AddAssign;

use glam::{DMat4, DVec3, DVec4};
use orbis_geodesic::BodyDescriptor;

use crate::horizon_culling;

/// Plane indices into [`Frustum::planes`].
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const BOTTOM: usize = 2;
pub const TOP: usize = 3;
pub const NEAR: usize = 4;
pub const FAR: usize = 5;

/// Bias, in body radii, a patch must sit beyond the horizon plane before it is culled.
pub const DEFAULT_HORIZON_BIAS: f64 = 0.01;

/// Six inward-facing planes as `(nx, ny, nz, d)`, normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [DVec4; 6],
}

impl Frustum {
    /// Gribb/Hartmann extraction from a view-projection matrix.
    ///
    /// Near is `row3 + row2`, which is the OpenGL form; for zero-to-one depth
    /// projections it sits slightly behind the true near plane, so it can only
    /// keep extra patches, never drop visible ones.
    pub fn from_view_proj(vp: &DMat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row3 + row2, // near
            row3 - row2, // far
        ];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 1e-12 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// The extracted planes, indexed by [`LEFT`]..=[`FAR`].
    pub fn planes(&self) -> &[DVec4; 6] {
        &self.planes
    }

    /// Signed distance of `point` from plane `index`; positive is inside.
    pub fn signed_distance(&self, index: usize, point: DVec3) -> f64 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }
}

/// What the culler needs to know about the body being traversed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CullBody {
    /// Body center relative to the camera.
    pub center: DVec3,
    /// Undisplaced radius.
    pub radius: f64,
    /// Fraction of the radius reserved for relief; pads frustum bounds.
    pub max_displacement: f64,
    /// Fraction of the radius the horizon sphere is shrunk by.
    pub noise_allowance: f64,
}

impl CullBody {
    /// Culling view of `body` whose center is at `relative_center` from the camera.
    pub fn from_descriptor(body: &BodyDescriptor, relative_center: DVec3) -> Self {
        Self {
            center: relative_center,
            radius: body.radius,
            max_displacement: body.max_displacement,
            noise_allowance: body.noise_allowance(),
        }
    }

    /// Camera altitude above the surface, in body radii.
    pub fn altitude_ratio(&self, camera_pos: DVec3) -> f64 {
        (camera_pos.distance(self.center) - self.radius) / self.radius
    }
}

/// Counters accumulated while building one leaf set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Patches examined.
    pub visited: u32,
    /// Patches rejected by the frustum test.
    pub frustum_culled: u32,
    /// Patches rejected by the horizon test.
    pub backface_culled: u32,
    /// Patches split into children.
    pub subdivided: u32,
    /// Patches emitted as leaves.
    pub leaves: u32,
}

impl AddAssign for CullStats {
    fn add_assign(&mut self, rhs: Self) {
        self.visited += rhs.visited;
        self.frustum_culled += rhs.frustum_culled;
        self.backface_culled += rhs.backface_culled;
        self.subdivided += rhs.subdivided;
        self.leaves += rhs.leaves;
    }
}

/// Bounding-sphere growth with camera proximity. Closer cameras see more of
/// the displaced surface poke outside the undisplaced bounds.
fn proximity_factor(altitude_ratio: f64) -> f64 {
    if altitude_ratio < 0.1 {
        2.0
    } else if altitude_ratio < 0.5 {
        1.5
    } else if altitude_ratio < 2.0 {
        1.2
    } else {
        1.0
    }
}

/// How far outside a plane, in padded radii, a sphere may sit before it is rejected.
fn plane_tolerance(plane: usize, altitude_ratio: f64) -> f64 {
    let depth_plane = plane == NEAR || plane == FAR;
    match (depth_plane, altitude_ratio) {
        (true, a) if a < 0.5 => 2.5,
        (true, _) => 1.5,
        (false, a) if a < 0.1 => 1.5,
        (false, a) if a < 0.5 => 1.25,
        (false, _) => 1.0,
    }
}

/// Frustum and horizon tests plus the counters they feed.
#[derive(Clone, Debug)]
pub struct PatchCuller {
    frustum: Option<Frustum>,
    horizon_bias: f64,
    stats: CullStats,
}

impl PatchCuller {
    /// A culler with no frustum: every patch passes the frustum test until
    /// [`extract_frustum_planes`](Self::extract_frustum_planes) is called.
    pub fn new() -> Self {
        Self {
            frustum: None,
            horizon_bias: DEFAULT_HORIZON_BIAS,
            stats: CullStats::default(),
        }
    }

    /// Override the horizon bias (in body radii).
    pub fn with_horizon_bias(mut self, bias: f64) -> Self {
        self.horizon_bias = bias;
        self
    }

    /// Extract and store the six planes of a camera-relative view-projection matrix.
    pub fn extract_frustum_planes(&mut self, view_proj: &DMat4) {
        self.frustum = Some(Frustum::from_view_proj(view_proj));
    }

    /// Forget the stored planes.
    pub fn clear_frustum(&mut self) {
        self.frustum = None;
    }

    /// The currently stored planes, if any.
    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }

    /// Horizon bias used by the quadtree traversal.
    pub fn horizon_bias(&self) -> f64 {
        self.horizon_bias
    }

    /// Test a patch bounding sphere against the frustum.
    ///
    /// `center` is camera-relative and `radius` is in world units. The sphere
    /// grows with `lod` and camera proximity and is padded by the body's
    /// relief allowance before the per-plane test.
    pub fn is_patch_in_frustum(
        &self,
        center: DVec3,
        radius: f64,
        body: &CullBody,
        camera_pos: DVec3,
        lod: u8,
    ) -> bool {
        let Some(frustum) = &self.frustum else {
            return true;
        };

        let altitude_ratio = body.altitude_ratio(camera_pos);
        let multiplier = (1.0 + 0.1 * f64::from(lod)) * proximity_factor(altitude_ratio);
        let padded = radius * multiplier + body.max_displacement * body.radius;

        (0..6).all(|plane| {
            frustum.signed_distance(plane, center) >= -padded * plane_tolerance(plane, altitude_ratio)
        })
    }

    /// Horizon test; see [`horizon_culling::is_patch_backfacing`].
    pub fn is_patch_backfacing(
        &self,
        center: DVec3,
        camera_pos: DVec3,
        body: &CullBody,
        bias: f64,
    ) -> bool {
        horizon_culling::is_patch_backfacing(center, camera_pos, body, bias)
    }

    /// Counters since the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> CullStats {
        self.stats
    }

    /// Mutable counters, for the traversal.
    pub fn stats_mut(&mut self) -> &mut CullStats {
        &mut self.stats
    }

    /// Zero the counters.
    pub fn reset_stats(&mut self) {
        self.stats = CullStats::default();
    }
}

impl Default for PatchCuller {
    fn default() -> Self {
        Self::new()
    }
}
