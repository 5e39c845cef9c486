//! Horizon culling for spherical bodies.
//!
//! A patch is hidden by the body's own curvature when it lies inside the
//! tangent cone from the camera to the body and beyond the plane through the
//! tangent circle. The test sphere is shrunk by the terrain's noise allowance
//! so displaced peaks rising over the horizon are kept.

use glam::DVec3;

use crate::CullBody;

/// Camera-to-center distances below this are treated as zero.
const MIN_CAMERA_DISTANCE: f64 = 1e-9;

/// Altitude, in body radii, below which the bias is halved.
const CLOSE_ALTITUDE_RATIO: f64 = 0.05;

/// Radius of the sphere the horizon is computed against.
pub fn reduced_radius(body: &CullBody) -> f64 {
    body.radius * (1.0 - body.noise_allowance)
}

/// Returns true if the patch centered at `center` is below the horizon.
///
/// `center` and `camera_pos` are camera-relative, `bias` is in body radii.
/// Never culls when the camera is at the body center, inside the reduced
/// sphere, or within one reduced radius of the patch.
pub fn is_patch_backfacing(center: DVec3, camera_pos: DVec3, body: &CullBody, bias: f64) -> bool {
    let to_body = body.center - camera_pos;
    let d = to_body.length();
    if d < MIN_CAMERA_DISTANCE {
        return false;
    }

    let r = reduced_radius(body);
    if d <= r {
        return false;
    }

    let to_patch = center - camera_pos;
    let patch_distance = to_patch.length();
    if patch_distance <= r {
        return false;
    }

    let axis = to_body / d;
    let along = to_patch.dot(axis);

    // Half-angle of the tangent cone: cos = sqrt(d² - r²) / d.
    let tangent_sq = d * d - r * r;
    let cos_cone = tangent_sq.sqrt() / d;
    if along / patch_distance <= cos_cone {
        return false;
    }

    let horizon_plane = tangent_sq / d;
    let altitude_ratio = (d - body.radius) / body.radius;
    let bias = if altitude_ratio < CLOSE_ALTITUDE_RATIO {
        bias * 0.5
    } else {
        bias
    };

    along > horizon_plane + bias * body.radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_HORIZON_BIAS;

    fn body_at(center: DVec3, radius: f64) -> CullBody {
        CullBody {
            center,
            radius,
            max_displacement: 0.04,
            noise_allowance: 0.08,
        }
    }

    /// Points sampled over a sphere's surface.
    fn surface_points(center: DVec3, radius: f64) -> Vec<DVec3> {
        let mut points = Vec::new();
        for i in 0..24 {
            for j in 1..12 {
                let theta = i as f64 / 24.0 * std::f64::consts::TAU;
                let phi = j as f64 / 12.0 * std::f64::consts::PI;
                let dir = DVec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                points.push(center + dir * radius);
            }
        }
        points
    }

    #[test]
    fn test_far_side_is_culled_near_side_kept() {
        let body = body_at(DVec3::new(0.0, 0.0, -100.0), 1.0);
        let near = DVec3::new(0.0, 0.0, -99.0);
        let far = DVec3::new(0.0, 0.0, -101.0);
        assert!(!is_patch_backfacing(near, DVec3::ZERO, &body, DEFAULT_HORIZON_BIAS));
        assert!(is_patch_backfacing(far, DVec3::ZERO, &body, DEFAULT_HORIZON_BIAS));
    }

    /// Camera at the body center: nothing is backfacing.
    #[test]
    fn test_camera_at_center_never_culls() {
        let body = body_at(DVec3::ZERO, 1.0);
        for p in surface_points(DVec3::ZERO, 1.0) {
            assert!(
                !is_patch_backfacing(p, DVec3::ZERO, &body, DEFAULT_HORIZON_BIAS),
                "patch at {p} culled with camera at center"
            );
        }
    }

    /// Camera inside the reduced sphere sees no backface culling.
    #[test]
    fn test_camera_inside_reduced_sphere_never_culls() {
        let body = body_at(DVec3::new(0.0, -0.5, 0.0), 1.0);
        for p in surface_points(body.center, 1.0) {
            assert!(!is_patch_backfacing(p, DVec3::ZERO, &body, 0.0));
        }
    }

    /// A patch within one reduced radius of the camera is never culled.
    #[test]
    fn test_patch_within_reduced_radius_never_culled() {
        let body = body_at(DVec3::new(0.0, -1.1, 0.0), 1.0);
        let r = reduced_radius(&body);
        for p in surface_points(body.center, 1.0) {
            if p.length() <= r {
                assert!(!is_patch_backfacing(p, DVec3::ZERO, &body, 0.0), "{p}");
            }
        }
    }

    #[test]
    fn test_patch_outside_cone_is_kept() {
        let body = body_at(DVec3::new(0.0, 0.0, -100.0), 1.0);
        // Off to the side of the body, outside the cone entirely.
        let p = DVec3::new(50.0, 0.0, -150.0);
        assert!(!is_patch_backfacing(p, DVec3::ZERO, &body, 0.0));
    }

    /// A larger bias keeps patches that sit just past the horizon plane.
    #[test]
    fn test_bias_keeps_patches_near_horizon() {
        let body = body_at(DVec3::new(0.0, 0.0, -3.0), 1.0);
        let r = reduced_radius(&body);
        let d = 3.0;
        let horizon_plane = (d * d - r * r) / d;
        // Just beyond the horizon plane, on the axis.
        let p = DVec3::new(0.0, 0.0, -(horizon_plane + 0.02));
        assert!(is_patch_backfacing(p, DVec3::ZERO, &body, 0.0));
        assert!(!is_patch_backfacing(p, DVec3::ZERO, &body, 0.05));
    }

    /// Close to the surface the bias is halved.
    #[test]
    fn test_bias_halved_near_surface() {
        let body = body_at(DVec3::new(0.0, -1.01, 0.0), 1.0);
        let r = reduced_radius(&body);
        let d: f64 = 1.01;
        let horizon_plane = (d * d - r * r) / d;
        // On the axis, just farther than one reduced radius from the camera.
        let p = DVec3::new(0.0, -(r + 0.05), 0.0);
        let margin = (r + 0.05) - horizon_plane;
        // Full bias would keep it, half bias culls it.
        let bias = margin * 1.5;
        assert!(is_patch_backfacing(p, DVec3::ZERO, &body, bias));
    }
}
