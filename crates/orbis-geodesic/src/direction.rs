//! Unit-sphere direction helpers.

use glam::DVec3;

/// Direction used when a vector is too short to normalize.
pub const FALLBACK_DIRECTION: DVec3 = DVec3::Y;

/// Squared length below which a vector is treated as degenerate.
const DEGENERATE_LENGTH_SQ: f64 = 1e-24;

/// Normalize `v`, substituting [`FALLBACK_DIRECTION`] for zero-length input.
///
/// Degenerate patches (coincident corners, or corners summing to zero) still
/// get a well-defined center this way instead of propagating NaNs.
pub fn normalize_or_fallback(v: DVec3) -> DVec3 {
    let len_sq = v.length_squared();
    if len_sq > DEGENERATE_LENGTH_SQ && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        FALLBACK_DIRECTION
    }
}
