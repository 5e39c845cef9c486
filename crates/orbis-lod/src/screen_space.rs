//! Screen-space error metric: how close the camera must be before a patch of a
//! given depth is worth splitting.

/// Selectable target on-screen patch sizes in pixels, coarsest first.
pub const TARGET_PIXEL_SIZES: [f64; 9] = [64.0, 32.0, 16.0, 8.0, 4.0, 2.0, 1.0, 0.5, 0.25];

/// Number of subdivision levels a distance table covers (levels `0..=11`).
pub const LOD_LEVEL_COUNT: usize = 12;

/// Target pixel size for an index into [`TARGET_PIXEL_SIZES`], clamped to the list.
pub fn target_pixel_size(index: usize) -> f64 {
    TARGET_PIXEL_SIZES[index.min(TARGET_PIXEL_SIZES.len() - 1)]
}

/// Focal length in pixels for a vertical field of view.
pub fn focal_length(canvas_height: f64, fov_y: f64) -> f64 {
    (canvas_height * 0.5) / (fov_y * 0.5).tan()
}

/// Distance below which a patch at `level` should be subdivided.
///
/// A patch at depth `L` spans `radius / 2^L` world units; it projects to
/// `target_px` pixels at `size * focal / target_px`.
pub fn lod_distance_for_level(
    radius: f64,
    lod_multiplier: f64,
    level: u8,
    target_px: f64,
    canvas_height: f64,
    fov_y: f64,
) -> f64 {
    let patch_world_size = radius / f64::powi(2.0, i32::from(level));
    patch_world_size * focal_length(canvas_height, fov_y) / target_px * lod_multiplier
}

/// Per-level subdivision distances for one body under one camera setup.
#[derive(Clone, Debug, PartialEq)]
pub struct LodDistanceTable(Vec<f64>);

impl LodDistanceTable {
    /// Evaluate [`lod_distance_for_level`] for every level.
    pub fn for_body(
        radius: f64,
        lod_multiplier: f64,
        target_px: f64,
        canvas_height: f64,
        fov_y: f64,
    ) -> Self {
        Self(
            (0..LOD_LEVEL_COUNT as u8)
                .map(|level| {
                    lod_distance_for_level(
                        radius,
                        lod_multiplier,
                        level,
                        target_px,
                        canvas_height,
                        fov_y,
                    )
                })
                .collect(),
        )
    }

    /// Wrap an explicit list of distances.
    pub fn from_distances(distances: Vec<f64>) -> Self {
        Self(distances)
    }

    /// Threshold for `level`, if the table covers it.
    pub fn get(&self, level: u8) -> Option<f64> {
        self.0.get(usize::from(level)).copied()
    }

    /// All thresholds, level 0 first.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of levels covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the table covers no levels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every entry is within `tolerance` (relative) of `other`.
    ///
    /// Tables of different length never match.
    pub fn within_tolerance(&self, other: &LodDistanceTable, tolerance: f64) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(&cached, &fresh)| {
                let scale = fresh.abs().max(f64::MIN_POSITIVE);
                (cached - fresh).abs() / scale <= tolerance
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOV: f64 = std::f64::consts::FRAC_PI_3;

    /// Finer levels must trigger at strictly shorter distances.
    #[test]
    fn test_distances_strictly_decrease_with_level() {
        for &px in &TARGET_PIXEL_SIZES {
            let table = LodDistanceTable::for_body(6.0, 1.0, px, 720.0, FOV);
            assert_eq!(table.len(), LOD_LEVEL_COUNT);
            for pair in table.as_slice().windows(2) {
                assert!(
                    pair[1] < pair[0],
                    "distance must decrease: {} then {} at {px}px",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_formula_matches_closed_form() {
        // tan(45°) = 1, so focal = h / 2 exactly.
        let d = lod_distance_for_level(8.0, 2.0, 3, 4.0, 600.0, std::f64::consts::FRAC_PI_2);
        let expected = (8.0 / 8.0) * 300.0 / 4.0 * 2.0;
        assert!((d - expected).abs() < 1e-9, "got {d}, expected {expected}");
    }

    /// Each level halves the distance.
    #[test]
    fn test_each_level_halves_distance() {
        let table = LodDistanceTable::for_body(1.0, 1.0, 4.0, 720.0, FOV);
        for pair in table.as_slice().windows(2) {
            assert!((pair[0] / pair[1] - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_smaller_pixel_target_reaches_farther() {
        let coarse = LodDistanceTable::for_body(1.0, 1.0, target_pixel_size(0), 720.0, FOV);
        let fine = LodDistanceTable::for_body(1.0, 1.0, target_pixel_size(8), 720.0, FOV);
        assert!(fine.get(0).unwrap() > coarse.get(0).unwrap());
    }

    #[test]
    fn test_pixel_index_clamped() {
        assert_eq!(target_pixel_size(100), 0.25);
        assert_eq!(target_pixel_size(0), 64.0);
    }

    #[test]
    fn test_tolerance_comparison() {
        let a = LodDistanceTable::from_distances(vec![100.0, 50.0]);
        let close = LodDistanceTable::from_distances(vec![102.0, 49.0]);
        let far = LodDistanceTable::from_distances(vec![110.0, 50.0]);
        let short = LodDistanceTable::from_distances(vec![100.0]);
        assert!(a.within_tolerance(&close, 0.03));
        assert!(!a.within_tolerance(&far, 0.03));
        assert!(!a.within_tolerance(&short, 0.03));
    }

    #[test]
    fn test_out_of_range_level() {
        let table = LodDistanceTable::for_body(1.0, 1.0, 4.0, 720.0, FOV);
        assert!(table.get(LOD_LEVEL_COUNT as u8).is_none());
    }
}
