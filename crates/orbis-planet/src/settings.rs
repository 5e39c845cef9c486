//! Runtime LOD knobs.
//!
//! Setters only record the new value; the renderer picks changes up at the
//! start of the next frame through [`LodSettings::take_changes`].

use orbis_lod::{LOD_LEVEL_COUNT, TARGET_PIXEL_SIZES, target_pixel_size};

/// Deepest LOD the distance tables cover.
pub const MAX_SUPPORTED_LOD: u8 = (LOD_LEVEL_COUNT - 1) as u8;

/// Which knobs changed since the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettingsChanges {
    /// Target pixel size index changed; every cached table is stale.
    pub pixel_size: bool,
    /// Max LOD changed.
    pub max_lod: bool,
    /// Debug colouring toggled.
    pub debug_colors: bool,
}

impl SettingsChanges {
    /// Returns true if anything changed.
    pub fn any(&self) -> bool {
        self.pixel_size || self.max_lod || self.debug_colors
    }
}

/// User-adjustable LOD parameters.
#[derive(Clone, Debug)]
pub struct LodSettings {
    target_pixel_size_index: usize,
    max_lod: u8,
    show_lod_debug_colors: bool,
    pending: SettingsChanges,
}

impl LodSettings {
    /// Settings with the index and cap clamped into range.
    pub fn new(target_pixel_size_index: usize, max_lod: u8) -> Self {
        Self {
            target_pixel_size_index: target_pixel_size_index.min(TARGET_PIXEL_SIZES.len() - 1),
            max_lod: max_lod.min(MAX_SUPPORTED_LOD),
            show_lod_debug_colors: false,
            pending: SettingsChanges::default(),
        }
    }

    /// Index into [`TARGET_PIXEL_SIZES`].
    pub fn target_pixel_size_index(&self) -> usize {
        self.target_pixel_size_index
    }

    /// Target on-screen patch size in pixels.
    pub fn target_pixel_size(&self) -> f64 {
        target_pixel_size(self.target_pixel_size_index)
    }

    /// LOD depth cap.
    pub fn max_lod(&self) -> u8 {
        self.max_lod
    }

    /// Whether leaves are tinted by depth.
    pub fn show_lod_debug_colors(&self) -> bool {
        self.show_lod_debug_colors
    }

    /// Select a target pixel size, clamped to the list.
    pub fn set_target_pixel_size_index(&mut self, index: usize) {
        let index = index.min(TARGET_PIXEL_SIZES.len() - 1);
        if index != self.target_pixel_size_index {
            self.target_pixel_size_index = index;
            self.pending.pixel_size = true;
        }
    }

    /// Set the LOD depth cap, clamped to the supported range.
    pub fn set_max_lod(&mut self, max_lod: u8) {
        let max_lod = max_lod.min(MAX_SUPPORTED_LOD);
        if max_lod != self.max_lod {
            self.max_lod = max_lod;
            self.pending.max_lod = true;
        }
    }

    /// Toggle debug colouring.
    pub fn set_lod_debug_colors(&mut self, enabled: bool) {
        if enabled != self.show_lod_debug_colors {
            self.show_lod_debug_colors = enabled;
            self.pending.debug_colors = true;
        }
    }

    /// Changes recorded since the last call.
    pub fn take_changes(&mut self) -> SettingsChanges {
        std::mem::take(&mut self.pending)
    }
}

impl Default for LodSettings {
    fn default() -> Self {
        Self::new(4, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_record_changes_once() {
        let mut settings = LodSettings::default();
        settings.set_target_pixel_size_index(2);
        settings.set_max_lod(6);
        let changes = settings.take_changes();
        assert!(changes.pixel_size && changes.max_lod && !changes.debug_colors);
        assert!(!settings.take_changes().any());
    }

    #[test]
    fn test_setting_same_value_is_not_a_change() {
        let mut settings = LodSettings::default();
        settings.set_target_pixel_size_index(settings.target_pixel_size_index());
        settings.set_max_lod(settings.max_lod());
        settings.set_lod_debug_colors(false);
        assert!(!settings.take_changes().any());
    }

    #[test]
    fn test_values_clamped() {
        let mut settings = LodSettings::new(99, 200);
        assert_eq!(settings.target_pixel_size_index(), TARGET_PIXEL_SIZES.len() - 1);
        assert_eq!(settings.max_lod(), MAX_SUPPORTED_LOD);
        settings.set_max_lod(255);
        assert_eq!(settings.max_lod(), 11);
    }

    #[test]
    fn test_pixel_size_lookup() {
        let settings = LodSettings::new(0, 8);
        assert_eq!(settings.target_pixel_size(), 64.0);
    }
}
