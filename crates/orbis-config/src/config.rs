//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "orbis";

/// Top-level renderer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Viewport settings.
    pub window: WindowConfig,
    /// Patch LOD settings.
    pub lod: LodConfig,
    /// Geometry cache settings.
    pub cache: CacheConfig,
    /// Frame-budget quality governor.
    pub governor: GovernorConfig,
    /// GPU buffer sizing.
    pub gpu: GpuConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Viewport configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels. Drives the screen-space LOD focal length.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f64,
}

/// Patch LOD configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Index into the descending list of target on-screen patch sizes
    /// (64 px down to 0.25 px).
    pub target_pixel_size_index: usize,
    /// Maximum subdivision depth.
    pub max_lod: u8,
    /// Tint patches by their LOD level.
    pub show_lod_debug_colors: bool,
    /// Animate procedural surface noise in the shading stage.
    pub animate_surface: bool,
    /// Keep lazily created patch children alive across frames.
    pub retain_patch_tree: bool,
    /// Node budget for the retained patch tree before it is reset.
    pub max_retained_patches: usize,
}

/// Geometry cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Grid step used to quantize the camera position into a cache key.
    pub position_step: f64,
    /// Grid step used to quantize the camera forward vector into a cache key.
    pub direction_step: f64,
    /// Maximum camera movement for a cached entry to stay valid.
    pub position_threshold: f64,
    /// Minimum dot product between cached and current camera forward vectors.
    pub rotation_threshold: f64,
    /// Relative tolerance between cached and fresh LOD distances (0.03 = 3%).
    pub lod_distance_tolerance: f64,
    /// Entries untouched for longer than this are evicted.
    pub max_age_seconds: f64,
    /// Maximum number of cached geometry sets.
    pub max_entries: usize,
}

/// Frame-budget governor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GovernorConfig {
    /// Cap the max LOD when frames persistently overrun the budget.
    pub enabled: bool,
    /// Frame time budget in milliseconds.
    pub frame_budget_ms: f64,
    /// Consecutive over-budget frames before the cap drops one level.
    pub overrun_frames: u32,
    /// Consecutive under-budget frames before the cap rises one level.
    pub recovery_frames: u32,
    /// The cap never drops below this depth.
    pub min_max_lod: u8,
}

/// GPU buffer sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GpuConfig {
    /// Upper bound on leaf patches per body; sizes the fixed vertex/index buffers.
    pub max_patches_per_body: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_y_degrees: 60.0,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            target_pixel_size_index: 4,
            max_lod: 8,
            show_lod_debug_colors: false,
            animate_surface: true,
            retain_patch_tree: false,
            max_retained_patches: 200_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            position_step: 0.01,
            direction_step: 0.01,
            position_threshold: 0.01,
            rotation_threshold: 0.9999,
            lod_distance_tolerance: 0.03,
            max_age_seconds: 5.0,
            max_entries: 64,
        }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_budget_ms: 16.7,
            overrun_frames: 30,
            recovery_frames: 120,
            min_max_lod: 3,
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            max_patches_per_body: 65_536,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Resolve the platform configuration directory for Orbis.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_NAME))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Vertical field of view in radians.
    pub fn fov_y_radians(&self) -> f64 {
        self.window.fov_y_degrees.to_radians()
    }
}
