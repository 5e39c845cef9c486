//! Command-line argument parsing for Orbis.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orbis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "orbis", about = "Planetary patch-LOD renderer")]
pub struct CliArgs {
    /// Viewport width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Maximum patch subdivision depth.
    #[arg(long)]
    pub max_lod: Option<u8>,

    /// Index into the target patch pixel size list (0 = 64 px).
    #[arg(long)]
    pub pixel_size_index: Option<usize>,

    /// Number of frames to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(max_lod) = args.max_lod {
            self.lod.max_lod = max_lod;
        }
        if let Some(index) = args.pixel_size_index {
            self.lod.target_pixel_size_index = index;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
