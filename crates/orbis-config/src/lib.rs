//! Configuration system for Orbis.
//!
//! Runtime-configurable renderer settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CacheConfig, Config, DebugConfig, GovernorConfig, GpuConfig, LodConfig, WindowConfig,
    default_config_dir,
};
pub use error::ConfigError;
