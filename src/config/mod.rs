// Configuration module for iot-historian
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HistorianConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<HistorianConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Let environment variables override config values, then re-validate
pub fn apply_env_overrides(config: &mut HistorianConfig) -> Result<()> {
    if let Ok(subscribe_key) = std::env::var("HISTORIAN_SUBSCRIBE_KEY") {
        config.ingest.subscribe_key = subscribe_key;
    }

    if let Ok(base_path) = std::env::var("HISTORIAN_STORAGE_PATH") {
        config
            .storage
            .filesystem
            .get_or_insert_with(FilesystemConfig::default)
            .base_path = base_path;
    }

    ConfigLoader::validate(config).context("Invalid configuration after environment overrides")
}
