//! Configuration loading functionality.
//!
//! Resolves the configuration path, reads and parses the TOML file, and runs
//! validation before handing the raw [`Config`] back to the caller.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::validation::validate_config;
use crate::constants::*;

/// Resolve the configuration file path.
///
/// An explicit path wins; otherwise the file lives under the XDG config home.
pub fn get_config_path(custom: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = custom {
        return Ok(path.to_path_buf());
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration from `--config` or the default location.
pub fn load(custom: Option<&Path>) -> Result<Config> {
    let config_path = get_config_path(custom)?;
    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Load and validate configuration from a specific path.
///
/// The file must exist; nothing is created on demand.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!("Configuration file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    validate_config(&config)?;
    warn_if_polar(&config);

    Ok(config)
}

/// Sunrise or sunset may not happen on some dates beyond the polar warning latitude.
fn warn_if_polar(config: &Config) {
    let latitude = config.location.latitude;
    if latitude.abs() > POLAR_WARNING_LATITUDE {
        log_warning!(
            "Latitude {:.2}° is beyond ±{}°; sunrise or sunset may not occur on some dates",
            latitude,
            POLAR_WARNING_LATITUDE
        );
        log_indented!("Solar rules are skipped until their event happens again");
    }
}
