//! Configuration management for infrapilot.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{GitHubAuthConfig, PilotConfig};

use std::path::{Path, PathBuf};

use crate::error::{PilotError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<PilotConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<PilotConfig> {
    if !path.exists() {
        return Ok(PilotConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: PilotConfig =
        toml::from_str(&contents).map_err(|e| PilotError::ConfigRead(e.to_string()))?;

    Ok(config.with_env_overrides())
}

/// Resolve where the credential file lives.
///
/// An explicit `[credentials] path` wins over the platform default.
pub fn credentials_path(config: &PilotConfig) -> Result<PathBuf> {
    match &config.credentials.path {
        Some(path) => Ok(path.clone()),
        None => paths::credentials_file(),
    }
}
