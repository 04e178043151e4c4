//! Platform-specific path utilities for infrapilot.

use std::path::PathBuf;

use crate::error::{PilotError, Result};

/// Get the configuration directory for infrapilot.
///
/// - Linux: `~/.config/infrapilot`
/// - macOS: `~/Library/Application Support/infrapilot`
/// - Windows: `%APPDATA%\infrapilot`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| PilotError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("infrapilot"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get the default credential file path.
pub fn credentials_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("credentials.json"))
}
