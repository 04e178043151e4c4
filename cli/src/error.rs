//! Error types and result aliases for infrapilot.
//!
//! This module provides the crate-wide error type:
//! - Module-specific error enums wrapped transparently
//! - User-friendly messages with recovery suggestions
//! - Helper methods for error classification
//! - Automatic conversion from common error types

use thiserror::Error;

use crate::auth::DeviceFlowError;
use crate::credentials::CredentialError;
use crate::wizard::WizardError;

/// Main error type for infrapilot operations.
///
/// Each variant includes a user-friendly message with actionable recovery steps.
/// Use [`is_retriable`](Self::is_retriable) to decide whether the login wizard
/// should offer the user another attempt.
#[derive(Error, Debug)]
pub enum PilotError {
    /// Device authorization flow error.
    #[error(transparent)]
    DeviceFlow(#[from] DeviceFlowError),

    /// Credential store error.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Wizard definition error.
    #[error(transparent)]
    Wizard(#[from] WizardError),

    /// API returned a non-success status code.
    #[error("API request failed ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out. The server may be slow or unreachable. Try again later.")]
    Timeout,

    /// Network error during HTTP request.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// A login wizard step failed.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Interactive prompt failed (closed stdin, no terminal).
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl PilotError {
    /// Checks if this error is transient and the operation might succeed on retry.
    ///
    /// Returns `true` for network failures and for device-flow outcomes that a
    /// fresh authorization attempt can fix (expired code, cancelled wait).
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::DeviceFlow(err) => err.is_retriable(),
            _ => false,
        }
    }
}

/// Result type alias using [`PilotError`].
pub type Result<T> = std::result::Result<T, PilotError>;

impl From<serde_json::Error> for PilotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for PilotError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<dialoguer::Error> for PilotError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}

impl From<reqwest::Error> for PilotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
