//! Credential-store error types.

use thiserror::Error;

/// Errors specific to credential store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Provider name is not configured (or not a known provider at all).
    #[error("Provider '{0}' is not configured. Run 'infrapilot login' to add it.")]
    UnknownProvider(String),

    /// `save` was called with nothing loaded and nothing supplied.
    #[error("No credential data to save. Load or supply a credential file first.")]
    NoFileToSave,
}
