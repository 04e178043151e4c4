//! Device authorization error taxonomy.

use thiserror::Error;

/// Errors produced while driving the OAuth device authorization grant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceFlowError {
    /// `poll()` was called before `initiate()`.
    #[error("Device authorization has not been started.")]
    NotInitiated,

    /// The user has not finished authorizing yet. Not terminal.
    #[error("Authorization is still pending.")]
    AuthorizationPending,

    /// The server asked the client to poll less often. Not terminal.
    #[error("Authorization server asked to slow down. Retry later.")]
    SlowDown,

    /// Device code expired before the user completed authorization.
    #[error("Device code expired. Run 'infrapilot login' again and complete authorization within the time limit.")]
    Expired,

    /// User denied the authorization request.
    #[error("Authorization was denied. If this was unintentional, run 'infrapilot login' to try again.")]
    Denied,

    /// The wait was cancelled by the caller.
    #[error("Authorization was cancelled.")]
    Cancelled,

    /// Unclassified error reported by the authorization server.
    #[error("Authorization failed: {0}")]
    Unknown(String),

    /// The request itself failed (network, malformed response).
    #[error("Device authorization request failed: {0}")]
    Request(String),
}

impl DeviceFlowError {
    /// Whether the caller should keep polling after this error.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::AuthorizationPending | Self::SlowDown)
    }

    /// Whether starting a fresh authorization could succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Expired | Self::Cancelled | Self::Request(_))
    }
}

/// Result alias for device-flow operations.
pub type DeviceFlowResult<T> = std::result::Result<T, DeviceFlowError>;
