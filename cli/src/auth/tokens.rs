//! Token types for authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token set received from the authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// The access token.
    pub access_token: String,
    /// The refresh token (if provided).
    pub refresh_token: Option<String>,
    /// Token type (usually "bearer").
    pub token_type: String,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    pub scope: Option<String>,
}

impl TokenSet {
    /// Build a token set from a bearer token with no expiry.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: None,
            scope: None,
        }
    }

    /// Check if the access token lifetime has already run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn tokens_without_expiry_never_expire() {
        assert!(!TokenSet::bearer("gho_abc").is_expired());
    }

    #[test]
    fn token_past_its_lifetime_is_expired() {
        let token = TokenSet {
            expires_at: Some(Utc::now() - Duration::minutes(2)),
            ..TokenSet::bearer("gho_abc")
        };
        assert!(token.is_expired());

        let fresh = TokenSet {
            expires_at: Some(Utc::now() + Duration::hours(8)),
            ..TokenSet::bearer("gho_abc")
        };
        assert!(!fresh.is_expired());
    }
}
