//! Application configuration settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// Main configuration for infrapilot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Credential file settings.
    pub credentials: CredentialsConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// GitHub device-flow settings.
    pub github: GitHubAuthConfig,
}

/// GitHub OAuth App and API endpoints used by the device flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubAuthConfig {
    /// OAuth App client ID.
    pub client_id: String,
    /// Device authorization endpoint.
    #[serde(with = "url_serde")]
    pub device_code_url: Url,
    /// Token endpoint polled while waiting for the user.
    #[serde(with = "url_serde")]
    pub token_url: Url,
    /// REST API base, used to look up the signed-in user.
    #[serde(with = "url_serde")]
    pub api_url: Url,
    /// Requested scopes.
    pub scopes: Vec<String>,
}

/// Default GitHub OAuth App client ID for infrapilot.
const DEFAULT_CLIENT_ID: &str = "Ov23liInfrapilotCli01";

impl Default for GitHubAuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            device_code_url: Url::parse("https://github.com/login/device/code")
                .expect("valid default URL"),
            token_url: Url::parse("https://github.com/login/oauth/access_token")
                .expect("valid default URL"),
            api_url: Url::parse("https://api.github.com").expect("valid default URL"),
            scopes: vec!["read:user".to_string(), "user:email".to_string()],
        }
    }
}

/// Credential file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Override for the credential file location.
    pub path: Option<PathBuf>,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const GITHUB_CLIENT_ID: &str = "INFRAPILOT_GITHUB_CLIENT_ID";
    pub const CREDENTIALS_FILE: &str = "INFRAPILOT_CREDENTIALS_FILE";
    pub const LOG_LEVEL: &str = "INFRAPILOT_LOG";
}

impl PilotConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(client_id) = std::env::var(env::GITHUB_CLIENT_ID) {
            if !client_id.trim().is_empty() {
                self.auth.github.client_id = client_id;
            }
        }

        if let Ok(path) = std::env::var(env::CREDENTIALS_FILE) {
            if !path.trim().is_empty() {
                self.credentials.path = Some(PathBuf::from(path));
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_github() {
        let config = GitHubAuthConfig::default();
        assert_eq!(config.device_code_url.host_str(), Some("github.com"));
        assert_eq!(config.scopes.len(), 2);
    }

    #[test]
    fn urls_roundtrip_through_toml() {
        let config = PilotConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("https://github.com/login/device/code"));

        let parsed: PilotConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.auth.github.token_url, config.auth.github.token_url);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result: Result<PilotConfig, _> =
            toml::from_str("[auth.github]\napi_url = \"not a url\"\n");
        assert!(result.is_err());
    }
}
