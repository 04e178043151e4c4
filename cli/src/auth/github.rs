//! GitHub REST client used to resolve who just signed in.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::auth::tokens::TokenSet;
use crate::config::GitHubAuthConfig;
use crate::credentials::Identity;
use crate::error::{PilotError, Result};

/// Looks up the GitHub account behind an access token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetches the profile for `token` and turns it into an [`Identity`].
    ///
    /// # Errors
    ///
    /// Returns an error if the profile request fails or is rejected.
    async fn fetch_identity(&self, token: &TokenSet) -> Result<Identity>;
}

/// `reqwest`-backed [`GitHubApi`].
pub struct GitHubClient {
    client: Client,
    api_url: Url,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GitHubAuthConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("infrapilot/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        // Keep any path prefix (GitHub Enterprise `/api/v3`) when joining.
        let mut api_url = config.api_url.clone();
        if !api_url.path().ends_with('/') {
            api_url.set_path(&format!("{}/", api_url.path()));
        }

        Ok(Self { client, api_url })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str, token: &TokenSet) -> Result<T> {
        let url = self.api_url.join(path)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&token.access_token)
            .header(http::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PilotError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| PilotError::Serialization(e.to_string()))
    }

    async fn primary_email(&self, token: &TokenSet) -> Option<String> {
        match self.get::<Vec<GitHubEmail>>("user/emails", token).await {
            Ok(emails) => emails
                .into_iter()
                .find(|e| e.primary && e.verified)
                .map(|e| e.email),
            Err(e) => {
                debug!("Could not read GitHub emails: {e}");
                None
            },
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn fetch_identity(&self, token: &TokenSet) -> Result<Identity> {
        let user: GitHubUser = self.get("user", token).await?;

        let email = match user.email {
            Some(email) => Some(email),
            None => self.primary_email(token).await,
        };

        debug!(username = %user.login, "Resolved GitHub identity");

        Ok(Identity {
            username: user.login,
            name: user.name,
            email,
            avatar_url: user.avatar_url,
            access_token: token.access_token.clone(),
            authenticated_at: Utc::now(),
        })
    }
}
