//! Read-only status projection of the credential store.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::credentials::types::ProviderName;

/// Where a provider's API key comes from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The provider works without a key.
    NotRequired,
    /// Stored in the credential file.
    Stored,
    /// Taken from the provider's environment variable.
    Environment(&'static str),
    /// Needed but not available.
    Missing,
}

/// Summary of the signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityStatus {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub authenticated_at: DateTime<Utc>,
}

/// Summary of one configured provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub name: ProviderName,
    pub model: String,
    pub is_default: bool,
    pub key_source: KeySource,
    /// Masked form of the resolved key, for display.
    pub masked_key: Option<String>,
    pub base_url: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
}

/// Display-only view combining identity, providers and the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    /// Location of the credential file.
    pub path: PathBuf,
    pub identity: Option<IdentityStatus>,
    pub providers: Vec<ProviderStatus>,
    pub default_provider: Option<ProviderName>,
}

impl CredentialStatus {
    /// At least one provider is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Providers that need a key but have none.
    pub fn missing_keys(&self) -> impl Iterator<Item = ProviderName> + '_ {
        self.providers
            .iter()
            .filter(|p| p.key_source == KeySource::Missing)
            .map(|p| p.name)
    }
}
