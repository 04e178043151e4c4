//! Credential file data types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::error::CredentialError;
use crate::credentials::store::CredentialStore;

/// Schema version written by this build. Older files are normalized to it on load.
pub const CURRENT_VERSION: u32 = 1;

/// LLM backends the credential store knows how to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    Ollama,
}

impl ProviderName {
    /// Every known provider, in menu order.
    pub const ALL: [Self; 5] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Mistral,
        Self::Ollama,
    ];

    /// Identifier used in the credential file and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Mistral => "mistral",
            Self::Ollama => "ollama",
        }
    }

    /// Human-readable name for prompts and status output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Google Gemini",
            Self::Mistral => "Mistral",
            Self::Ollama => "Ollama (local)",
        }
    }

    /// Ollama runs locally and takes no key; everything else needs one.
    #[must_use]
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Environment variable consulted when no key is stored.
    #[must_use]
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Mistral => Some("MISTRAL_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Environment variable consulted when no base URL is stored.
    #[must_use]
    pub const fn base_url_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => Some("OLLAMA_BASE_URL"),
            _ => None,
        }
    }

    /// Model suggested by the login wizard.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-3-5-sonnet-latest",
            Self::Gemini => "gemini-1.5-pro",
            Self::Mistral => "mistral-large-latest",
            Self::Ollama => "llama3.1",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| CredentialError::UnknownProvider(s.to_string()))
    }
}

/// A signed-in identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Login name at the identity provider.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Bearer token obtained from the device flow.
    pub access_token: String,
    pub authenticated_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("avatar_url", &self.avatar_url)
            .field("access_token", &CredentialStore::mask_secret(&self.access_token))
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

/// One identity per supported identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<Identity>,
}

/// Stored configuration for one LLM provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    /// Write-time hint only. [`CredentialFile::default_provider`] is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl ProviderCredential {
    /// Credential with only a model set.
    #[must_use]
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: model.into(),
            validated_at: None,
            is_default: None,
        }
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field(
                "api_key",
                &self.api_key.as_deref().map(CredentialStore::mask_secret),
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("validated_at", &self.validated_at)
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// The persisted credential document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFile {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub identity: IdentitySlots,
    #[serde(default)]
    pub providers: BTreeMap<ProviderName, ProviderCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<ProviderName>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialFile {
    /// Empty file stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: CURRENT_VERSION,
            identity: IdentitySlots::default(),
            providers: BTreeMap::new(),
            default_provider: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bring a freshly parsed file up to the current schema.
    pub(crate) fn normalize(&mut self) {
        self.version = CURRENT_VERSION;
        self.ensure_default();
    }

    /// Re-establish the default-provider invariant.
    ///
    /// No providers means no default. Otherwise the default must name a
    /// configured provider; when it doesn't, the first one in key order takes over.
    pub(crate) fn ensure_default(&mut self) {
        match self.default_provider {
            Some(name) if self.providers.contains_key(&name) => {},
            _ => self.default_provider = self.providers.keys().next().copied(),
        }
    }
}

impl Default for CredentialFile {
    fn default() -> Self {
        Self::new()
    }
}
