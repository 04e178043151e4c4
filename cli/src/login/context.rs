//! State carried through the login wizard.

use crate::credentials::{Identity, ProviderName};
use crate::wizard::WizardContext;

/// A provider configured during this login, not yet saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredProvider {
    pub name: ProviderName,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
}

/// Running state of the login wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginWizardContext {
    /// GitHub sign-in was skipped, by flag or by choice.
    pub skip_github: Option<bool>,
    pub github_identity: Option<Identity>,
    pub configured_providers: Vec<ConfiguredProvider>,
    pub default_provider: Option<ProviderName>,
    /// Everything was written to the credential store.
    pub completed: Option<bool>,
    /// The user pressed Ctrl-C.
    pub cancelled: Option<bool>,
}

impl LoginWizardContext {
    /// Context for a fresh run.
    #[must_use]
    pub fn new(skip_github: bool) -> Self {
        Self {
            skip_github: skip_github.then_some(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled == Some(true)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed == Some(true)
    }

    #[must_use]
    pub fn skips_github(&self) -> bool {
        self.skip_github == Some(true)
    }
}

/// Partial update to a [`LoginWizardContext`]. Unset fields leave the context alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPatch {
    pub skip_github: Option<bool>,
    pub github_identity: Option<Identity>,
    pub configured_providers: Option<Vec<ConfiguredProvider>>,
    pub default_provider: Option<ProviderName>,
    pub completed: Option<bool>,
    pub cancelled: Option<bool>,
}

impl LoginPatch {
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            cancelled: Some(true),
            ..Self::default()
        }
    }
}

impl WizardContext for LoginWizardContext {
    type Patch = LoginPatch;

    fn merge(self, patch: LoginPatch) -> Self {
        Self {
            skip_github: patch.skip_github.or(self.skip_github),
            github_identity: patch.github_identity.or(self.github_identity),
            configured_providers: patch
                .configured_providers
                .unwrap_or(self.configured_providers),
            default_provider: patch.default_provider.or(self.default_provider),
            completed: patch.completed.or(self.completed),
            cancelled: patch.cancelled.or(self.cancelled),
        }
    }
}
