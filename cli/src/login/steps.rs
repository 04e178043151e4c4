//! The steps of `infrapilot login`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::{
    open_browser, DeviceAuthFlow, DeviceFlowError, DeviceFlowTransport, GitHubApi,
};
use crate::credentials::{CredentialStore, Identity, ProviderCredential, ProviderName};
use crate::error::{PilotError, Result};
use crate::login::context::{ConfiguredProvider, LoginPatch, LoginWizardContext};
use crate::login::prompt::Prompter;
use crate::wizard::{StepResult, Wizard, WizardStep};

/// Suggested base URL for a local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Flags from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginOptions {
    /// Reconfigure without asking, even if credentials exist.
    pub force: bool,
    /// Do not offer GitHub sign-in.
    pub skip_github: bool,
    /// Print the verification URL instead of opening a browser.
    pub no_browser: bool,
}

/// Collaborators shared by the login steps.
#[derive(Clone)]
pub struct LoginDeps {
    pub store: Arc<CredentialStore>,
    pub prompter: Arc<dyn Prompter>,
    pub transport: Arc<dyn DeviceFlowTransport>,
    pub github: Arc<dyn GitHubApi>,
    pub options: LoginOptions,
    /// Fired on Ctrl-C.
    pub cancel: CancellationToken,
}

/// Builds the login wizard.
///
/// # Errors
///
/// Returns an error if the step list is malformed.
pub fn login_wizard(deps: &LoginDeps) -> Result<Wizard<LoginWizardContext>> {
    let steps: Vec<Box<dyn WizardStep<LoginWizardContext>>> = vec![
        Box::new(ExistingConfigStep {
            store: Arc::clone(&deps.store),
            prompter: Arc::clone(&deps.prompter),
            force: deps.options.force,
        }),
        Box::new(GitHubStep {
            transport: Arc::clone(&deps.transport),
            github: Arc::clone(&deps.github),
            prompter: Arc::clone(&deps.prompter),
            no_browser: deps.options.no_browser,
            cancel: deps.cancel.clone(),
        }),
        Box::new(ProvidersStep {
            store: Arc::clone(&deps.store),
            prompter: Arc::clone(&deps.prompter),
            cancel: deps.cancel.clone(),
        }),
        Box::new(DefaultProviderStep {
            prompter: Arc::clone(&deps.prompter),
        }),
        Box::new(SaveStep {
            store: Arc::clone(&deps.store),
            prompter: Arc::clone(&deps.prompter),
        }),
    ];

    Ok(Wizard::new(steps)?)
}

/// Asks before overwriting an existing setup.
struct ExistingConfigStep {
    store: Arc<CredentialStore>,
    prompter: Arc<dyn Prompter>,
    force: bool,
}

#[async_trait]
impl WizardStep<LoginWizardContext> for ExistingConfigStep {
    fn id(&self) -> &'static str {
        "existing-config"
    }

    fn title(&self) -> &'static str {
        "Existing configuration"
    }

    fn condition(&self, _context: &LoginWizardContext) -> bool {
        !self.force && self.store.exists()
    }

    async fn execute(&self, _context: &LoginWizardContext) -> StepResult<LoginPatch> {
        let status = self.store.status();
        let names: Vec<String> = status
            .providers
            .iter()
            .map(|p| {
                if p.is_default {
                    format!("{} (default)", p.name)
                } else {
                    p.name.to_string()
                }
            })
            .collect();

        self.prompter
            .note(&format!("Already configured: {}", names.join(", ")));
        if let Some(identity) = &status.identity {
            self.prompter
                .note(&format!("Signed in to GitHub as {}", identity.username));
        }

        match self.prompter.confirm("Reconfigure?", false) {
            Ok(true) => StepResult::next(),
            Ok(false) => StepResult::SkipRemaining,
            Err(e) => StepResult::failed(e.to_string()),
        }
    }
}

/// Optional GitHub sign-in through the device flow.
struct GitHubStep {
    transport: Arc<dyn DeviceFlowTransport>,
    github: Arc<dyn GitHubApi>,
    prompter: Arc<dyn Prompter>,
    no_browser: bool,
    cancel: CancellationToken,
}

impl GitHubStep {
    async fn authenticate(&self) -> Result<Identity> {
        let mut flow = DeviceAuthFlow::new(Arc::clone(&self.transport));
        let prompt = flow.initiate().await?;

        self.prompter.note("To sign in, visit:");
        self.prompter.note(&format!("  {}", prompt.verification_uri));
        self.prompter
            .note(&format!("and enter code: {}", prompt.user_code));
        self.prompter.note(&format!(
            "The code expires in {} minutes.",
            prompt.expires_in.as_secs().div_ceil(60)
        ));

        if !self.no_browser {
            if open_browser(&prompt) {
                self.prompter.note("Browser opened automatically.");
            } else {
                self.prompter
                    .note("Could not open browser. Please visit the URL manually.");
            }
        }

        self.prompter
            .note("Waiting for authorization... (Ctrl-C to cancel)");
        let token = match flow
            .wait_for_authorization(
                |attempt| debug!(attempt, "Still waiting for authorization"),
                &self.cancel,
            )
            .await
        {
            Ok(token) => token,
            Err(err) => {
                debug!(state = ?flow.state(), "Device flow stopped");
                return Err(err.into());
            },
        };

        self.github.fetch_identity(&token).await
    }

    fn skip() -> StepResult<LoginPatch> {
        StepResult::patch(LoginPatch {
            skip_github: Some(true),
            ..LoginPatch::default()
        })
    }
}

#[async_trait]
impl WizardStep<LoginWizardContext> for GitHubStep {
    fn id(&self) -> &'static str {
        "github"
    }

    fn title(&self) -> &'static str {
        "Sign in with GitHub"
    }

    fn can_skip(&self) -> bool {
        true
    }

    fn condition(&self, context: &LoginWizardContext) -> bool {
        !context.skips_github() && !context.is_cancelled()
    }

    async fn execute(&self, _context: &LoginWizardContext) -> StepResult<LoginPatch> {
        match self.prompter.confirm("Sign in with GitHub? (optional)", true) {
            Ok(true) => {},
            Ok(false) => return Self::skip(),
            Err(e) => return StepResult::failed(e.to_string()),
        }

        loop {
            let err = match self.authenticate().await {
                Ok(identity) => {
                    self.prompter
                        .note(&format!("Signed in as {}.", identity.username));
                    return StepResult::patch(LoginPatch {
                        github_identity: Some(identity),
                        ..LoginPatch::default()
                    });
                },
                Err(PilotError::DeviceFlow(DeviceFlowError::Cancelled))
                    if self.cancel.is_cancelled() =>
                {
                    return StepResult::patch(LoginPatch::cancelled());
                },
                Err(err) => err,
            };

            self.prompter.note(&format!("GitHub sign-in failed: {err}"));

            let choices = ["Try again".to_string(), "Skip GitHub sign-in".to_string()];
            let default = usize::from(!err.is_retriable());
            match self.prompter.select("What now?", &choices, default) {
                Ok(0) => continue,
                Ok(_) => return Self::skip(),
                Err(e) => return StepResult::failed(e.to_string()),
            }
        }
    }
}

/// Collects one or more LLM providers.
struct ProvidersStep {
    store: Arc<CredentialStore>,
    prompter: Arc<dyn Prompter>,
    cancel: CancellationToken,
}

impl ProvidersStep {
    fn collect(&self, mut configured: Vec<ConfiguredProvider>) -> Result<LoginPatch> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(LoginPatch::cancelled());
            }

            let remaining: Vec<ProviderName> = ProviderName::ALL
                .into_iter()
                .filter(|name| configured.iter().all(|p| p.name != *name))
                .collect();
            if remaining.is_empty() {
                break;
            }

            let items: Vec<String> = remaining
                .iter()
                .map(|name| name.display_name().to_string())
                .collect();
            let choice = self
                .prompter
                .select("Which LLM provider do you want to use?", &items, 0)?;
            let name = remaining[choice];

            configured.push(self.configure(name)?);

            if self.cancel.is_cancelled() {
                return Ok(LoginPatch::cancelled());
            }
            if remaining.len() == 1 || !self.prompter.confirm("Configure another provider?", false)? {
                break;
            }
        }

        Ok(LoginPatch {
            configured_providers: Some(configured),
            ..LoginPatch::default()
        })
    }

    fn configure(&self, name: ProviderName) -> Result<ConfiguredProvider> {
        let api_key = if name.requires_api_key() {
            self.ask_api_key(name)?
        } else {
            None
        };

        let base_url = match name.base_url_env() {
            Some(_) => {
                let suggested = self
                    .store
                    .base_url(name)
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
                let url = self.prompter.input(
                    &format!("{} base URL", name.display_name()),
                    Some(&suggested),
                )?;
                Some(non_empty(url).unwrap_or(suggested))
            },
            None => None,
        };

        let model = self
            .prompter
            .input("Model", Some(name.default_model()))?;
        let model = non_empty(model).unwrap_or_else(|| name.default_model().to_string());

        Ok(ConfiguredProvider {
            name,
            api_key,
            base_url,
            model,
        })
    }

    /// `None` means "use the environment variable".
    fn ask_api_key(&self, name: ProviderName) -> Result<Option<String>> {
        if let (Some(var), Some(key)) = (name.api_key_env(), self.store.env_api_key(name)) {
            let question = format!(
                "Use {var} from your environment ({})?",
                CredentialStore::mask_secret(&key)
            );
            if self.prompter.confirm(&question, true)? {
                return Ok(None);
            }
        }

        loop {
            let key = self
                .prompter
                .secret(&format!("{} API key", name.display_name()))?;
            if let Some(key) = non_empty(key) {
                return Ok(Some(key));
            }
            self.prompter.note("An API key is required for this provider.");
        }
    }
}

#[async_trait]
impl WizardStep<LoginWizardContext> for ProvidersStep {
    fn id(&self) -> &'static str {
        "providers"
    }

    fn title(&self) -> &'static str {
        "Configure LLM providers"
    }

    fn condition(&self, context: &LoginWizardContext) -> bool {
        !context.is_cancelled()
    }

    async fn execute(&self, context: &LoginWizardContext) -> StepResult<LoginPatch> {
        match self.collect(context.configured_providers.clone()) {
            Ok(patch) => StepResult::patch(patch),
            Err(e) => StepResult::failed(e.to_string()),
        }
    }
}

/// Picks the default when more than one provider was configured.
struct DefaultProviderStep {
    prompter: Arc<dyn Prompter>,
}

#[async_trait]
impl WizardStep<LoginWizardContext> for DefaultProviderStep {
    fn id(&self) -> &'static str {
        "default-provider"
    }

    fn title(&self) -> &'static str {
        "Choose a default provider"
    }

    fn condition(&self, context: &LoginWizardContext) -> bool {
        !context.is_cancelled() && context.configured_providers.len() > 1
    }

    async fn execute(&self, context: &LoginWizardContext) -> StepResult<LoginPatch> {
        let providers = &context.configured_providers;
        let items: Vec<String> = providers
            .iter()
            .map(|p| format!("{} ({})", p.name.display_name(), p.model))
            .collect();

        match self
            .prompter
            .select("Which provider should be the default?", &items, 0)
        {
            Ok(index) => StepResult::patch(LoginPatch {
                default_provider: providers.get(index).map(|p| p.name),
                ..LoginPatch::default()
            }),
            Err(e) => StepResult::failed(e.to_string()),
        }
    }
}

/// Writes everything collected to the credential store.
struct SaveStep {
    store: Arc<CredentialStore>,
    prompter: Arc<dyn Prompter>,
}

impl SaveStep {
    fn save(&self, context: &LoginWizardContext) -> Result<Option<ProviderName>> {
        if let Some(identity) = &context.github_identity {
            self.store.set_identity(identity.clone())?;
        }

        let default = context
            .default_provider
            .or_else(|| context.configured_providers.first().map(|p| p.name));

        for provider in &context.configured_providers {
            self.store.set_provider(
                provider.name,
                ProviderCredential {
                    api_key: provider.api_key.clone(),
                    base_url: provider.base_url.clone(),
                    is_default: (Some(provider.name) == default).then_some(true),
                    ..ProviderCredential::with_model(provider.model.clone())
                },
            )?;
        }

        if let Some(name) = default {
            self.store.set_default_provider(name)?;
        }

        Ok(default)
    }
}

#[async_trait]
impl WizardStep<LoginWizardContext> for SaveStep {
    fn id(&self) -> &'static str {
        "save"
    }

    fn title(&self) -> &'static str {
        "Save credentials"
    }

    fn condition(&self, context: &LoginWizardContext) -> bool {
        !context.is_cancelled() && !context.configured_providers.is_empty()
    }

    async fn execute(&self, context: &LoginWizardContext) -> StepResult<LoginPatch> {
        match self.save(context) {
            Ok(default) => {
                self.prompter.note(&format!(
                    "Saved credentials to {}",
                    self.store.path().display()
                ));
                StepResult::patch(LoginPatch {
                    default_provider: default,
                    completed: Some(true),
                    ..LoginPatch::default()
                })
            },
            Err(e) => StepResult::failed(e.to_string()),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
