//! File-backed credential storage.
//!
//! This module provides persistence for the credential file:
//! - [`CredentialStore`] - Cached, single-writer access to one JSON file
//!
//! The file is written with owner-only permissions (0600 on Unix) inside a
//! directory created owner-only (0700) when missing. There is no file
//! locking: concurrent processes race on a last-write-wins basis.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{credentials_path, PilotConfig};
use crate::credentials::error::CredentialError;
use crate::credentials::status::{CredentialStatus, IdentityStatus, KeySource, ProviderStatus};
use crate::credentials::types::{CredentialFile, Identity, ProviderCredential, ProviderName};
use crate::error::Result;

/// Shown in place of secrets too short to reveal any part of.
const MASK_PLACEHOLDER: &str = "********";

/// Environment lookup used for API-key and base-URL fallbacks.
type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Cached access to the credential file.
///
/// The store is the single owner of the last loaded [`CredentialFile`]; every
/// mutation goes through it, is persisted immediately and only then replaces
/// the cached copy. Share it between components with an `Arc`.
pub struct CredentialStore {
    path: PathBuf,
    cache: Mutex<Option<CredentialFile>>,
    env: EnvLookup,
}

impl CredentialStore {
    /// Creates a store for the credential file at `path`.
    ///
    /// Nothing is read until the first [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Creates a store at the location resolved from configuration.
    pub fn from_config(config: &PilotConfig) -> Result<Self> {
        Ok(Self::new(credentials_path(config)?))
    }

    /// Replaces the environment lookup used for fallbacks.
    #[cfg(test)]
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the credential file, reading it from disk on first use.
    ///
    /// A missing file yields a fresh empty one (not written). An unreadable or
    /// corrupted file is logged and also replaced by a fresh empty one.
    pub fn load(&self) -> CredentialFile {
        let mut cache = self.cache();
        if let Some(file) = cache.as_ref() {
            return file.clone();
        }

        let file = self.read_from_disk();
        *cache = Some(file.clone());
        file
    }

    /// Discards the cached copy and reads the file again.
    #[allow(dead_code)]
    pub fn reload(&self) -> CredentialFile {
        *self.cache() = None;
        self.load()
    }

    /// Persists `file`, or the cached copy when `None`.
    ///
    /// Repairs the default provider, stamps `updated_at`, writes the file
    /// owner-only and caches the result.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NoFileToSave`] when there is nothing to save,
    /// and I/O errors unchanged.
    #[allow(dead_code)]
    pub fn save(&self, file: Option<CredentialFile>) -> Result<()> {
        let mut cache = self.cache();
        let mut file = file
            .or_else(|| cache.clone())
            .ok_or(CredentialError::NoFileToSave)?;

        file.normalize();
        self.write_to_disk(&mut file)?;
        *cache = Some(file);
        Ok(())
    }

    /// True when the file exists on disk and configures at least one provider.
    pub fn exists(&self) -> bool {
        self.path.exists() && !self.load().providers.is_empty()
    }

    /// Builds the display-only status view.
    pub fn status(&self) -> CredentialStatus {
        let file = self.load();

        let identity = file.identity.github.as_ref().map(|id| IdentityStatus {
            username: id.username.clone(),
            name: id.name.clone(),
            email: id.email.clone(),
            authenticated_at: id.authenticated_at,
        });

        let providers = file
            .providers
            .iter()
            .map(|(&name, credential)| {
                let (key_source, key) = self.resolve_key(name, credential);
                ProviderStatus {
                    name,
                    model: credential.model.clone(),
                    is_default: file.default_provider == Some(name),
                    key_source,
                    masked_key: key.as_deref().map(Self::mask_secret),
                    base_url: self.resolve_base_url(name, credential),
                    validated_at: credential.validated_at,
                }
            })
            .collect();

        CredentialStatus {
            path: self.path.clone(),
            identity,
            providers,
            default_provider: file.default_provider,
        }
    }

    /// Stores the GitHub identity, replacing any previous one.
    pub fn set_identity(&self, identity: Identity) -> Result<()> {
        info!(username = %identity.username, "Saving GitHub identity");
        self.update(|file| {
            file.identity.github = Some(identity);
            Ok(())
        })
    }

    /// Removes the GitHub identity. Returns whether one was present.
    pub fn clear_identity(&self) -> Result<bool> {
        if self.identity().is_none() {
            return Ok(false);
        }
        self.update(|file| Ok(file.identity.github.take().is_some()))
    }

    /// The stored GitHub identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.load().identity.github
    }

    /// Inserts or replaces a provider and persists the file.
    ///
    /// The provider becomes the default when it is the first one configured
    /// or when `credential.is_default` is set.
    pub fn set_provider(&self, name: ProviderName, credential: ProviderCredential) -> Result<()> {
        debug!(provider = %name, model = %credential.model, "Saving provider credentials");
        self.update(|file| {
            let make_default = file.providers.is_empty() || credential.is_default == Some(true);
            file.providers.insert(name, credential);
            if make_default {
                file.default_provider = Some(name);
            }
            file.ensure_default();
            Ok(())
        })
    }

    /// Removes a provider. Returns whether it was configured.
    ///
    /// Removing the default promotes the first remaining provider.
    pub fn remove_provider(&self, name: ProviderName) -> Result<bool> {
        if !self.load().providers.contains_key(&name) {
            return Ok(false);
        }

        self.update(|file| {
            file.providers.remove(&name);
            file.ensure_default();
            debug!(removed = %name, default = ?file.default_provider, "Removed provider");
            Ok(true)
        })
    }

    /// The stored credential for a provider.
    pub fn provider(&self, name: ProviderName) -> Option<ProviderCredential> {
        self.load().providers.get(&name).cloned()
    }

    /// Name of the default provider.
    pub fn default_provider(&self) -> Option<ProviderName> {
        self.load().default_provider
    }

    /// Makes an already configured provider the default.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::UnknownProvider`] if `name` is not configured.
    pub fn set_default_provider(&self, name: ProviderName) -> Result<()> {
        self.update(|file| {
            if !file.providers.contains_key(&name) {
                return Err(CredentialError::UnknownProvider(name.to_string()).into());
            }
            file.default_provider = Some(name);
            Ok(())
        })
    }

    /// Records that a provider's credentials were just verified.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::UnknownProvider`] if `name` is not configured.
    #[allow(dead_code)]
    pub fn mark_validated(&self, name: ProviderName) -> Result<()> {
        self.update(|file| {
            let credential = file
                .providers
                .get_mut(&name)
                .ok_or_else(|| CredentialError::UnknownProvider(name.to_string()))?;
            credential.validated_at = Some(Utc::now());
            Ok(())
        })
    }

    /// Resolves the API key: stored value, then environment, then nothing.
    ///
    /// Providers that need no key always resolve to `None`.
    #[allow(dead_code)]
    pub fn api_key(&self, name: ProviderName) -> Option<String> {
        match self.provider(name) {
            Some(credential) => self.resolve_key(name, &credential).1,
            None => self.env_api_key(name),
        }
    }

    /// Resolves the base URL: stored value, then environment, then nothing.
    pub fn base_url(&self, name: ProviderName) -> Option<String> {
        match self.provider(name) {
            Some(credential) => self.resolve_base_url(name, &credential),
            None => name.base_url_env().and_then(|var| self.env_value(var)),
        }
    }

    /// The provider's API key as found in its environment variable.
    pub fn env_api_key(&self, name: ProviderName) -> Option<String> {
        name.api_key_env().and_then(|var| self.env_value(var))
    }

    /// Drops the cache and deletes the file. Succeeds if it is already gone.
    pub fn clear(&self) -> Result<()> {
        let mut cache = self.cache();
        *cache = None;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed credential file");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Renders a secret for display.
    ///
    /// Secrets of eight characters or fewer become a fixed placeholder; longer
    /// ones keep their first 7 and last 4 characters around an ellipsis.
    #[must_use]
    pub fn mask_secret(secret: &str) -> String {
        let chars: Vec<char> = secret.chars().collect();
        if chars.len() <= 8 {
            return MASK_PLACEHOLDER.to_string();
        }

        let head: String = chars[..7].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }

    fn cache(&self) -> MutexGuard<'_, Option<CredentialFile>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `mutate` to the current file, persists it, then caches it.
    ///
    /// The cache is left untouched when either step fails.
    fn update<R>(&self, mutate: impl FnOnce(&mut CredentialFile) -> Result<R>) -> Result<R> {
        let mut cache = self.cache();
        let mut file = match cache.as_ref() {
            Some(file) => file.clone(),
            None => self.read_from_disk(),
        };

        let output = mutate(&mut file)?;
        self.write_to_disk(&mut file)?;
        *cache = Some(file);
        Ok(output)
    }

    fn resolve_key(
        &self,
        name: ProviderName,
        credential: &ProviderCredential,
    ) -> (KeySource, Option<String>) {
        if !name.requires_api_key() {
            return (KeySource::NotRequired, None);
        }

        if let Some(key) = credential.api_key.as_ref().filter(|k| !k.is_empty()) {
            return (KeySource::Stored, Some(key.clone()));
        }

        match name.api_key_env() {
            Some(var) => match self.env_value(var) {
                Some(key) => (KeySource::Environment(var), Some(key)),
                None => (KeySource::Missing, None),
            },
            None => (KeySource::Missing, None),
        }
    }

    fn resolve_base_url(&self, name: ProviderName, credential: &ProviderCredential) -> Option<String> {
        credential
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| name.base_url_env().and_then(|var| self.env_value(var)))
    }

    fn env_value(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.trim().is_empty())
    }

    fn read_from_disk(&self) -> CredentialFile {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No credential file yet");
                return CredentialFile::new();
            },
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not read credential file, continuing with empty credentials"
                );
                return CredentialFile::new();
            },
        };

        match serde_json::from_str::<CredentialFile>(&contents) {
            Ok(mut file) => {
                file.normalize();
                file
            },
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Credential file is corrupted, continuing with empty credentials"
                );
                CredentialFile::new()
            },
        }
    }

    fn write_to_disk(&self, file: &mut CredentialFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_private_dir(parent)?;
        }

        file.updated_at = Utc::now();
        let json = serde_json::to_string_pretty(file)?;
        write_private(&self.path, json.as_bytes())?;

        debug!(path = %self.path.display(), "Wrote credential file");
        Ok(())
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Creates `dir` (owner-only) if it does not exist yet.
fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Writes through a sibling temp file, renames it into place and forces 0600.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = write_and_rename(&tmp_path, path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    set_owner_only(path)
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut tmp = options.open(tmp_path)?;
    tmp.write_all(contents)?;
    tmp.sync_all()?;
    drop(tmp);

    fs::rename(tmp_path, path)
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use crate::error::PilotError;

    fn test_store() -> (CredentialStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("infrapilot").join("credentials.json"))
            .with_env(|_| None);
        (store, dir)
    }

    fn store_with_env(vars: &[(&str, &str)]) -> (CredentialStore, TempDir) {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let (store, dir) = test_store();
        (store.with_env(move |key| vars.get(key).cloned()), dir)
    }

    fn assert_default_invariant(store: &CredentialStore) {
        let file = store.load();
        match file.default_provider {
            None => assert!(file.providers.is_empty()),
            Some(name) => assert!(file.providers.contains_key(&name)),
        }
    }

    #[test]
    fn load_without_file_returns_empty_and_writes_nothing() {
        let (store, _dir) = test_store();

        let file = store.load();

        assert!(file.providers.is_empty());
        assert!(file.default_provider.is_none());
        assert_eq!(file.version, crate::credentials::types::CURRENT_VERSION);
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupted_file_falls_back_to_empty() {
        let (store, _dir) = test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        let file = store.load();

        assert!(file.providers.is_empty());
        assert!(file.identity.github.is_none());
    }

    #[test]
    fn save_then_load_returns_saved_file() {
        let (store, _dir) = test_store();
        let mut file = CredentialFile::new();
        file.providers.insert(
            ProviderName::Anthropic,
            ProviderCredential {
                api_key: Some("sk-ant-0123456789".to_string()),
                ..ProviderCredential::with_model("claude-3-5-sonnet-latest")
            },
        );
        file.default_provider = Some(ProviderName::Anthropic);
        let before = Utc::now();

        store.save(Some(file.clone())).unwrap();
        let loaded = store.load();

        assert!(loaded.updated_at >= before);
        assert_eq!(
            CredentialFile {
                updated_at: file.updated_at,
                ..loaded.clone()
            },
            file
        );

        // And the same from disk.
        let from_disk = store.reload();
        assert_eq!(from_disk, loaded);
    }

    #[test]
    fn save_without_anything_loaded_fails() {
        let (store, _dir) = test_store();

        let err = store.save(None).unwrap_err();

        assert!(matches!(
            err,
            PilotError::Credential(CredentialError::NoFileToSave)
        ));
    }

    #[test]
    fn save_repairs_missing_default() {
        let (store, _dir) = test_store();
        let mut file = CredentialFile::new();
        file.version = 0;
        file.providers.insert(
            ProviderName::OpenAi,
            ProviderCredential::with_model("gpt-4o"),
        );

        store.save(Some(file)).unwrap();

        assert_eq!(store.load().default_provider, Some(ProviderName::OpenAi));
        let raw: CredentialFile =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.default_provider, Some(ProviderName::OpenAi));
        assert_eq!(raw.version, crate::credentials::types::CURRENT_VERSION);
    }

    #[test]
    fn save_uses_cached_file() {
        let (store, _dir) = test_store();
        let _ = store.load();

        store.save(None).unwrap();

        assert!(store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-4o"))
            .unwrap();

        let file_mode = fs::metadata(store.path()).unwrap().permissions().mode();
        let dir_mode = fs::metadata(store.path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_loose_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _dir) = test_store();
        store.save(Some(CredentialFile::new())).unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(None).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn exists_tracks_configured_providers() {
        let (store, _dir) = test_store();
        assert!(!store.exists());

        store.save(Some(CredentialFile::new())).unwrap();
        assert!(!store.exists(), "a provider-less file is not authenticated");

        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();
        assert!(store.exists());

        store.clear().unwrap();
        assert!(!store.exists());
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let (store, _dir) = test_store();
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn first_provider_becomes_default() {
        let (store, _dir) = test_store();

        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();

        assert_eq!(store.status().default_provider, Some(ProviderName::OpenAi));
    }

    #[test]
    fn explicit_default_hint_takes_over() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();
        store
            .set_provider(ProviderName::Gemini, ProviderCredential::with_model("gemini"))
            .unwrap();
        assert_eq!(store.default_provider(), Some(ProviderName::OpenAi));

        store
            .set_provider(
                ProviderName::Mistral,
                ProviderCredential {
                    is_default: Some(true),
                    ..ProviderCredential::with_model("mistral-large-latest")
                },
            )
            .unwrap();

        assert_eq!(store.default_provider(), Some(ProviderName::Mistral));
    }

    #[test]
    fn removing_default_promotes_remaining_provider() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();
        store
            .set_provider(ProviderName::Anthropic, ProviderCredential::with_model("claude"))
            .unwrap();
        assert_eq!(store.default_provider(), Some(ProviderName::OpenAi));

        assert!(store.remove_provider(ProviderName::OpenAi).unwrap());

        assert_eq!(
            store.status().default_provider,
            Some(ProviderName::Anthropic)
        );
    }

    #[test]
    fn removing_non_default_keeps_default() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::Gemini, ProviderCredential::with_model("gemini"))
            .unwrap();
        store
            .set_provider(ProviderName::Ollama, ProviderCredential::with_model("llama3.1"))
            .unwrap();

        assert!(store.remove_provider(ProviderName::Ollama).unwrap());
        assert!(!store.remove_provider(ProviderName::Ollama).unwrap());

        assert_eq!(store.default_provider(), Some(ProviderName::Gemini));
    }

    #[test]
    fn removing_last_provider_clears_default() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::Ollama, ProviderCredential::with_model("llama3.1"))
            .unwrap();

        store.remove_provider(ProviderName::Ollama).unwrap();

        assert!(store.default_provider().is_none());
        assert!(store.reload().default_provider.is_none());
    }

    #[test]
    fn default_invariant_holds_across_mutation_sequences() {
        let (store, _dir) = test_store();
        let ops: &[(bool, ProviderName, bool)] = &[
            (true, ProviderName::Mistral, false),
            (true, ProviderName::OpenAi, false),
            (true, ProviderName::Gemini, true),
            (false, ProviderName::Gemini, false),
            (false, ProviderName::Mistral, false),
            (true, ProviderName::Ollama, false),
            (false, ProviderName::OpenAi, false),
            (false, ProviderName::Ollama, false),
            (true, ProviderName::Anthropic, false),
            (false, ProviderName::Anthropic, false),
        ];

        for &(add, name, make_default) in ops {
            if add {
                let credential = ProviderCredential {
                    is_default: make_default.then_some(true),
                    ..ProviderCredential::with_model("m")
                };
                store.set_provider(name, credential).unwrap();
                if make_default {
                    assert_eq!(store.default_provider(), Some(name));
                }
            } else {
                store.remove_provider(name).unwrap();
            }
            assert_default_invariant(&store);
            assert_eq!(store.reload(), store.load());
            assert_default_invariant(&store);
        }
    }

    #[test]
    fn set_default_requires_configured_provider() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();

        let err = store.set_default_provider(ProviderName::Gemini).unwrap_err();
        assert!(matches!(
            err,
            PilotError::Credential(CredentialError::UnknownProvider(name)) if name == "gemini"
        ));

        store
            .set_provider(ProviderName::Gemini, ProviderCredential::with_model("gemini"))
            .unwrap();
        store.set_default_provider(ProviderName::Gemini).unwrap();
        assert_eq!(store.reload().default_provider, Some(ProviderName::Gemini));
    }

    #[test]
    fn api_key_prefers_file_then_environment() {
        let (store, _dir) = store_with_env(&[("OPENAI_API_KEY", "sk-from-env-000000")]);
        assert_eq!(
            store.api_key(ProviderName::OpenAi).as_deref(),
            Some("sk-from-env-000000")
        );

        store
            .set_provider(
                ProviderName::OpenAi,
                ProviderCredential {
                    api_key: Some("sk-from-file-11111".to_string()),
                    ..ProviderCredential::with_model("gpt-x")
                },
            )
            .unwrap();
        assert_eq!(
            store.api_key(ProviderName::OpenAi).as_deref(),
            Some("sk-from-file-11111")
        );
        assert!(store.api_key(ProviderName::Anthropic).is_none());
    }

    #[test]
    fn keyless_provider_never_resolves_a_key() {
        let (store, _dir) = store_with_env(&[("OLLAMA_BASE_URL", "http://gpu-box:11434")]);
        store
            .set_provider(
                ProviderName::Ollama,
                ProviderCredential {
                    api_key: Some("ignored-secret-value".to_string()),
                    ..ProviderCredential::with_model("llama3.1")
                },
            )
            .unwrap();

        assert!(store.api_key(ProviderName::Ollama).is_none());
        assert_eq!(
            store.base_url(ProviderName::Ollama).as_deref(),
            Some("http://gpu-box:11434")
        );
    }

    #[test]
    fn stored_base_url_wins_over_environment() {
        let (store, _dir) = store_with_env(&[("OLLAMA_BASE_URL", "http://from-env:11434")]);
        store
            .set_provider(
                ProviderName::Ollama,
                ProviderCredential {
                    base_url: Some("http://localhost:11434".to_string()),
                    ..ProviderCredential::with_model("llama3.1")
                },
            )
            .unwrap();

        assert_eq!(
            store.base_url(ProviderName::Ollama).as_deref(),
            Some("http://localhost:11434")
        );
        assert!(store.base_url(ProviderName::OpenAi).is_none());
    }

    #[test]
    fn identity_slot_roundtrip() {
        let (store, _dir) = test_store();
        assert!(!store.clear_identity().unwrap());

        let identity = Identity {
            username: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            email: None,
            avatar_url: None,
            access_token: "gho_0123456789abcdef".to_string(),
            authenticated_at: Utc::now(),
        };
        store.set_identity(identity.clone()).unwrap();
        assert_eq!(store.reload().identity.github, Some(identity));

        assert!(store.clear_identity().unwrap());
        assert!(store.identity().is_none());
    }

    #[test]
    fn status_reports_key_sources_and_masks_keys() {
        let (store, _dir) = store_with_env(&[("GEMINI_API_KEY", "AIzaSyExampleKey1234")]);
        store
            .set_provider(
                ProviderName::OpenAi,
                ProviderCredential {
                    api_key: Some("sk-proj-abcdefghijkl".to_string()),
                    ..ProviderCredential::with_model("gpt-4o")
                },
            )
            .unwrap();
        store
            .set_provider(ProviderName::Gemini, ProviderCredential::with_model("gemini-1.5-pro"))
            .unwrap();
        store
            .set_provider(ProviderName::Mistral, ProviderCredential::with_model("mistral"))
            .unwrap();
        store
            .set_provider(ProviderName::Ollama, ProviderCredential::with_model("llama3.1"))
            .unwrap();
        store.mark_validated(ProviderName::OpenAi).unwrap();

        let status = store.status();
        let by_name = |name| status.providers.iter().find(|p| p.name == name).unwrap();

        let openai = by_name(ProviderName::OpenAi);
        assert!(openai.is_default);
        assert_eq!(openai.key_source, KeySource::Stored);
        assert_eq!(openai.masked_key.as_deref(), Some("sk-proj...ijkl"));
        assert!(openai.validated_at.is_some());

        assert_eq!(
            by_name(ProviderName::Gemini).key_source,
            KeySource::Environment("GEMINI_API_KEY")
        );
        assert_eq!(by_name(ProviderName::Mistral).key_source, KeySource::Missing);
        assert_eq!(by_name(ProviderName::Ollama).key_source, KeySource::NotRequired);
        assert_eq!(status.missing_keys().collect::<Vec<_>>(), vec![ProviderName::Mistral]);
        assert!(status.is_configured());
        assert!(status.identity.is_none());
    }

    #[test]
    fn mark_validated_unknown_provider_fails() {
        let (store, _dir) = test_store();
        assert!(store.mark_validated(ProviderName::OpenAi).is_err());
    }

    #[test]
    fn mask_short_secrets_identically() {
        assert_eq!(CredentialStore::mask_secret(""), "********");
        assert_eq!(CredentialStore::mask_secret("abc"), "********");
        assert_eq!(
            CredentialStore::mask_secret("12345678"),
            CredentialStore::mask_secret("zzzzzzzz")
        );
    }

    #[test]
    fn mask_long_secrets_shows_edges_only() {
        let secret = "sk-abcdefghijklmnopqrstuvwxyz";
        let masked = CredentialStore::mask_secret(secret);

        assert_eq!(masked, "sk-abcd...wxyz");
        assert!(!masked.contains("efghijklmnopqrstuv"));
        assert!(!masked.contains("dwxyz"));
    }

    #[test]
    fn external_changes_visible_after_reload() {
        let (store, _dir) = test_store();
        store
            .set_provider(ProviderName::OpenAi, ProviderCredential::with_model("gpt-x"))
            .unwrap();

        let other = CredentialStore::new(store.path()).with_env(|_| None);
        other
            .set_provider(ProviderName::Gemini, ProviderCredential::with_model("gemini"))
            .unwrap();

        assert!(store.provider(ProviderName::Gemini).is_none());
        assert!(store.reload().providers.contains_key(&ProviderName::Gemini));
    }
}
