//! Local credential storage for infrapilot.
//!
//! This module persists the signed-in identity and LLM provider settings:
//! - [`CredentialStore`] - Cached JSON file with the default-provider invariant
//! - [`CredentialFile`] - The on-disk document
//! - [`CredentialStatus`] - Read-only projection used by `infrapilot status`

pub mod error;
pub mod status;
pub mod store;
pub mod types;

pub use error::CredentialError;
pub use status::{CredentialStatus, KeySource};
pub use store::CredentialStore;
pub use types::{Identity, ProviderCredential, ProviderName};
