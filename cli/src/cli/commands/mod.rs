//! Command implementations.

pub mod auth;
pub mod login;
pub mod provider;

use std::io;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::config::load_config;
use crate::credentials::{CredentialStatus, CredentialStore, KeySource};
use crate::error::Result;

pub use auth::{handle_logout, handle_status};
pub use login::handle_login;
pub use provider::{handle_provider_default, handle_provider_list, handle_provider_remove};

/// Handle the `infrapilot completions` command.
pub fn handle_completions(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
}

/// Store at the configured location.
fn open_store() -> Result<CredentialStore> {
    let config = load_config()?;
    CredentialStore::from_config(&config)
}

fn print_providers(status: &CredentialStatus) {
    println!("Providers:");
    for provider in &status.providers {
        let marker = if provider.is_default { "*" } else { " " };
        let key = match provider.key_source {
            KeySource::NotRequired => "no key needed".to_string(),
            KeySource::Stored => provider.masked_key.clone().unwrap_or_default(),
            KeySource::Environment(var) => format!(
                "{} (from {var})",
                provider.masked_key.as_deref().unwrap_or_default()
            ),
            KeySource::Missing => "missing API key".to_string(),
        };

        println!(
            "  {marker} {:<16} {:<28} {key}",
            provider.name.display_name(),
            provider.model
        );
        if let Some(url) = &provider.base_url {
            println!("    {:<16} {url}", "");
        }
        if let Some(validated_at) = provider.validated_at {
            println!(
                "    {:<16} validated {}",
                "",
                validated_at.format("%Y-%m-%d")
            );
        }
    }
    println!();
    println!("  * default");
}
