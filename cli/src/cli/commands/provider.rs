//! Provider management command handlers.

use crate::cli::commands::{open_store, print_providers};
use crate::credentials::ProviderName;
use crate::error::Result;

/// Handle the `infrapilot provider list` command.
pub fn handle_provider_list() -> Result<()> {
    let status = open_store()?.status();

    if status.is_configured() {
        print_providers(&status);
    } else {
        println!("No LLM providers configured.");
        println!();
        println!("Run 'infrapilot login' to set one up.");
    }

    Ok(())
}

/// Handle the `infrapilot provider remove` command.
pub fn handle_provider_remove(name: ProviderName) -> Result<()> {
    let store = open_store()?;

    if !store.remove_provider(name)? {
        println!("{} is not configured.", name.display_name());
        return Ok(());
    }

    println!("Removed {}.", name.display_name());
    match store.default_provider() {
        Some(default) => println!("Default provider: {}", default.display_name()),
        None => println!("No providers left. Run 'infrapilot login' to add one."),
    }

    Ok(())
}

/// Handle the `infrapilot provider default` command.
pub fn handle_provider_default(name: ProviderName) -> Result<()> {
    let store = open_store()?;
    store.set_default_provider(name)?;
    println!("Default provider: {}", name.display_name());
    Ok(())
}
