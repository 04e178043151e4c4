//! Authentication command handlers.

use crate::cli::commands::{open_store, print_providers};
use crate::error::Result;

/// Handle the `infrapilot logout` command.
///
/// With `github_only`, forgets the GitHub identity and keeps provider keys.
pub fn handle_logout(github_only: bool) -> Result<()> {
    let store = open_store()?;

    if github_only {
        if store.clear_identity()? {
            println!("Signed out of GitHub. Provider credentials were kept.");
        } else {
            println!("Not signed in to GitHub.");
        }
        return Ok(());
    }

    if store.path().exists() {
        store.clear()?;
        println!("Successfully logged out.");
        println!("Removed {}", store.path().display());
    } else {
        println!("Not currently logged in.");
    }

    Ok(())
}

/// Handle the `infrapilot status` command.
pub fn handle_status() -> Result<()> {
    let store = open_store()?;
    let status = store.status();

    match &status.identity {
        Some(identity) => {
            let detail = identity
                .email
                .as_deref()
                .or(identity.name.as_deref())
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            println!("GitHub: signed in as {}{detail}", identity.username);
            println!(
                "        since {}",
                identity.authenticated_at.format("%Y-%m-%d %H:%M UTC")
            );
        },
        None => println!("GitHub: not signed in"),
    }
    println!();

    if !status.is_configured() {
        println!("No LLM providers configured.");
        println!();
        println!("Run 'infrapilot login' to set one up.");
        return Ok(());
    }

    print_providers(&status);

    let missing: Vec<String> = status.missing_keys().map(|n| n.to_string()).collect();
    if !missing.is_empty() {
        println!();
        println!(
            "  Warning: no API key for {}. Run 'infrapilot login --force' or set the environment variable.",
            missing.join(", ")
        );
    }

    println!();
    println!("Credentials: {}", status.path.display());

    Ok(())
}
