//! Infrapilot CLI - infrastructure copilot for the terminal
//!
//! This binary hosts the first-run setup: GitHub sign-in through the OAuth
//! device flow and a local credential store for LLM provider keys.

mod auth;
mod cli;
mod config;
mod credentials;
mod error;
mod login;
mod wizard;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ProviderCommands};
use crate::config::settings::env;
use crate::error::Result;
use crate::login::LoginOptions;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; stay quiet by default so prompts are not interleaved
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL)
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Run the command
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login {
            force,
            skip_github,
            no_browser,
        } => {
            cli::commands::handle_login(LoginOptions {
                force,
                skip_github,
                no_browser,
            })
            .await
        },
        Commands::Logout { github } => cli::commands::handle_logout(github),
        Commands::Status => cli::commands::handle_status(),
        Commands::Provider { command } => match command {
            ProviderCommands::List => cli::commands::handle_provider_list(),
            ProviderCommands::Remove { name } => {
                cli::commands::handle_provider_remove(name.into())
            },
            ProviderCommands::Default { name } => {
                cli::commands::handle_provider_default(name.into())
            },
        },
        Commands::Completions { shell } => {
            cli::commands::handle_completions(shell);
            Ok(())
        },
    }
}
