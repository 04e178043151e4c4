//! `infrapilot login` handler.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::auth::{GitHubClient, HttpDeviceFlowTransport};
use crate::config::load_config;
use crate::credentials::CredentialStore;
use crate::error::{PilotError, Result};
use crate::login::{login_wizard, LoginDeps, LoginOptions, LoginWizardContext, TerminalPrompter};
use crate::wizard::WizardEvent;

/// Exit code used when a second Ctrl-C aborts the process.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Handle the `infrapilot login` command.
pub async fn handle_login(options: LoginOptions) -> Result<()> {
    let config = load_config()?;
    let timeout = Duration::from_secs(config.http.timeout_secs);

    let cancel = CancellationToken::new();
    let deps = LoginDeps {
        store: Arc::new(CredentialStore::from_config(&config)?),
        prompter: Arc::new(TerminalPrompter::new()),
        transport: Arc::new(HttpDeviceFlowTransport::new(&config.auth.github, timeout)?),
        github: Arc::new(GitHubClient::new(&config.auth.github, timeout)?),
        options,
        cancel: cancel.clone(),
    };
    let wizard = login_wizard(&deps)?;

    println!("Welcome to infrapilot!");

    let ctrl_c = listen_for_ctrl_c(cancel);
    let outcome = wizard
        .run_with_events(LoginWizardContext::new(options.skip_github), |event| {
            if let WizardEvent::StepStarted {
                title,
                index,
                total,
                ..
            } = event
            {
                let mut out = io::stdout().lock();
                writeln!(out)?;
                writeln!(out, "[{}/{}] {title}", index + 1, total)?;
            }
            Ok::<(), io::Error>(())
        })
        .await;
    ctrl_c.abort();

    if !outcome.success {
        return Err(PilotError::LoginFailed(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let context = outcome.context;
    println!();
    if context.is_cancelled() {
        println!("Login cancelled. Nothing was saved.");
    } else if context.is_completed() {
        println!("You're all set!");
        if let Some(default) = context.default_provider {
            println!("Default provider: {}", default.display_name());
        }
        if let Some(identity) = &context.github_identity {
            println!("Signed in to GitHub as {}.", identity.username);
        }
    } else {
        println!("Keeping your existing configuration.");
    }

    Ok(())
}

/// First Ctrl-C cancels the token; a second one exits immediately.
fn listen_for_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        debug!("Ctrl-C received, cancelling login");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
}
