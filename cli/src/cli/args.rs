//! Command-line argument parsing.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::credentials::ProviderName;

/// Infrastructure copilot for your terminal.
///
/// Run `infrapilot login` once to sign in with GitHub and configure the LLM
/// providers infrapilot talks to.
#[derive(Parser, Debug)]
#[command(name = "infrapilot")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up GitHub sign-in and LLM providers.
    Login {
        /// Reconfigure without asking, even if credentials exist.
        #[arg(short, long)]
        force: bool,

        /// Do not offer GitHub sign-in.
        #[arg(long)]
        skip_github: bool,

        /// Skip opening the browser automatically.
        #[arg(long)]
        no_browser: bool,
    },

    /// Remove stored credentials.
    Logout {
        /// Only forget the GitHub identity and keep provider keys.
        #[arg(long)]
        github: bool,
    },

    /// Show the signed-in identity and configured providers.
    Status,

    /// Manage configured LLM providers.
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Provider subcommands.
#[derive(Subcommand, Debug)]
pub enum ProviderCommands {
    /// List configured providers.
    List,

    /// Remove a provider's credentials.
    Remove {
        /// Provider to remove.
        #[arg(value_enum)]
        name: ProviderArg,
    },

    /// Make a configured provider the default.
    Default {
        /// Provider to use by default.
        #[arg(value_enum)]
        name: ProviderArg,
    },
}

/// Provider argument for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    Ollama,
}

impl From<ProviderArg> for ProviderName {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::OpenAi => Self::OpenAi,
            ProviderArg::Anthropic => Self::Anthropic,
            ProviderArg::Gemini => Self::Gemini,
            ProviderArg::Mistral => Self::Mistral,
            ProviderArg::Ollama => Self::Ollama,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn login_flags_parse() {
        let cli = Cli::parse_from(["infrapilot", "login", "--force", "--skip-github", "--no-browser"]);
        assert!(matches!(
            cli.command,
            Commands::Login {
                force: true,
                skip_github: true,
                no_browser: true,
            }
        ));
    }

    #[test]
    fn provider_names_match_credential_file_names() {
        for name in ProviderName::ALL {
            let arg = ProviderArg::from_str(name.as_str(), false).unwrap();
            assert_eq!(ProviderName::from(arg), name);
        }
    }

    #[test]
    fn provider_default_parses() {
        let cli = Cli::parse_from(["infrapilot", "provider", "default", "openai"]);
        assert!(matches!(
            cli.command,
            Commands::Provider {
                command: ProviderCommands::Default {
                    name: ProviderArg::OpenAi
                }
            }
        ));
    }

    #[test]
    fn logout_defaults_to_everything() {
        let cli = Cli::parse_from(["infrapilot", "logout"]);
        assert!(matches!(cli.command, Commands::Logout { github: false }));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["infrapilot", "provider", "remove", "bedrock"]).is_err());
    }
}
