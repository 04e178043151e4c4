//! Interactive first-run setup behind `infrapilot login`.
//!
//! The login flow is a [`Wizard`](crate::wizard::Wizard) over
//! [`LoginWizardContext`]:
//! 1. `existing-config` - ask before reconfiguring an existing setup
//! 2. `github` - optional GitHub sign-in through the device flow
//! 3. `providers` - pick LLM providers, keys, models
//! 4. `default-provider` - choose the default when there are several
//! 5. `save` - write everything to the credential store

pub mod context;
pub mod prompt;
pub mod steps;

pub use context::LoginWizardContext;
pub use prompt::TerminalPrompter;
pub use steps::{login_wizard, LoginDeps, LoginOptions};
