//! CLI module for infrapilot.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ProviderCommands};
