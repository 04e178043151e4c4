//! Wizard definition errors.

use thiserror::Error;

/// Problems with a wizard's step list, detected before anything runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// Two steps share an id.
    #[error("Wizard step id '{0}' is used more than once.")]
    DuplicateStep(String),
}
