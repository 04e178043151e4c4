//! Generic multi-step wizard engine.
//!
//! A wizard is an ordered list of [`WizardStep`]s run one after another against a
//! typed [`WizardContext`]. Steps return patches instead of mutating state, may be
//! gated on the context, and can end the run early with success or failure.

pub mod engine;
pub mod error;
pub mod step;

pub use engine::{Wizard, WizardEvent};
pub use error::WizardError;
pub use step::{StepResult, WizardContext, WizardStep};
