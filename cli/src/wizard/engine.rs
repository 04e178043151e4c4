//! Sequential wizard runner.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt::Display;

use tracing::{debug, warn};

use crate::wizard::error::WizardError;
use crate::wizard::step::{StepResult, WizardContext, WizardStep};

/// Progress notification emitted while a wizard runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent<'a> {
    /// A step is about to execute.
    StepStarted {
        id: &'static str,
        title: &'static str,
        /// Zero-based position in the step list.
        index: usize,
        total: usize,
        skippable: bool,
    },
    /// A step's condition was false; it did not run.
    StepSkipped { id: &'static str, index: usize },
    /// A step returned `Continue` or `SkipRemaining`.
    StepCompleted { id: &'static str, index: usize },
    /// A step returned `Failed`.
    StepFailed {
        id: &'static str,
        index: usize,
        error: &'a str,
    },
    /// The run is over.
    Finished { success: bool },
}

/// Result of a wizard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOutcome<C> {
    /// False only when a step failed.
    pub success: bool,
    /// Context after every patch merged so far.
    pub context: C,
    /// The failing step's message, verbatim.
    pub error: Option<String>,
}

/// An ordered list of steps over a context type.
pub struct Wizard<C: WizardContext> {
    steps: Vec<Box<dyn WizardStep<C>>>,
}

impl<C: WizardContext> Wizard<C> {
    /// Builds a wizard, rejecting duplicate step ids.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::DuplicateStep`] naming the first repeated id.
    pub fn new(steps: Vec<Box<dyn WizardStep<C>>>) -> Result<Self, WizardError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id()) {
                return Err(WizardError::DuplicateStep(step.id().to_string()));
            }
        }
        Ok(Self { steps })
    }

    /// Runs every step without an observer.
    #[allow(dead_code)]
    pub async fn run(&self, initial: C) -> WizardOutcome<C> {
        self.run_with_events(initial, |_| Ok::<(), Infallible>(()))
            .await
    }

    /// Runs every step, reporting progress to `on_event`.
    ///
    /// An observer error is logged and otherwise ignored.
    pub async fn run_with_events<F, E>(&self, initial: C, mut on_event: F) -> WizardOutcome<C>
    where
        F: FnMut(&WizardEvent<'_>) -> Result<(), E> + Send,
        E: Display,
    {
        let total = self.steps.len();
        let mut context = initial;

        for (index, step) in self.steps.iter().enumerate() {
            let id = step.id();

            if !step.condition(&context) {
                debug!(step = id, "Condition not met, skipping");
                emit(&mut on_event, &WizardEvent::StepSkipped { id, index });
                continue;
            }

            emit(
                &mut on_event,
                &WizardEvent::StepStarted {
                    id,
                    title: step.title(),
                    index,
                    total,
                    skippable: step.can_skip(),
                },
            );
            debug!(step = id, "Executing step");

            match step.execute(&context).await {
                StepResult::Continue(patch) => {
                    if let Some(patch) = patch {
                        context = context.merge(patch);
                    }
                    emit(&mut on_event, &WizardEvent::StepCompleted { id, index });
                },
                StepResult::SkipRemaining => {
                    debug!(step = id, "Step ended the wizard early");
                    emit(&mut on_event, &WizardEvent::StepCompleted { id, index });
                    emit(&mut on_event, &WizardEvent::Finished { success: true });
                    return WizardOutcome {
                        success: true,
                        context,
                        error: None,
                    };
                },
                StepResult::Failed(error) => {
                    debug!(step = id, "Step failed: {error}");
                    emit(
                        &mut on_event,
                        &WizardEvent::StepFailed {
                            id,
                            index,
                            error: &error,
                        },
                    );
                    emit(&mut on_event, &WizardEvent::Finished { success: false });
                    return WizardOutcome {
                        success: false,
                        context,
                        error: Some(error),
                    };
                },
            }
        }

        emit(&mut on_event, &WizardEvent::Finished { success: true });
        WizardOutcome {
            success: true,
            context,
            error: None,
        }
    }
}

fn emit<F, E>(on_event: &mut F, event: &WizardEvent<'_>)
where
    F: FnMut(&WizardEvent<'_>) -> Result<(), E>,
    E: Display,
{
    if let Err(e) = on_event(event) {
        warn!(?event, "Wizard event observer failed: {e}");
    }
}
