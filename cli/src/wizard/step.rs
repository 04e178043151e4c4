//! Step and context contracts for the wizard engine.

use async_trait::async_trait;

/// State threaded through a wizard run.
///
/// Steps never mutate the context; they return a patch which the engine folds
/// in with [`merge`](Self::merge).
pub trait WizardContext: Clone + Send + Sync {
    /// Partial update produced by a step.
    type Patch: Send;

    /// Shallow merge: fields set in `patch` overwrite, unset ones are kept.
    #[must_use]
    fn merge(self, patch: Self::Patch) -> Self;
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult<P> {
    /// Keep going, optionally applying a patch first.
    Continue(Option<P>),
    /// Stop here and report the run as successful.
    SkipRemaining,
    /// Stop here and report the run as failed with this message.
    Failed(String),
}

impl<P> StepResult<P> {
    /// Continue with a patch.
    pub const fn patch(patch: P) -> Self {
        Self::Continue(Some(patch))
    }

    /// Continue without changing the context.
    pub const fn next() -> Self {
        Self::Continue(None)
    }

    /// Fail with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// One unit of work in a wizard.
#[async_trait]
pub trait WizardStep<C: WizardContext>: Send + Sync {
    /// Unique identifier within a wizard.
    fn id(&self) -> &'static str;

    /// Heading shown to the user.
    fn title(&self) -> &'static str;

    /// Whether the user may skip this step. Informational for observers.
    fn can_skip(&self) -> bool {
        false
    }

    /// Whether the step should run against the current context.
    fn condition(&self, _context: &C) -> bool {
        true
    }

    /// Performs the step. Any resource acquired here must be released before returning.
    async fn execute(&self, context: &C) -> StepResult<C::Patch>;
}
