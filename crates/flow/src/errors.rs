//! Error types for pipeline execution

use browser_adapter::AdapterError;
use csvpilot_core_types::TaskStatus;
use import_intervention::InterventionError;
use import_locator::LocatorError;
use import_retry::RetryExhausted;
use thiserror::Error;

/// One interactive step's failure, before retry policy is applied.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Failures that escape a pipeline stage.
///
/// The orchestrator catches these at the task boundary; only
/// authentication-time errors ever abort a run.
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// A retried interactive step exhausted its policy
    #[error(transparent)]
    RetryExhausted(#[from] RetryExhausted<StepError>),

    /// A single-shot wait (no retry wrapper) failed
    #[error(transparent)]
    Step(#[from] StepError),

    /// The operator did not complete a manual step in time
    #[error(transparent)]
    Intervention(#[from] InterventionError),

    /// External stop signal observed at a stage boundary
    #[error("Run cancelled during '{0}'")]
    Cancelled(String),

    /// Attempted a non-monotonic task status change
    #[error("Invalid status transition {from} -> {to}")]
    InvalidStatusTransition { from: TaskStatus, to: TaskStatus },
}

impl From<LocatorError> for FlowError {
    fn from(err: LocatorError) -> Self {
        FlowError::Step(StepError::Locator(err))
    }
}

impl From<AdapterError> for FlowError {
    fn from(err: AdapterError) -> Self {
        FlowError::Step(StepError::Adapter(err))
    }
}
