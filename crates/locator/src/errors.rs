//! Error types for selector resolution

use std::time::Duration;

use thiserror::Error;

/// Resolution failures.
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Spec carried no candidates at all
    #[error("No candidates for target '{0}'")]
    ElementNotFound(String),

    /// Every candidate's budget slice expired without a match
    #[error("Timed out resolving '{target}' after {budget:?} ({} candidates tried)", attempted.len())]
    ElementTimeout {
        target: String,
        /// Every candidate expression that was attempted, in order.
        attempted: Vec<String>,
        budget: Duration,
    },

    /// The browser backend failed in a way that is not "no match yet"
    #[error("Adapter failure while resolving '{target}': {reason}")]
    AdapterFailure { target: String, reason: String },
}

impl LocatorError {
    /// Whether the same resolve call may reasonably be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LocatorError::ElementTimeout { .. } | LocatorError::AdapterFailure { .. }
        )
    }
}
