//! Error types for manual intervention

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum InterventionError {
    /// The operator did not satisfy the condition within the window
    #[error("Intervention timed out after {waited:?}: {instruction}")]
    Timeout {
        instruction: String,
        waited: Duration,
    },

    /// An external stop signal ended the wait
    #[error("Intervention cancelled: {0}")]
    Cancelled(String),
}

impl InterventionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InterventionError::Timeout { .. })
    }
}
