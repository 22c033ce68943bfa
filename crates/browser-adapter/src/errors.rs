//! Error types for the browser adapter boundary

use thiserror::Error;

/// Errors surfaced by a browser backend.
#[derive(Debug, Error, Clone)]
pub enum AdapterError {
    /// Navigation did not settle within its deadline
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// A handle referred to an element that no longer exists
    #[error("Stale element handle: {0}")]
    StaleHandle(String),

    /// The interaction itself failed (element obscured, detached, ...)
    #[error("Interaction failed: {0}")]
    InteractionFailed(String),

    /// Artifact capture (screenshot, HTML dump) failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Transport or backend I/O error
    #[error("Browser I/O error: {0}")]
    Io(String),

    /// Internal invariant violation in the backend
    #[error("Internal adapter error: {0}")]
    Internal(String),
}

impl AdapterError {
    /// Whether a caller may reasonably retry the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterError::NavTimeout(_)
                | AdapterError::InteractionFailed(_)
                | AdapterError::Io(_)
        )
    }

    /// Error severity (0=low, 1=medium, 2=high, 3=critical).
    pub fn severity(&self) -> u8 {
        match self {
            AdapterError::Internal(_) => 3,
            AdapterError::NavTimeout(_) | AdapterError::Io(_) => 2,
            AdapterError::StaleHandle(_) | AdapterError::InteractionFailed(_) => 1,
            AdapterError::CaptureFailed(_) => 0,
        }
    }
}
