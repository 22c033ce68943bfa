//! Shared vocabulary for the csvpilot workspace.
//!
//! Kept deliberately small: identifiers and the enums every layer needs
//! to agree on. Anything with behavior lives in the crate that owns it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier for one automation run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three import kinds the target application accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    Schemes,
    Projects,
    Inspectors,
}

impl ImportType {
    /// All import types, in the order tasks are prepared and run.
    pub fn all() -> [ImportType; 3] {
        [
            ImportType::Schemes,
            ImportType::Projects,
            ImportType::Inspectors,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImportType::Schemes => "schemes",
            ImportType::Projects => "projects",
            ImportType::Inspectors => "inspectors",
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ImportType {
    type Err = UnknownImportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "schemes" => Ok(ImportType::Schemes),
            "projects" => Ok(ImportType::Projects),
            "inspectors" => Ok(ImportType::Inspectors),
            other => Err(UnknownImportType(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown import type: {0}")]
pub struct UnknownImportType(pub String);

/// Lifecycle of one import task.
///
/// Transitions are monotonic: Pending -> Running -> Completed | Failed.
/// A terminal status is never re-entered within the same run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the monotonic
    /// Pending -> Running -> terminal ordering.
    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
