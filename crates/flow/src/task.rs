//! Import tasks and their preparation

use std::fmt;
use std::path::{Path, PathBuf};

use csv_contract::{validate, ContractError, CsvValidationResult, HeaderContract};
use csvpilot_core_types::{ImportType, TaskStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::FlowError;

/// The five fixed pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    LocateAndSelectTarget,
    SubmitInput,
    VerifyReadiness,
    Confirm,
    AwaitCompletion,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::LocateAndSelectTarget => "locate-and-select-target",
            PipelineStage::SubmitInput => "submit-input",
            PipelineStage::VerifyReadiness => "verify-readiness",
            PipelineStage::Confirm => "confirm",
            PipelineStage::AwaitCompletion => "await-completion",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit of import work. Created once per run from the set of
/// contract-valid files; status only ever advances monotonically.
#[derive(Clone, Debug)]
pub struct ImportTask {
    pub import_type: ImportType,
    pub file_path: PathBuf,
    pub validation: CsvValidationResult,
    status: TaskStatus,
}

impl ImportTask {
    pub fn new(import_type: ImportType, validation: CsvValidationResult) -> Self {
        Self {
            import_type,
            file_path: validation.path.clone(),
            validation,
            status: TaskStatus::Pending,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Advance the status, rejecting any non-monotonic move.
    pub(crate) fn advance(&mut self, next: TaskStatus) -> Result<(), FlowError> {
        if !self.status.can_advance_to(next) {
            return Err(FlowError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Outcome of task preparation: the runnable set plus everything that
/// was skipped, with its reason.
#[derive(Debug)]
pub struct PreparedTasks {
    pub tasks: Vec<ImportTask>,
    pub skipped: Vec<(ImportType, ContractError)>,
}

/// Build the run's task list from a data directory.
///
/// A contract failure skips that import type with a warning rather than
/// aborting preparation; deciding whether an empty task set is fatal is
/// the caller's policy.
pub fn prepare_tasks(data_dir: &Path) -> PreparedTasks {
    let mut tasks = Vec::new();
    let mut skipped = Vec::new();

    for import_type in ImportType::all() {
        let contract = HeaderContract::for_type(import_type);
        match validate(data_dir, &contract, import_type) {
            Ok(validation) => {
                info!(
                    import_type = %import_type,
                    file = %validation.path.display(),
                    lines = validation.line_count,
                    "prepared import task"
                );
                tasks.push(ImportTask::new(import_type, validation));
            }
            Err(err) => {
                warn!(import_type = %import_type, kind = err.kind(), %err, "skipping import type");
                skipped.push((import_type, err));
            }
        }
    }

    PreparedTasks { tasks, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn advance_rejects_reentering_terminal_status() {
        let validation = CsvValidationResult {
            path: PathBuf::from("schemes.csv"),
            byte_size: 10,
            line_count: 3,
            headers: vec!["name".into(), "code".into()],
        };
        let mut task = ImportTask::new(ImportType::Schemes, validation);

        task.advance(TaskStatus::Running).unwrap();
        task.advance(TaskStatus::Failed).unwrap();
        let err = task.advance(TaskStatus::Running).unwrap_err();
        assert!(matches!(err, FlowError::InvalidStatusTransition { .. }));
        assert_eq!(task.status(), TaskStatus::Failed);
    }

    #[test]
    fn preparation_skips_invalid_types_and_keeps_valid_ones() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("schemes-template.csv"),
            "name,code\nBRC01,1\n",
        )
        .unwrap();
        // Header only: insufficient rows.
        fs::write(dir.path().join("projects-template.csv"), "order_reference,name\n").unwrap();

        let prepared = prepare_tasks(dir.path());

        assert_eq!(prepared.tasks.len(), 1);
        assert_eq!(prepared.tasks[0].import_type, ImportType::Schemes);
        // projects fails on rows; inspectors falls back to the first
        // tabular file, which also has no data rows.
        assert_eq!(prepared.skipped.len(), 2);
    }
}
