//! Import task orchestration
//!
//! Drives a set of independent import tasks through one fixed pipeline:
//! locate-and-select-target, submit-input, verify-readiness, confirm,
//! await-completion. Tasks run strictly sequentially over one shared
//! browser session; a failure in any stage marks only that task Failed
//! and the run moves on. Authentication happens once, before the loop,
//! and is the only per-run fatal interaction.

pub mod errors;
pub mod orchestrator;
pub mod report;
pub mod selectors;
pub mod task;

pub use errors::{FlowError, StepError};
pub use orchestrator::{Credentials, OrchestratorConfig, TaskOrchestrator};
pub use report::{RunSummary, TaskReport};
pub use selectors::ImportSelectors;
pub use task::{prepare_tasks, ImportTask, PipelineStage, PreparedTasks};
