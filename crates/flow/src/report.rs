//! End-of-run reporting types
//!
//! Advisory only: the summary never gates the exit code. Per-task
//! reports mirror what a post-import verification pass would check,
//! expected vs found record counts with an accuracy percentage.

use std::path::PathBuf;

use csvpilot_core_types::{ImportType, TaskStatus};
use serde::Serialize;

/// Per-task entry in the end-of-run report.
#[derive(Clone, Debug, Serialize)]
pub struct TaskReport {
    pub import_type: ImportType,
    pub status: TaskStatus,
    pub file: PathBuf,
    /// Data rows the input promised.
    pub expected: usize,
    /// Records confirmed imported.
    pub found: usize,
    /// Integer percentage of found over expected.
    pub accuracy: u8,
    pub issues: Vec<String>,
}

impl TaskReport {
    pub fn completed(import_type: ImportType, file: PathBuf, expected: usize) -> Self {
        Self {
            import_type,
            status: TaskStatus::Completed,
            file,
            expected,
            found: expected,
            accuracy: accuracy(expected, expected),
            issues: Vec::new(),
        }
    }

    pub fn failed(
        import_type: ImportType,
        file: PathBuf,
        expected: usize,
        issue: String,
    ) -> Self {
        Self {
            import_type,
            status: TaskStatus::Failed,
            file,
            expected,
            found: 0,
            accuracy: 0,
            issues: vec![issue],
        }
    }
}

fn accuracy(found: usize, expected: usize) -> u8 {
    if expected == 0 {
        return 0;
    }
    ((found * 100) / expected).min(100) as u8
}

/// Totals plus per-task reports for one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub reports: Vec<TaskReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: TaskReport) {
        match report.status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
            _ => {}
        }
        self.reports.push(report);
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Console-friendly summary table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<12} {:<10} {:>8} {:>6} {:>9}  issues\n",
            "type", "status", "expected", "found", "accuracy"
        ));
        for report in &self.reports {
            out.push_str(&format!(
                "{:<12} {:<10} {:>8} {:>6} {:>8}%  {}\n",
                report.import_type.to_string(),
                report.status.to_string(),
                report.expected,
                report.found,
                report.accuracy,
                report.issues.join("; ")
            ));
        }
        out.push_str(&format!(
            "completed: {}/{}  failed: {}/{}\n",
            self.completed,
            self.total(),
            self.failed,
            self.total()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_follow_report_statuses() {
        let mut summary = RunSummary::default();
        summary.push(TaskReport::completed(
            ImportType::Schemes,
            PathBuf::from("schemes.csv"),
            12,
        ));
        summary.push(TaskReport::failed(
            ImportType::Projects,
            PathBuf::from("projects.csv"),
            8,
            "validation stage timed out".into(),
        ));

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.reports[0].accuracy, 100);
        assert_eq!(summary.reports[1].found, 0);

        let rendered = summary.render();
        assert!(rendered.contains("completed: 1/2"));
        assert!(rendered.contains("validation stage timed out"));
    }
}
