//! End-of-run JSON report writer

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use csvpilot_core_types::RunId;
use import_flow::RunSummary;
use serde::Serialize;
use tracing::info;

/// Document written to `logs/import-report-{timestamp}.json`.
#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    run_id: &'a RunId,
    generated_at: String,
    base_url: &'a str,
    completed: usize,
    failed: usize,
    tasks: &'a [import_flow::TaskReport],
}

/// Persist the run summary; returns the report path.
pub fn write_report(
    logs_dir: &Path,
    run_id: &RunId,
    base_url: &str,
    summary: &RunSummary,
) -> Result<PathBuf> {
    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
        .replace([':', '.'], "-");
    let path = logs_dir.join(format!("import-report-{stamp}.json"));

    let document = ReportDocument {
        run_id,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        base_url,
        completed: summary.completed,
        failed: summary.failed,
        tasks: &summary.reports,
    };

    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("creating {}", logs_dir.display()))?;
    let body = serde_json::to_vec_pretty(&document).context("serializing report")?;
    std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), "import report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvpilot_core_types::ImportType;
    use import_flow::TaskReport;
    use tempfile::TempDir;

    #[test]
    fn report_nests_per_task_entries_and_totals() {
        let dir = TempDir::new().unwrap();
        let run_id = RunId::new();
        let mut summary = RunSummary::default();
        summary.push(TaskReport::completed(
            ImportType::Inspectors,
            PathBuf::from("inspectors.csv"),
            7,
        ));

        let path = write_report(dir.path(), &run_id, "https://imports.example", &summary).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("import-report-"));

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["completed"], 1);
        assert_eq!(doc["failed"], 0);
        assert_eq!(doc["tasks"][0]["import_type"], "inspectors");
        assert_eq!(doc["tasks"][0]["accuracy"], 100);
        assert_eq!(doc["tasks"][0]["expected"], 7);
    }
}
