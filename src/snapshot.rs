//! Debug-mode structural snapshots
//!
//! Writes the current document alongside a small analysis file listing
//! interactive-element counts, enough to repair a broken selector
//! without re-running the whole flow. Active only under `--debug`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use browser_adapter::Browser;
use chrono::{SecondsFormat, Utc};
use import_locator::SnapshotSink;
use serde::Serialize;
use tracing::{debug, warn};

/// Summary of candidate interactive elements in one document.
#[derive(Debug, Serialize)]
struct StructuralAnalysis {
    captured_at: String,
    document_bytes: usize,
    buttons: usize,
    links: usize,
    inputs: usize,
    forms: usize,
}

impl StructuralAnalysis {
    fn of(html: &str) -> Self {
        let lower = html.to_lowercase();
        Self {
            captured_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            document_bytes: html.len(),
            buttons: lower.matches("<button").count(),
            links: lower.matches("<a ").count(),
            inputs: lower.matches("<input").count(),
            forms: lower.matches("<form").count(),
        }
    }
}

/// Writes `{label}-{timestamp}.html` plus a sibling `-analysis.json`
/// into the debug directory.
pub struct DebugSnapshotSink {
    browser: Arc<dyn Browser>,
    dir: PathBuf,
}

impl DebugSnapshotSink {
    pub fn new(browser: Arc<dyn Browser>, dir: PathBuf) -> Self {
        Self { browser, dir }
    }

    async fn try_capture(&self, label: &str) -> std::io::Result<()> {
        let html = match self.browser.document_html().await {
            Ok(html) => html,
            Err(err) => {
                warn!(label, %err, "document not capturable");
                return Ok(());
            }
        };

        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let stem = format!("{label}-{stamp}");

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(format!("{stem}.html")), &html).await?;

        let analysis = StructuralAnalysis::of(&html);
        let body = serde_json::to_vec_pretty(&analysis).unwrap_or_default();
        tokio::fs::write(self.dir.join(format!("{stem}-analysis.json")), body).await?;

        debug!(label, dir = %self.dir.display(), "structural snapshot written");
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for DebugSnapshotSink {
    async fn capture(&self, label: &str) {
        if let Err(err) = self.try_capture(label).await {
            warn!(label, %err, "structural snapshot failed");
        }
    }
}
