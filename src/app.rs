//! Application run loop
//!
//! Assembles the workspace crates into one run: configuration, task
//! preparation, the shared browser session, authentication, the task
//! loop, and the end-of-run report. Exit code policy: task failures
//! never fail the process; only pre-loop errors (config, no valid
//! input, authentication) do.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use browser_adapter::{Browser, StubBrowser};
use csvpilot_core_types::RunId;
use import_flow::{prepare_tasks, PreparedTasks, TaskOrchestrator};
use import_locator::DefaultSelectorResolver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::report::write_report;
use crate::selectors::DEFAULT_SELECTORS;
use crate::snapshot::DebugSnapshotSink;

const EVENT_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// Execute the CLI invocation; the returned code is the process exit
/// code for the non-fatal paths.
pub async fn run(cli: Cli) -> Result<i32> {
    let settings = AppConfig::load(cli.config.as_deref())?.validate()?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| settings.data_dir.clone());

    let prepared = prepare_tasks(&data_dir);
    print_plan(&prepared);

    if cli.dry_run {
        // Contract validation only; no browser session is opened.
        return Ok(if prepared.tasks.is_empty() { 1 } else { 0 });
    }
    if prepared.tasks.is_empty() {
        bail!(
            "no import file passed its contract in {}",
            data_dir.display()
        );
    }

    let run_id = RunId::new();
    info!(%run_id, tasks = prepared.tasks.len(), "starting import run");

    let cancel = CancellationToken::new();
    spawn_stop_handler(cancel.clone());

    let browser: Arc<dyn Browser> = Arc::new(StubBrowser::new());
    let sampler = spawn_event_sampler(browser.clone(), cancel.clone());

    let mut resolver = DefaultSelectorResolver::new(browser.clone());
    if cli.debug {
        resolver = resolver.with_snapshots(Arc::new(DebugSnapshotSink::new(
            browser.clone(),
            settings.debug_dir.clone(),
        )));
    }

    let orchestrator = TaskOrchestrator::new(
        browser,
        Arc::new(resolver),
        DEFAULT_SELECTORS.clone(),
        settings.orchestrator.clone(),
        cancel.clone(),
    );

    orchestrator
        .authenticate()
        .await
        .context("authentication failed")?;

    let summary = orchestrator.run(prepared.tasks).await;
    cancel.cancel();
    sampler.abort();

    print!("{}", summary.render());
    let report_path = write_report(
        &settings.logs_dir,
        &run_id,
        &settings.orchestrator.base_url,
        &summary,
    )?;
    println!("report: {}", report_path.display());

    Ok(0)
}

fn print_plan(prepared: &PreparedTasks) {
    for task in &prepared.tasks {
        println!(
            "will import {:<12} {} ({} data rows)",
            task.import_type.to_string(),
            task.file_path.display(),
            task.validation.data_rows()
        );
    }
    for (import_type, err) in &prepared.skipped {
        println!("skipping    {:<12} {err}", import_type.to_string());
    }
}

/// Ctrl-C flips the cancellation token; in-flight poll loops stop at
/// their next tick and accumulated artifacts are still flushed.
fn spawn_stop_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("stop requested; finishing the current step");
            cancel.cancel();
        }
    });
}

/// Background sampler over the adapter's interaction log. Read-only;
/// purely observability.
fn spawn_event_sampler(browser: Arc<dyn Browser>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVENT_SAMPLE_INTERVAL);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    info!(events = browser.event_log().len(), "interaction events recorded");
                }
            }
        }
    })
}
