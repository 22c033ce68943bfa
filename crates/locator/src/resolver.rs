//! Selector resolver with even budget split across candidates

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use browser_adapter::{AdapterError, Browser, ElementHandle, QuerySpec};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::LocatorError;
use crate::types::SelectorSpec;

/// Default pause between lookups of the same candidate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sink for debug-mode structural snapshots around a resolution.
///
/// Capture failures are logged and swallowed; a sink can never change
/// a resolution outcome.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn capture(&self, label: &str);
}

/// Selector resolution seam.
#[async_trait]
pub trait SelectorResolver: Send + Sync {
    /// Resolve `spec` within `budget`, requiring visibility or not.
    ///
    /// The budget is divided evenly across candidates; the first
    /// candidate that resolves short-circuits the rest. The returned
    /// handle is owned by the browser backend.
    async fn resolve(
        &self,
        spec: &SelectorSpec,
        budget: Duration,
        visibility_required: bool,
    ) -> Result<ElementHandle, LocatorError>;
}

/// Default resolver over the narrow browser interface.
pub struct DefaultSelectorResolver {
    browser: Arc<dyn Browser>,
    poll_interval: Duration,
    snapshots: Option<Arc<dyn SnapshotSink>>,
}

impl DefaultSelectorResolver {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            poll_interval: DEFAULT_POLL_INTERVAL,
            snapshots: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Attach a debug snapshot sink (debug mode only).
    pub fn with_snapshots(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(sink);
        self
    }

    async fn snapshot(&self, spec: &SelectorSpec, phase: &str) {
        if let Some(sink) = &self.snapshots {
            sink.capture(&format!("resolve-{}-{phase}", slug(&spec.target)))
                .await;
        }
    }

    /// Poll one candidate until its deadline.
    async fn try_candidate(
        &self,
        candidate: &QuerySpec,
        deadline: Instant,
        visibility_required: bool,
    ) -> Result<Option<ElementHandle>, AdapterError> {
        loop {
            match self.browser.query(candidate).await {
                Ok(Some(handle)) => {
                    if !visibility_required {
                        return Ok(Some(handle));
                    }
                    match self.browser.is_visible(&handle).await {
                        Ok(true) => return Ok(Some(handle)),
                        Ok(false) => {
                            debug!(candidate = %candidate, "candidate matched but not visible");
                        }
                        Err(err) if err.is_retryable() => {
                            debug!(candidate = %candidate, %err, "visibility check not ready");
                        }
                        // Stale handles mean the page moved under us;
                        // re-query on the next tick.
                        Err(AdapterError::StaleHandle(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(None) => {}
                Err(err) if err.is_retryable() => {
                    debug!(candidate = %candidate, %err, "query not ready");
                }
                Err(err) => return Err(err),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl SelectorResolver for DefaultSelectorResolver {
    async fn resolve(
        &self,
        spec: &SelectorSpec,
        budget: Duration,
        visibility_required: bool,
    ) -> Result<ElementHandle, LocatorError> {
        if spec.is_empty() {
            return Err(LocatorError::ElementNotFound(spec.target.clone()));
        }

        self.snapshot(spec, "before").await;

        // Even split: N candidates never take longer than the budget.
        let slice = budget / spec.candidates.len() as u32;
        debug!(
            target = %spec.target,
            candidates = spec.candidates.len(),
            ?budget,
            ?slice,
            "resolving selector"
        );

        for candidate in &spec.candidates {
            let deadline = Instant::now() + slice;
            match self
                .try_candidate(candidate, deadline, visibility_required)
                .await
            {
                Ok(Some(handle)) => {
                    debug!(target = %spec.target, candidate = %candidate, %handle, "resolved");
                    self.snapshot(spec, "after").await;
                    return Ok(handle);
                }
                Ok(None) => {
                    debug!(target = %spec.target, candidate = %candidate, "candidate slice expired");
                }
                Err(err) => {
                    warn!(target = %spec.target, candidate = %candidate, %err, "adapter failure");
                    self.snapshot(spec, "after").await;
                    return Err(LocatorError::AdapterFailure {
                        target: spec.target.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        self.snapshot(spec, "after").await;
        Err(LocatorError::ElementTimeout {
            target: spec.target.clone(),
            attempted: spec.describe_candidates(),
            budget,
        })
    }
}

fn slug(target: &str) -> String {
    target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
