//! Intervention session state machine and poll loop

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use browser_adapter::Browser;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::InterventionError;

/// One bounded wait for an operator-completed step.
#[derive(Clone, Debug)]
pub struct InterventionRequest {
    /// What the operator must do, verbatim.
    pub instruction: String,

    /// Hard window for the whole wait.
    pub max_wait_time: Duration,

    /// Pause between success-condition checks.
    pub check_interval: Duration,

    /// Label prefix for diagnostic screenshots.
    pub screenshot_label: String,
}

impl InterventionRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            max_wait_time: Duration::from_secs(300),
            check_interval: Duration::from_secs(2),
            screenshot_label: "manual-intervention".to_string(),
        }
    }

    pub fn with_window(mut self, max_wait_time: Duration, check_interval: Duration) -> Self {
        self.max_wait_time = max_wait_time;
        self.check_interval = check_interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_screenshot_label(mut self, label: impl Into<String>) -> Self {
        self.screenshot_label = label.into();
        self
    }
}

/// Successful resolution of a session.
#[derive(Clone, Debug)]
pub struct InterventionOutcome {
    pub checks: u32,
    pub waited: Duration,
}

/// Terminal-or-waiting session state. Terminal states are never left.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SessionState {
    Waiting,
    Satisfied,
    TimedOut,
}

/// Suspends automation and polls a success condition on behalf of a
/// human operator. At most one session is active at a time; polling is
/// cooperative and never contends with other automation steps.
pub struct InterventionCoordinator {
    browser: Arc<dyn Browser>,
    cancel: CancellationToken,
}

impl InterventionCoordinator {
    pub fn new(browser: Arc<dyn Browser>, cancel: CancellationToken) -> Self {
        Self { browser, cancel }
    }

    /// Wait for the operator to satisfy `condition`.
    ///
    /// A condition error counts as "not yet satisfied", never as fatal.
    /// Cancellation is honored within one `check_interval`. Exceeding
    /// `max_wait_time` yields [`InterventionError::Timeout`] and the
    /// session is discarded.
    pub async fn await_manual_completion<F, Fut, E>(
        &self,
        request: &InterventionRequest,
        condition: F,
    ) -> Result<InterventionOutcome, InterventionError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let deadline = started + request.max_wait_time;
        let mut state = SessionState::Waiting;
        let mut checks: u32 = 0;

        self.announce(request);
        self.capture(&format!("{}-start", request.screenshot_label))
            .await;

        while state == SessionState::Waiting {
            if self.cancel.is_cancelled() {
                return Err(InterventionError::Cancelled(request.instruction.clone()));
            }

            checks += 1;
            match condition().await {
                Ok(true) => {
                    state = SessionState::Satisfied;
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    // Expected while the page is mid-transition.
                    debug!(check = checks, %err, "success condition not evaluable yet");
                }
            }

            // Progress note every fifth check, as a countdown.
            if checks % 5 == 0 {
                let remaining = deadline.saturating_duration_since(Instant::now());
                info!(
                    remaining_secs = remaining.as_secs(),
                    "still waiting for operator"
                );
            }

            let now = Instant::now();
            if now >= deadline {
                state = SessionState::TimedOut;
                break;
            }

            let pause = request.check_interval.min(deadline - now);
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(InterventionError::Cancelled(request.instruction.clone()));
                }
                _ = sleep(pause) => {}
            }
        }

        match state {
            SessionState::Satisfied => {
                info!(checks, "manual intervention completed");
                self.capture(&format!("{}-success", request.screenshot_label))
                    .await;
                Ok(InterventionOutcome {
                    checks,
                    waited: started.elapsed(),
                })
            }
            SessionState::TimedOut => {
                warn!(
                    instruction = %request.instruction,
                    waited = ?started.elapsed(),
                    "manual intervention timed out"
                );
                self.capture(&format!("{}-timeout", request.screenshot_label))
                    .await;
                Err(InterventionError::Timeout {
                    instruction: request.instruction.clone(),
                    waited: request.max_wait_time,
                })
            }
            SessionState::Waiting => unreachable!("loop exits only via a terminal state"),
        }
    }

    /// Announce the instruction and deadline on the human channel.
    fn announce(&self, request: &InterventionRequest) {
        let minutes = request.max_wait_time.as_secs() / 60;
        let seconds = request.max_wait_time.as_secs() % 60;
        eprintln!("{}", "=".repeat(72));
        eprintln!("MANUAL INTERVENTION REQUIRED");
        eprintln!("{}", "=".repeat(72));
        eprintln!("Instruction: {}", request.instruction);
        eprintln!("Time limit:  {minutes}m{seconds:02}s");
        eprintln!("Automation is paused; it resumes when the step is detected.");
        eprintln!("{}", "=".repeat(72));
        info!(instruction = %request.instruction, window = ?request.max_wait_time, "manual intervention requested");
    }

    /// Screenshot failures never change the wait's outcome.
    async fn capture(&self, label: &str) {
        if let Err(err) = self.browser.capture_image(label).await {
            warn!(label, %err, "intervention screenshot failed");
        }
    }
}
