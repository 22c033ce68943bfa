//! Retry execution loop

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::policy::RetryPolicy;

/// Typed failure produced when a policy is spent.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("'{label}' failed after {attempts_used} attempts: {last_error}")]
pub struct RetryExhausted<E: fmt::Display + fmt::Debug> {
    pub label: String,
    pub attempts_used: u32,
    pub last_error: E,
}

/// Tagged result of a retried operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome<T, E: fmt::Display + fmt::Debug> {
    Success {
        value: T,
        attempts_used: u32,
        elapsed: Duration,
    },
    Failure(RetryExhausted<E>),
}

impl<T, E: fmt::Display + fmt::Debug> OperationOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    pub fn attempts_used(&self) -> u32 {
        match self {
            OperationOutcome::Success { attempts_used, .. } => *attempts_used,
            OperationOutcome::Failure(exhausted) => exhausted.attempts_used,
        }
    }

    pub fn into_result(self) -> Result<T, RetryExhausted<E>> {
        match self {
            OperationOutcome::Success { value, .. } => Ok(value),
            OperationOutcome::Failure(exhausted) => Err(exhausted),
        }
    }
}

/// Run `operation` under `policy`.
///
/// Exactly `policy.max_attempts` attempts are made against a
/// permanently failing operation, never more, never fewer. Errors are
/// attempt-scoped: nothing propagates until the policy is exhausted.
pub async fn execute<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    label: &str,
) -> OperationOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + fmt::Debug,
{
    let started = Instant::now();
    let mut last_error: Option<E> = None;

    for attempt in 1..=policy.max_attempts {
        let attempt_started = Instant::now();
        match operation().await {
            Ok(value) => {
                debug!(
                    label,
                    attempt,
                    duration_ms = attempt_started.elapsed().as_millis() as u64,
                    "operation succeeded"
                );
                return OperationOutcome::Success {
                    value,
                    attempts_used: attempt,
                    elapsed: started.elapsed(),
                };
            }
            Err(err) => {
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    duration_ms = attempt_started.elapsed().as_millis() as u64,
                    error = %err,
                    "attempt failed"
                );
                last_error = Some(err);

                if attempt < policy.max_attempts {
                    let delay = policy.delay_after(attempt);
                    debug!(label, ?delay, "backing off before next attempt");
                    sleep(delay).await;
                }
            }
        }
    }

    // max_attempts >= 1, so at least one attempt ran and failed.
    let last_error = last_error.expect("at least one attempt must have run");
    OperationOutcome::Failure(RetryExhausted {
        label: label.to_string(),
        attempts_used: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn permanent_failure_uses_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let outcome: OperationOutcome<(), String> = execute(
            move || {
                let calls = calls_in_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("nope".to_string())
                }
            },
            &fast_policy(4),
            "always-fails",
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match outcome {
            OperationOutcome::Failure(exhausted) => {
                assert_eq!(exhausted.attempts_used, 4);
                assert_eq!(exhausted.label, "always-fails");
                assert_eq!(exhausted.last_error, "nope");
            }
            OperationOutcome::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn recovers_midway_and_reports_attempts_used() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in_op = calls.clone();

        let outcome: OperationOutcome<u32, String> = execute(
            move || {
                let calls = calls_in_op.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(format!("transient {n}"))
                    } else {
                        Ok(42)
                    }
                }
            },
            &fast_policy(5),
            "flaky",
        )
        .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts_used(), 3);
        assert_eq!(outcome.into_result().unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_try_success_skips_backoff() {
        let outcome: OperationOutcome<&str, String> = execute(
            || async { Ok("done") },
            &RetryPolicy::new(3, Duration::from_secs(60)),
            "instant",
        )
        .await;

        match outcome {
            OperationOutcome::Success {
                value,
                attempts_used,
                elapsed,
            } => {
                assert_eq!(value, "done");
                assert_eq!(attempts_used, 1);
                assert!(elapsed < Duration::from_secs(1));
            }
            OperationOutcome::Failure(_) => panic!("expected success"),
        }
    }
}
