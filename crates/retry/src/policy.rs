//! Retry policy

use std::time::Duration;

/// Immutable retry parameters for one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Hard ceiling on attempts, always at least 1.
    pub max_attempts: u32,

    /// Base unit for the linear backoff ramp.
    pub base_delay: Duration,

    /// Multiplier applied on top of the linear term. 1.0 reproduces
    /// plain `base_delay * attempt`.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_factor: 1.0,
        }
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        self
    }

    /// Delay inserted after failed attempt `attempt` (1-based), i.e.
    /// before attempt `attempt + 1`: `base_delay * attempt * factor`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.mul_f64(attempt as f64 * self.backoff_factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_count_is_clamped_to_at_least_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    }

    #[test]
    fn factor_scales_the_linear_term() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_backoff_factor(2.0);
        assert_eq!(policy.delay_after(2), Duration::from_millis(400));

        let bad = RetryPolicy::default().with_backoff_factor(f64::NAN);
        assert_eq!(bad.backoff_factor, 1.0);
    }
}
