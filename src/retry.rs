//! Shared retry policy with exponential backoff.
//!
//! One policy serves both the NAS transport and the database layer.
//! Only errors classified as transient are re-attempted; validation and
//! integrity errors fail on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Retry configuration for exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the delay between retries
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy with near-zero delays, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Execute `op` under the policy, retrying transient errors with
/// exponential backoff.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op_name: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    let mut delay = policy.base_delay;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    op = op_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                delay = std::cmp::min(
                    Duration::from_millis(
                        (delay.as_millis() as f64 * policy.backoff_multiplier) as u64,
                    ),
                    policy.max_delay,
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_after_two_transient_failures() {
        let policy = RetryPolicy::immediate(3);
        let attempts = AtomicU32::new(0);

        let result = with_retry(&policy, "test_op", || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(AppError::Transient("connection refused".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_on_persistent_transient_error() {
        let policy = RetryPolicy::immediate(3);
        let attempts = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, "test_op", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Transient("timeout".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Transient(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validation_error_is_not_retried() {
        let policy = RetryPolicy::immediate(3);
        let attempts = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, "test_op", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Validation("duplicate key".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_attempt_success_skips_backoff() {
        let policy = RetryPolicy::default();
        let result = with_retry(&policy, "test_op", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
