//! Bounded retry with exponential backoff for batch writes.
//!
//! ```text
//! attempt 1: immediate
//! attempt 2: wait initial_backoff
//! attempt 3: wait initial_backoff * multiplier
//! ...        capped at max_backoff
//! ```
//!
//! Only [`StoreError::is_retryable`] errors are retried. The default policy
//! performs no retries.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// `min(initial_backoff * multiplier^attempt, max_backoff)`, `attempt`
    /// counted from zero.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let millis =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(millis as u64).min(self.max_backoff)
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// Returns the last result and the number of attempts made.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    mut op: F,
) -> (Result<T, StoreError>, usize)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(err) if err.is_retryable() && attempt <= policy.max_retries => {
                let backoff = policy.backoff(attempt - 1);
                warn!(attempt, ?backoff, error = %err, "retrying batch write");
                sleep(backoff).await;
            }
            result => return (result, attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_backoff_growth_is_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_disabled_policy_makes_one_attempt() {
        let calls = AtomicUsize::new(0);
        let (result, attempts) = retry_with_backoff(&RetryPolicy::disabled(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(StoreError::Throttled("busy".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..RetryPolicy::disabled().with_max_retries(3)
        };
        let (result, attempts) = retry_with_backoff(&policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Transport("reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::disabled().with_max_retries(3);
        let (result, attempts) = retry_with_backoff(&policy, || async {
            Err::<(), _>(StoreError::Rejected("validation".into()))
        })
        .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(attempts, 1);
    }
}
