// ledger/src/retry.rs

use std::future::Future;
use std::time::Duration;

use log::warn;
use models::EhrResult;

/// Bounded retry policy for ledger submissions. Only read-conflict
/// rejections are retried; the wait before attempt n+1 is
/// `backoff_base * n`, so the default policy sleeps 100ms, 200ms, 300ms,
/// 400ms across its five attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            backoff_base: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            backoff_base,
        }
    }

    /// Wait after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }
}

/// Run `op` under the policy. `op` is re-invoked from scratch on every
/// attempt; non-retriable errors and exhaustion propagate the last error.
pub async fn submit_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> EhrResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EhrResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && attempt < policy.max_attempts => {
                warn!(
                    "ledger submit conflict, retrying ({attempt}/{}): {err}",
                    policy.max_attempts
                );
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use models::EhrError;

    use super::{submit_with_retry, RetryPolicy};

    #[tokio::test(start_paused = true)]
    async fn conflicts_exhaust_after_five_attempts_with_linear_backoff() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = submit_with_retry(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(EhrError::ReadConflict("mvcc".into())) }
        })
        .await;

        assert!(matches!(result, Err(EhrError::ReadConflict(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        // 100 + 200 + 300 + 400 ms of inter-attempt waits.
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn non_retriable_errors_fail_on_first_attempt() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = submit_with_retry(&policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(EhrError::Ledger("endorsement failed".into())) }
        })
        .await;

        assert!(matches!(result, Err(EhrError::Ledger(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_a_later_attempt_succeeds() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);

        let result = submit_with_retry(&policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(EhrError::ReadConflict("mvcc".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
