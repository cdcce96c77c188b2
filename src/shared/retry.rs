//! Retry with exponential backoff for flaky outbound calls.

use crate::domain::DomainError;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of additional attempts after the first.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry; doubles for each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one. `0` means a single attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds or the retry budget is spent.
    /// `op` receives the 0-based attempt number. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, DomainError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_retries => {
                    warn!(
                        label,
                        attempts = attempt + 1,
                        error = %e,
                        "giving up after final attempt"
                    );
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    let wait = self.delay_for(attempt);
                    info!(
                        label,
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        "retrying ({}/{})",
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_two_doubling_delays() {
        let policy = RetryPolicy::default();
        let stamps = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&stamps);
        let result = policy
            .run("test", move |attempt| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(Instant::now());
                    if attempt < 2 {
                        Err(DomainError::Dispatch("flaky".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 3);
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert_eq!(first_gap, Duration::from_secs(2));
        assert_eq!(second_gap, first_gap * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let calls = Arc::new(Mutex::new(0u32));

        let counter = Arc::clone(&calls);
        let result: Result<(), _> = policy
            .run("test", move |attempt| {
                let counter = Arc::clone(&counter);
                async move {
                    *counter.lock().unwrap() += 1;
                    Err(DomainError::Dispatch(format!("attempt {}", attempt)))
                }
            })
            .await;

        assert_eq!(*calls.lock().unwrap(), 3);
        match result {
            Err(DomainError::Dispatch(msg)) => assert_eq!(msg, "attempt 2"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(60));
        let result: Result<(), _> = policy
            .run("test", |_| async { Err(DomainError::Dispatch("no".into())) })
            .await;
        assert!(result.is_err());
    }
}
