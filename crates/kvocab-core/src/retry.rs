use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff around a single external call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Still retryable after the last allowed attempt
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("{0}")]
    Fatal(E),
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Delay before retry number `attempt + 1`: base * 2^attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails non-retryably, or retries run out
    pub async fn invoke<T, E, F, Fut, R>(
        &self,
        mut operation: F,
        is_retryable: R,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(attempts = attempt + 1, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !is_retryable(&err) => return Err(RetryError::Fatal(err)),
                Err(err) if attempt >= self.max_retries => {
                    tracing::error!(attempts = attempt + 1, error = %err, "Retries exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last: err,
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Quota,
        Broken,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn retryable(err: &TestError) -> bool {
        *err == TestError::Quota
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100))
    }

    #[test]
    fn backoff_doubles() {
        let policy = policy();

        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert!(policy.backoff(40) > policy.backoff(31));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_k_retryable_failures() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();

        let result = policy()
            .invoke(
                move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(TestError::Quota) } else { Ok(n) }
                },
                retryable,
            )
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_retries_plus_one() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = policy()
            .invoke(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Quota)
                },
                retryable,
            )
            .await;

        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 4, last: TestError::Quota })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = policy()
            .invoke(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Broken)
                },
                retryable,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(TestError::Broken))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_one_attempt() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::new(0, Duration::from_secs(1))
            .invoke(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Quota)
                },
                retryable,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
