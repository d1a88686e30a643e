use std::time::Duration;

use tokio::time::Instant;

/// Caps throughput by padding each unit of work to a minimum duration
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    max_requests_per_minute: u32,
}

impl RateLimiter {
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute: max_requests_per_minute.max(1),
        }
    }

    pub fn max_requests_per_minute(&self) -> u32 {
        self.max_requests_per_minute
    }

    /// Shortest duration `calls` requests may take: ceil(calls / rpm * 60000) ms
    pub fn min_duration(&self, calls: usize) -> Duration {
        let rpm = u64::from(self.max_requests_per_minute);
        let millis = (calls as u64 * 60_000).div_ceil(rpm);
        Duration::from_millis(millis)
    }

    /// Wait until the work started at `started_at` has lasted long enough.
    ///
    /// Returns how long the caller was held back.
    pub async fn enforce(&self, calls: usize, started_at: Instant) -> Duration {
        let deadline = started_at + self.min_duration(calls);
        let now = Instant::now();
        if now >= deadline {
            return Duration::ZERO;
        }

        let wait = deadline - now;
        tracing::debug!(calls, wait_ms = wait.as_millis() as u64, "Rate limit pause");
        tokio::time::sleep_until(deadline).await;
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_duration_rounds_up() {
        let limiter = RateLimiter::new(7);

        assert_eq!(limiter.min_duration(1), Duration::from_millis(8572));
        assert_eq!(limiter.min_duration(7), Duration::from_secs(60));
        assert_eq!(RateLimiter::new(60).min_duration(5), Duration::from_secs(5));
        assert_eq!(limiter.min_duration(0), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn instant_work_is_padded() {
        let limiter = RateLimiter::new(60);
        let started = Instant::now();

        let waited = limiter.enforce(3, started).await;

        assert_eq!(waited, Duration::from_secs(3));
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_is_not_delayed() {
        let limiter = RateLimiter::new(60);
        let started = Instant::now();
        tokio::time::advance(Duration::from_secs(10)).await;

        let waited = limiter.enforce(3, started).await;

        assert_eq!(waited, Duration::ZERO);
        assert!(started.elapsed() < Duration::from_secs(11));
    }

    #[test]
    fn zero_rpm_is_clamped() {
        assert_eq!(RateLimiter::new(0).max_requests_per_minute(), 1);
    }
}
