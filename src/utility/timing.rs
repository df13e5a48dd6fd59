// ============================================
// TIMING UTILITY - Feed latency logging
// ============================================
// Usage:
//   1. Guard: let timer = Timer::start("name"); ... drop(timer);
//   2. Async wrapper: timed_async_if_slow("name", 1500, || async { .. }).await;
// ============================================

use std::time::{Duration, Instant};

/// Logs the elapsed time of a named operation when dropped
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self::start_with_threshold(name, 0)
    }

    /// Only operations slower than `threshold_ms` are logged at warn level
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    fn log_duration(&self, duration: Duration) {
        let ms = duration.as_millis();

        if self.threshold_ms > 0 && ms >= self.threshold_ms {
            tracing::warn!(operation = %self.name, elapsed_ms = ms as u64, "slow operation");
        } else {
            tracing::debug!(operation = %self.name, elapsed_ms = ms as u64, "operation finished");
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.log_duration(duration);
    }
}

/// Time an async function, warning if it exceeds `threshold_ms`
pub async fn timed_async_if_slow<F, Fut, R>(name: impl Into<String>, threshold_ms: u128, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    let _timer = Timer::start_with_threshold(name, threshold_ms);
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_async_returns_inner_value() {
        let value = timed_async_if_slow("noop", 10_000, || async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = Timer::start("tick");
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() > first);
        assert!(timer.elapsed_ms() >= 2);
    }
}
