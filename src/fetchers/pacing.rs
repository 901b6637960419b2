use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Enforces a minimum interval between outbound requests
///
/// One instance is shared by every worker, so the spacing holds process-wide.
pub struct Pacer {
    limiter: Option<DirectRateLimiter>,
}

impl Pacer {
    /// One request per `min_interval`, no bursts; a zero interval never waits
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self { limiter }
    }

    /// A pacer that never waits
    pub fn unpaced() -> Self {
        Self { limiter: None }
    }

    /// Wait until a request may be sent
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_first_request_is_not_delayed() {
        let pacer = Pacer::new(Duration::from_secs(10));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_interval_is_unpaced() {
        let pacer = Pacer::new(Duration::ZERO);
        assert!(pacer.limiter.is_none());

        let start = Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let pacer = Arc::new(Pacer::new(Duration::from_millis(50)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let pacer = Arc::clone(&pacer);
                tokio::spawn(async move { pacer.wait().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Three slots need at least two full intervals
        assert!(start.elapsed() >= Duration::from_millis(95));
    }
}
