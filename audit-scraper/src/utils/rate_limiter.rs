//! Request serialization with a mandatory post-call delay
//!
//! The upstream throttles aggressively, so every call must be followed by a
//! fixed quiet period before the next one starts. [`RateLimiter::run`] is the
//! single acquire-before-call point: it waits out the quiet period, runs the
//! call while holding the slot, and stamps the completion time.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces `interval` between the end of one call and the start of the next
#[derive(Debug)]
pub struct RateLimiter {
    last_completed: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_completed: Mutex::new(None),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `call` once the slot is free and the quiet period has elapsed
    pub async fn run<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_completed.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        let output = call().await;
        *last = Some(Instant::now());
        output
    }
}
