//! Per-host politeness delay for outbound fetches.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Enforces a minimum delay between requests to the same host.
pub struct RateLimiter {
    min_delay: Duration,
    last_request: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: DashMap::new(),
        }
    }

    /// Wait if necessary before making a request to this host.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_request.get(host) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.min_delay {
                sleep(self.min_delay - elapsed).await;
            }
        }

        self.last_request.insert(host.to_string(), Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}
