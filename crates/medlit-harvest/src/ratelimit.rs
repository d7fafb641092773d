//! Per-source request pacing.
//!
//! One limiter per source, configured with a minimum inter-request
//! interval. `acquire` blocks the caller until the interval since the last
//! grant has elapsed. Grants for the same source are FIFO (the tokio mutex
//! queues waiters fairly); limiters for different sources are independent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use medlit_common::config::CrawlConfig;
use medlit_common::Source;

pub struct RateLimiter {
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Wait until at least `interval` has passed since the previous grant,
    /// then record this grant. The wait happens while the lock is held so
    /// that waiters are granted in arrival order and stay spaced apart.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// One limiter per source, built from the crawl configuration.
pub struct RateLimiterSet {
    limiters: HashMap<Source, Arc<RateLimiter>>,
}

impl RateLimiterSet {
    pub fn new(cfg: &CrawlConfig) -> Self {
        let limiters = [Source::PubMed, Source::EuropePmc, Source::Arxiv]
            .into_iter()
            .map(|s| (s, Arc::new(RateLimiter::new(cfg.interval_for(s)))))
            .collect();
        Self { limiters }
    }

    pub fn get(&self, source: Source) -> Arc<RateLimiter> {
        // All sources are registered in new().
        Arc::clone(&self.limiters[&source])
    }

    pub async fn acquire(&self, source: Source) {
        self.get(source).acquire().await;
    }
}
