//! Bounded retry with exponential backoff and jitter.
//!
//! Transient failures (timeouts, connection resets, HTTP 5xx, 429) are
//! retried; permanent ones propagate immediately. The delay before attempt
//! k (k ≥ 2) is `base_delay * 2^(k-2)` plus uniform jitter in
//! `[0, base_delay)` so concurrent jobs do not retry in lockstep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use medlit_common::config::RetryConfig;
use medlit_common::Result;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.max_attempts, Duration::from_millis(cfg.base_delay_ms))
    }

    /// Delay before attempt `k` (1-based; no delay before the first).
    fn backoff_delay(&self, k: u32) -> Duration {
        debug_assert!(k >= 2);
        let exp = self.base_delay * 2u32.saturating_pow(k - 2);
        let jitter = self.base_delay.mul_f64(rand::thread_rng().gen::<f64>());
        exp + jitter
    }

    /// Run `op` up to `max_attempts` times. The final error is the last
    /// one observed; a permanent error short-circuits.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff_delay(attempt + 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "giving up");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use medlit_common::MedlitError;

    fn transient() -> MedlitError {
        MedlitError::Status { origin: "pubmed", status: 500 }
    }

    fn permanent() -> MedlitError {
        MedlitError::Query("bad".into())
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = Arc::clone(&calls);

        let result: Result<u32> = policy
            .execute(move || {
                let calls = Arc::clone(&calls2);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = Arc::clone(&calls);

        let result: Result<u32> = policy
            .execute(move || {
                let calls = Arc::clone(&calls2);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_aborts_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = Arc::clone(&calls);

        let result: Result<u32> = policy
            .execute(move || {
                let calls = Arc::clone(&calls2);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(permanent())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_with_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        // Jitter is in [0, base); the deterministic part doubles.
        for k in 2..=4u32 {
            let d = policy.backoff_delay(k);
            let expected = Duration::from_millis(100 * 2u64.pow(k - 2));
            assert!(d >= expected);
            assert!(d < expected + Duration::from_millis(100));
        }
    }
}
