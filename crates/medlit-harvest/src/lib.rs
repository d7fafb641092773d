//! medlit-harvest — multi-source literature crawl core.
//!
//! Source adapters translate keyword queries into source-native requests
//! and normalize the responses into [`medlit_common::CanonicalPaper`]s.
//! The orchestrator drives the adapters through a per-source rate limiter
//! and a retry policy, deduplicates across sources, and reports per-job
//! terminal states.

pub mod orchestrator;
pub mod ratelimit;
pub mod retry;
pub mod sources;

pub use orchestrator::{CrawlOutcome, Orchestrator};
pub use ratelimit::{RateLimiter, RateLimiterSet};
pub use retry::RetryPolicy;
