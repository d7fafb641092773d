//! Literature source adapters.

pub mod arxiv;
pub mod europepmc;
pub mod pubmed;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use medlit_common::{CanonicalPaper, MedlitError, Result, Source, SourceQuery};

/// User-Agent for all outbound requests.
pub(crate) const USER_AGENT: &str = "MedLitAgent/1.0 (Medical Literature Crawler)";

/// Common interface for all source adapters.
///
/// `fetch` issues the outbound network calls, applies pagination, and
/// validates every payload; it never returns more than
/// `query.max_results` records. `normalize` is pure and total over any
/// record `fetch` produced — malformed payloads are rejected at fetch
/// time, never surfaced downstream.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Search the source and return validated raw records.
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>>;

    /// Map a raw record to the canonical shape.
    fn normalize(&self, raw: RawRecord) -> CanonicalPaper {
        raw.into_canonical()
    }
}

/// Source-native record, validated at fetch time. One variant per source;
/// adding a source means adding a variant, not touching the orchestrator.
#[derive(Debug, Clone)]
pub enum RawRecord {
    PubMed(pubmed::PubMedArticle),
    EuropePmc(europepmc::EpmcResult),
    Arxiv(arxiv::ArxivEntry),
}

impl RawRecord {
    fn into_canonical(self) -> CanonicalPaper {
        match self {
            RawRecord::PubMed(a) => a.into_canonical(),
            RawRecord::EuropePmc(r) => r.into_canonical(),
            RawRecord::Arxiv(e) => e.into_canonical(),
        }
    }
}

/// Shared HTTP client configuration for all adapters.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(MedlitError::Http)
}

/// Reject empty keywords before any network call goes out.
pub(crate) fn validate_query(query: &SourceQuery) -> Result<()> {
    if query.keyword.trim().is_empty() {
        return Err(MedlitError::Query("empty keyword".into()));
    }
    if query.max_results == 0 {
        return Err(MedlitError::Query("max_results must be positive".into()));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` (or bare `YYYY`) date string, degrading partial
/// dates to January 1st.
pub(crate) fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(d) = s
        .get(..10)
        .and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok())
    {
        return Some(d);
    }
    s.get(..4)
        .and_then(|y| y.parse::<i32>().ok())
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
}
