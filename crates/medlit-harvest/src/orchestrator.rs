//! Crawl orchestration across (keyword, source) jobs.
//!
//! For each job the orchestrator acquires the source's rate limiter, runs
//! the adapter's fetch+normalize under the retry policy, and folds the
//! results into a map keyed by (source, external_id). Duplicates collapse
//! to one paper with first-seen field precedence; later occurrences only
//! fill missing fields. A job failure never aborts sibling jobs — the
//! caller always gets whatever succeeded plus a full failure report.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use medlit_common::{
    CanonicalPaper, CrawlJobState, CrawlRequest, JobKey, MedlitConfig, Result, Source, SourceQuery,
};

use crate::ratelimit::RateLimiterSet;
use crate::retry::RetryPolicy;
use crate::sources::arxiv::ArxivAdapter;
use crate::sources::europepmc::EuropePmcAdapter;
use crate::sources::pubmed::PubMedAdapter;
use crate::sources::SourceAdapter;

/// Result of one orchestration run.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub run_id: Uuid,
    /// Deduplicated papers in first-seen order (jobs iterated
    /// keyword-major, source-minor).
    pub papers: Vec<CanonicalPaper>,
    /// Terminal state per (keyword, source) job.
    pub job_report: HashMap<JobKey, CrawlJobState>,
    pub duration_ms: u64,
}

pub struct Orchestrator {
    adapters: HashMap<Source, Arc<dyn SourceAdapter>>,
    limiters: RateLimiterSet,
    retry: RetryPolicy,
    default_max_results: usize,
}

impl Orchestrator {
    /// Build an orchestrator with the real source adapters.
    pub fn new(config: &MedlitConfig) -> Result<Self> {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(PubMedAdapter::from_config(&config.crawl)?),
            Arc::new(EuropePmcAdapter::new()?),
            Arc::new(ArxivAdapter::new()?),
        ];
        Ok(Self::with_adapters(config, adapters))
    }

    /// Build with caller-supplied adapters (tests, partial deployments).
    pub fn with_adapters(config: &MedlitConfig, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.source(), a)).collect();
        Self {
            adapters,
            limiters: RateLimiterSet::new(&config.crawl),
            retry: RetryPolicy::from_config(&config.retry),
            default_max_results: config.crawl.max_results,
        }
    }

    /// Run the full keyword × source crawl with no deadline.
    pub async fn crawl(&self, request: &CrawlRequest) -> CrawlOutcome {
        self.crawl_until(request, None).await
    }

    /// Run the crawl, cancelling jobs that have not finished by `deadline`.
    /// Cancelled jobs report Failed; completed results are still returned.
    #[instrument(skip_all, fields(keywords = request.keywords.len(), sources = request.sources.len()))]
    pub async fn crawl_until(
        &self,
        request: &CrawlRequest,
        deadline: Option<Instant>,
    ) -> CrawlOutcome {
        let run_id = Uuid::new_v4();
        let t0 = std::time::Instant::now();
        let max_results = if request.max_results > 0 {
            request.max_results
        } else {
            self.default_max_results
        };

        // Keyword-major, source-minor: this dispatch order fixes the
        // first-seen tiebreak for field merging.
        let job_keys: Vec<JobKey> = request
            .keywords
            .iter()
            .flat_map(|kw| {
                request.sources.iter().map(move |&source| JobKey {
                    keyword: kw.clone(),
                    source,
                })
            })
            .collect();

        info!(run_id = %run_id, jobs = job_keys.len(), "starting crawl");

        let futures = job_keys
            .iter()
            .map(|key| self.run_job(key, max_results, deadline));
        let results = join_all(futures).await;

        // Merge in dispatch order regardless of completion order.
        let mut index: HashMap<(Source, String), usize> = HashMap::new();
        let mut papers: Vec<CanonicalPaper> = Vec::new();
        let mut job_report: HashMap<JobKey, CrawlJobState> = HashMap::new();

        for (key, result) in job_keys.into_iter().zip(results) {
            let state = match result {
                Ok(batch) => {
                    debug!(keyword = %key.keyword, source = %key.source, n = batch.len(), "job succeeded");
                    for paper in batch {
                        match index.get(&paper.key()) {
                            Some(&i) => papers[i].merge_missing_from(&paper),
                            None => {
                                index.insert(paper.key(), papers.len());
                                papers.push(paper);
                            }
                        }
                    }
                    CrawlJobState::Succeeded
                }
                Err(e) => {
                    warn!(keyword = %key.keyword, source = %key.source, error = %e, "job failed");
                    CrawlJobState::Failed(e.to_string())
                }
            };
            job_report.insert(key, state);
        }

        let duration_ms = t0.elapsed().as_millis() as u64;
        let failed = job_report
            .values()
            .filter(|s| matches!(s, CrawlJobState::Failed(_)))
            .count();
        info!(
            run_id = %run_id,
            papers = papers.len(),
            jobs = job_report.len(),
            failed,
            duration_ms,
            "crawl complete"
        );

        CrawlOutcome {
            run_id,
            papers,
            job_report,
            duration_ms,
        }
    }

    /// One (keyword, source) job: limiter, then adapter fetch+normalize
    /// under the retry policy. The limiter is re-acquired before every
    /// attempt so retries are paced like first requests.
    async fn run_job(
        &self,
        key: &JobKey,
        max_results: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<CanonicalPaper>> {
        let adapter = match self.adapters.get(&key.source) {
            Some(a) => Arc::clone(a),
            None => {
                return Err(medlit_common::MedlitError::Config(format!(
                    "source not configured: {}",
                    key.source
                )))
            }
        };
        let limiter = self.limiters.get(key.source);

        let attempt = || {
            let adapter = Arc::clone(&adapter);
            let limiter = Arc::clone(&limiter);
            let query = SourceQuery {
                keyword: key.keyword.clone(),
                source: key.source,
                max_results,
            };
            async move {
                limiter.acquire().await;
                let raws = adapter.fetch(&query).await?;
                Ok(raws.into_iter().map(|r| adapter.normalize(r)).collect())
            }
        };

        match deadline {
            Some(at) => match tokio::time::timeout_at(at, self.retry.execute(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(medlit_common::MedlitError::Cancelled(
                    "deadline reached".into(),
                )),
            },
            None => self.retry.execute(attempt).await,
        }
    }
}
