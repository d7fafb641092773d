//! Enrichment pipeline: keyword extraction and classification applied to a
//! deduplicated crawl batch, and the library-level harvest-and-enrich
//! entry point.

use std::collections::HashMap;

use medlit_common::{
    CanonicalPaper, CrawlJobState, CrawlRequest, EnrichedPaper, JobKey, MedlitConfig, Result,
};
use medlit_harvest::Orchestrator;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::CategoryClassifier;
use crate::keywords::{CorpusStats, KeywordExtractor};

/// The full crawl-and-enrich result handed to external persistence.
#[derive(Debug)]
pub struct CrawlResponse {
    pub run_id: Uuid,
    pub papers: Vec<EnrichedPaper>,
    pub job_report: HashMap<JobKey, CrawlJobState>,
    pub duration_ms: u64,
}

pub struct EnrichmentPipeline {
    extractor: KeywordExtractor,
    classifier: CategoryClassifier,
}

impl EnrichmentPipeline {
    pub fn new(config: &MedlitConfig) -> Result<Self> {
        let extractor = KeywordExtractor::new(&config.extractor)?;
        let classifier = CategoryClassifier::from_config(&config.classifier, extractor.dictionary())?;
        Ok(Self {
            extractor,
            classifier,
        })
    }

    fn paper_text(paper: &CanonicalPaper) -> String {
        match &paper.abstract_text {
            Some(abstract_text) => format!("{}. {}", paper.title, abstract_text),
            None => paper.title.clone(),
        }
    }

    /// Enrich every paper in the batch. Corpus statistics for TF-IDF are
    /// computed once over the whole batch. Enrichment never drops or fails
    /// a record: at worst a paper gets no keywords and an uncategorized
    /// label with zero confidence.
    pub fn enrich_batch(&self, papers: Vec<CanonicalPaper>) -> Vec<EnrichedPaper> {
        let texts: Vec<String> = papers.iter().map(Self::paper_text).collect();
        let corpus = CorpusStats::from_texts(texts.iter().map(String::as_str));

        papers
            .into_iter()
            .zip(&texts)
            .map(|(paper, text)| {
                let extracted_keywords = self.extractor.extract(text, &corpus);
                let category = self.classifier.classify(text);
                debug!(
                    external_id = %paper.external_id,
                    source = %paper.source,
                    keywords = extracted_keywords.len(),
                    category = %category.label,
                    "paper enriched"
                );
                EnrichedPaper {
                    paper,
                    extracted_keywords,
                    category,
                }
            })
            .collect()
    }
}

/// Crawl all requested (keyword, source) combinations, then enrich the
/// deduplicated batch. Job-level crawl failures stay in the job report;
/// enrichment itself never fails a record.
pub async fn harvest_and_enrich(
    config: &MedlitConfig,
    request: &CrawlRequest,
) -> Result<CrawlResponse> {
    let pipeline = EnrichmentPipeline::new(config)?;
    let orchestrator = Orchestrator::new(config)?;

    let outcome = orchestrator.crawl(request).await;
    let papers = pipeline.enrich_batch(outcome.papers);
    info!(
        run_id = %outcome.run_id,
        papers = papers.len(),
        "harvest and enrichment complete"
    );

    Ok(CrawlResponse {
        run_id: outcome.run_id,
        papers,
        job_report: outcome.job_report,
        duration_ms: outcome.duration_ms,
    })
}
