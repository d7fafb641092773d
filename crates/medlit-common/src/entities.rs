//! Canonical data model shared by the harvest and enrichment crates.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Literature sources the harvester knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    PubMed,
    EuropePmc,
    Arxiv,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::PubMed    => "pubmed",
            Source::EuropePmc => "europepmc",
            Source::Arxiv     => "arxiv",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One keyword query against one source. Immutable; built per orchestration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceQuery {
    pub keyword: String,
    pub source: Source,
    pub max_results: usize,
}

/// Normalized, source-agnostic representation of a literature item.
///
/// Identity key is `(source, external_id)`; the orchestrator guarantees the
/// pair is unique within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalPaper {
    pub external_id: String,
    pub source: Source,
    pub title: String,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub pub_date: Option<NaiveDate>,
    pub doi: Option<String>,
    pub url: String,
    /// Keywords supplied by the source itself (MeSH descriptors, arXiv
    /// category terms). Distinct from extracted keywords.
    pub keywords: Vec<String>,
}

impl CanonicalPaper {
    pub fn key(&self) -> (Source, String) {
        (self.source, self.external_id.clone())
    }

    /// Merge-not-overwrite: fill this paper's empty fields from a later
    /// occurrence of the same identity key. Populated fields are never
    /// replaced; first-seen wins.
    pub fn merge_missing_from(&mut self, other: &CanonicalPaper) {
        if self.abstract_text.is_none() {
            self.abstract_text = other.abstract_text.clone();
        }
        if self.authors.is_empty() {
            self.authors = other.authors.clone();
        }
        if self.journal.is_none() {
            self.journal = other.journal.clone();
        }
        if self.pub_date.is_none() {
            self.pub_date = other.pub_date;
        }
        if self.doi.is_none() {
            self.doi = other.doi.clone();
        }
        if self.keywords.is_empty() {
            self.keywords = other.keywords.clone();
        }
    }
}

/// Which scorer proposed a keyword. Ordering doubles as the ranking
/// tie-break precedence: dictionary before tfidf before pos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Dictionary,
    Tfidf,
    Pos,
}

/// A scored keyword extracted from a paper's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedKeyword {
    /// Normalized (case-folded) surface form. Dictionary phrases keep their
    /// canonical multi-word form; single tokens are lemmatized.
    pub keyword: String,
    /// Dictionary category, when the dictionary scorer contributed.
    pub category: Option<String>,
    /// Combined score: sum of the per-method scores that proposed it.
    pub score: f64,
    pub methods: BTreeSet<ExtractionMethod>,
}

/// The classifier's verdict for one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrediction {
    /// One of the fixed category labels, or "uncategorized" when the top
    /// probability falls below the acceptance threshold.
    pub label: String,
    /// Top-class probability in [0, 1], reported even when sub-threshold.
    pub confidence: f64,
}

/// A canonical paper plus its enrichment, handed to external persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPaper {
    #[serde(flatten)]
    pub paper: CanonicalPaper,
    /// Ranked descending by combined score.
    pub extracted_keywords: Vec<ExtractedKeyword>,
    pub category: CategoryPrediction,
}

/// Terminal and in-flight states of one (keyword, source) crawl job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum CrawlJobState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
}

/// Identity of one (keyword, source) job in the job report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub keyword: String,
    pub source: Source,
}

/// Inbound crawl request from the CLI/API collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub keywords: Vec<String>,
    pub sources: Vec<Source>,
    pub max_results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(abstract_text: Option<&str>, doi: Option<&str>) -> CanonicalPaper {
        CanonicalPaper {
            external_id: "123".into(),
            source: Source::PubMed,
            title: "Title".into(),
            abstract_text: abstract_text.map(String::from),
            authors: vec![],
            journal: None,
            pub_date: None,
            doi: doi.map(String::from),
            url: "https://pubmed.ncbi.nlm.nih.gov/123/".into(),
            keywords: vec![],
        }
    }

    #[test]
    fn merge_fills_only_missing_fields() {
        let mut first = paper(None, Some("10.1/a"));
        let later = paper(Some("Later abstract."), Some("10.1/b"));
        first.merge_missing_from(&later);
        assert_eq!(first.abstract_text.as_deref(), Some("Later abstract."));
        // First-seen DOI wins.
        assert_eq!(first.doi.as_deref(), Some("10.1/a"));
    }

    #[test]
    fn method_precedence_orders_dictionary_first() {
        assert!(ExtractionMethod::Dictionary < ExtractionMethod::Tfidf);
        assert!(ExtractionMethod::Tfidf < ExtractionMethod::Pos);
    }
}
