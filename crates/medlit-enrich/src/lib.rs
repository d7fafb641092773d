//! medlit-enrich — Keyword extraction and category classification for
//! harvested papers, plus the end-to-end harvest-and-enrich entry point.

pub mod classifier;
pub mod dictionary;
pub mod keywords;
pub mod pipeline;
pub mod text;

pub use classifier::CategoryClassifier;
pub use dictionary::MedicalDictionary;
pub use keywords::{CorpusStats, KeywordExtractor};
pub use pipeline::{harvest_and_enrich, CrawlResponse, EnrichmentPipeline};
