//! medlit-common — Shared types, errors, and configuration used across all MedLit crates.

pub mod config;
pub mod entities;
pub mod error;
pub mod logging;

pub use config::MedlitConfig;
pub use entities::{
    CanonicalPaper, CategoryPrediction, CrawlJobState, CrawlRequest, EnrichedPaper,
    ExtractedKeyword, ExtractionMethod, JobKey, Source, SourceQuery,
};
pub use error::{MedlitError, Result};
