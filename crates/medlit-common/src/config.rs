//! Configuration loading for MedLit.
//! Reads medlit.toml from the current directory or the path in MEDLIT_CONFIG.
//!
//! Loaded once at startup and passed by reference into the orchestrator,
//! extractor, and classifier; never reloaded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::Source;
use crate::error::{MedlitError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedlitConfig {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Minimum delay between two requests to the same source.
    #[serde(default = "default_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// NCBI key raises the PubMed request allowance.
    pub pubmed_api_key: Option<String>,
    pub pubmed_email: Option<String>,
    pub pubmed: Option<SourceConfig>,
    pub europepmc: Option<SourceConfig>,
    pub arxiv: Option<SourceConfig>,
}

fn default_interval_ms() -> u64 { 1000 }
fn default_max_results() -> usize { 100 }

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_interval_ms(),
            max_results: default_max_results(),
            pubmed_api_key: None,
            pubmed_email: None,
            pubmed: None,
            europepmc: None,
            arxiv: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub min_interval_ms: Option<u64>,
}

impl CrawlConfig {
    /// Per-source request interval, falling back to the global default.
    pub fn interval_for(&self, source: Source) -> Duration {
        let per_source = match source {
            Source::PubMed    => &self.pubmed,
            Source::EuropePmc => &self.europepmc,
            Source::Arxiv     => &self.arxiv,
        };
        let ms = per_source
            .as_ref()
            .and_then(|s| s.min_interval_ms)
            .unwrap_or(self.min_interval_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 500 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_tfidf_score")]
    pub min_tfidf_score: f64,
    /// JSON dictionary file; the embedded dictionary is used when unset.
    pub dictionary_path: Option<PathBuf>,
}

fn default_top_k() -> usize { 20 }
fn default_min_tfidf_score() -> f64 { 0.05 }

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_tfidf_score: default_min_tfidf_score(),
            dictionary_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,
    /// Serialized model; trained from the embedded seed corpus when unset.
    pub model_path: Option<PathBuf>,
}

fn default_acceptance_threshold() -> f64 { 0.35 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            model_path: None,
        }
    }
}

impl MedlitConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MedlitError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| MedlitError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Load from MEDLIT_CONFIG or ./medlit.toml, defaulting when neither exists.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("MEDLIT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("medlit.toml"));
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn load_reads_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medlit.toml");
        std::fs::write(
            &path,
            "[crawl]\nmax_results = 25\n\n[retry]\nmax_attempts = 5\n",
        )
        .unwrap();

        let cfg = MedlitConfig::load(&path).unwrap();
        assert_eq!(cfg.crawl.max_results, 25);
        assert_eq!(cfg.retry.max_attempts, 5);

        let err = MedlitConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, MedlitError::Config(_)));
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = MedlitConfig::default();
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.crawl.min_interval_ms, 1000);
        assert_eq!(cfg.extractor.top_k, 20);
        assert!(cfg.classifier.acceptance_threshold > 0.0);
        assert!(cfg.classifier.acceptance_threshold < 1.0);
    }

    #[test]
    fn per_source_interval_overrides_global() {
        let cfg: MedlitConfig = toml::from_str(
            r#"
            [crawl]
            min_interval_ms = 2000

            [crawl.pubmed]
            min_interval_ms = 350
            "#,
        )
        .unwrap();
        assert_eq!(cfg.crawl.interval_for(Source::PubMed), Duration::from_millis(350));
        assert_eq!(cfg.crawl.interval_for(Source::Arxiv), Duration::from_millis(2000));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: MedlitConfig = toml::from_str("[classifier]\nacceptance_threshold = 0.5\n").unwrap();
        assert_eq!(cfg.classifier.acceptance_threshold, 0.5);
        assert_eq!(cfg.retry.base_delay_ms, 500);
    }
}
