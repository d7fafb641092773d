//! Multinomial Naive Bayes over TF-IDF-weighted bags of words, with Laplace
//! smoothing. Trained from labeled title/abstract pairs, or from a seed
//! corpus generated out of the category dictionary so the crate works
//! without any prior training run.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use medlit_common::config::ClassifierConfig;
use medlit_common::{CategoryPrediction, MedlitError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dictionary::{MedicalDictionary, UNCATEGORIZED};
use crate::text;

const SEED_TEMPLATES: [&str; 5] = [
    "This study focuses on {} research and analysis.",
    "We investigated {} in clinical settings.",
    "The {} approach showed significant results.",
    "Novel {} methods were developed.",
    "Patient outcomes improved with {} treatment.",
];

/// One labeled training document: category label plus free text
/// (typically title and abstract concatenated).
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub label: String,
    pub text: String,
}

/// Serializable trained model. Feature weights are summed TF-IDF masses per
/// label; likelihoods are reconstructed with Laplace smoothing at
/// classification time.
#[derive(Debug, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    labels: Vec<String>,
    log_prior: Vec<f64>,
    idf: BTreeMap<String, f64>,
    feature_mass: Vec<BTreeMap<String, f64>>,
    total_mass: Vec<f64>,
}

impl NaiveBayesModel {
    pub fn train(examples: &[TrainingExample]) -> Self {
        let tokenized: Vec<(&str, Vec<String>)> = examples
            .iter()
            .map(|ex| (ex.label.as_str(), text::content_tokens(&ex.text)))
            .collect();

        let docs = tokenized.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for (_, tokens) in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }
        let idf: BTreeMap<String, f64> = doc_freq
            .iter()
            .map(|(&token, &df)| {
                let idf = (((1 + docs) as f64) / ((1 + df) as f64)).ln() + 1.0;
                (token.to_string(), idf)
            })
            .collect();

        let labels: Vec<String> = tokenized
            .iter()
            .map(|(label, _)| label.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut label_docs = vec![0usize; labels.len()];
        let mut feature_mass = vec![BTreeMap::new(); labels.len()];
        let mut total_mass = vec![0.0; labels.len()];

        for (label, tokens) in &tokenized {
            let li = index[label];
            label_docs[li] += 1;
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for token in tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            for (token, count) in counts {
                let weight = count as f64 * idf[token];
                *feature_mass[li].entry(token.to_string()).or_insert(0.0) += weight;
                total_mass[li] += weight;
            }
        }

        let log_prior = label_docs
            .iter()
            .map(|&n| ((n as f64) / (docs.max(1) as f64)).ln())
            .collect();

        Self {
            labels,
            log_prior,
            idf,
            feature_mass,
            total_mass,
        }
    }

    /// Posterior over labels for `text`, normalized via log-sum-exp.
    /// Returns `None` when no token of `text` is in the model vocabulary.
    fn posterior(&self, text: &str) -> Option<Vec<f64>> {
        let tokens = text::content_tokens(text);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            if self.idf.contains_key(token.as_str()) {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return None;
        }

        let vocab = self.idf.len() as f64;
        let mut log_probs: Vec<f64> = Vec::with_capacity(self.labels.len());
        for li in 0..self.labels.len() {
            let mut lp = self.log_prior[li];
            for (&token, &count) in &counts {
                let weight = count as f64 * self.idf[token];
                let mass = self.feature_mass[li].get(token).copied().unwrap_or(0.0);
                lp += weight * ((mass + 1.0) / (self.total_mass[li] + vocab)).ln();
            }
            log_probs.push(lp);
        }

        let max = log_probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = log_probs.iter().map(|&lp| (lp - max).exp()).sum();
        Some(log_probs.iter().map(|&lp| (lp - max).exp() / sum).collect())
    }
}

/// Build the seed training corpus from the dictionary, five template
/// sentences per term per category.
pub fn seed_corpus(dictionary: &MedicalDictionary) -> Vec<TrainingExample> {
    let mut examples = Vec::new();
    for category in dictionary.categories() {
        for term in dictionary.terms_for(category) {
            for template in SEED_TEMPLATES {
                examples.push(TrainingExample {
                    label: category.to_string(),
                    text: template.replace("{}", term),
                });
            }
        }
    }
    examples
}

pub struct CategoryClassifier {
    model: NaiveBayesModel,
    acceptance_threshold: f64,
}

impl CategoryClassifier {
    pub fn new(model: NaiveBayesModel, acceptance_threshold: f64) -> Self {
        Self {
            model,
            acceptance_threshold,
        }
    }

    /// Load the serialized model when `model_path` is set, otherwise train
    /// from the dictionary seed corpus.
    pub fn from_config(config: &ClassifierConfig, dictionary: &MedicalDictionary) -> Result<Self> {
        match &config.model_path {
            Some(path) => Self::load(path, config.acceptance_threshold),
            None => {
                let corpus = seed_corpus(dictionary);
                info!(examples = corpus.len(), "training classifier from seed corpus");
                Ok(Self::new(
                    NaiveBayesModel::train(&corpus),
                    config.acceptance_threshold,
                ))
            }
        }
    }

    /// Argmax label with its posterior probability. Sub-threshold top
    /// probabilities map to the `uncategorized` label, confidence kept.
    /// Text with no vocabulary overlap gets `(uncategorized, 0.0)`.
    pub fn classify(&self, text: &str) -> CategoryPrediction {
        let Some(posterior) = self.model.posterior(text) else {
            return CategoryPrediction {
                label: UNCATEGORIZED.to_string(),
                confidence: 0.0,
            };
        };
        let (best, &confidence) = posterior
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &0.0));
        let label = if confidence >= self.acceptance_threshold {
            self.model.labels[best].clone()
        } else {
            UNCATEGORIZED.to_string()
        };
        CategoryPrediction { label, confidence }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.model)?;
        fs::write(path, json)
            .map_err(|e| MedlitError::Config(format!("write model {}: {e}", path.display())))?;
        info!(path = %path.display(), "classifier model saved");
        Ok(())
    }

    pub fn load(path: &Path, acceptance_threshold: f64) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| MedlitError::Config(format!("read model {}: {e}", path.display())))?;
        let model: NaiveBayesModel = serde_json::from_str(&raw)?;
        Ok(Self::new(model, acceptance_threshold))
    }
}
