//! Hybrid keyword extraction: a dictionary scorer, a TF-IDF scorer against
//! batch corpus statistics, and a grammatical-role heuristic, merged into a
//! single ranked list.

use std::collections::{BTreeSet, HashMap};

use medlit_common::config::ExtractorConfig;
use medlit_common::{ExtractedKeyword, ExtractionMethod, Result};
use tracing::debug;

use crate::dictionary::MedicalDictionary;
use crate::text;

/// A dictionary hit scores a fixed weight, independent of how often the
/// term repeats in one abstract.
const DICTIONARY_WEIGHT: f64 = 2.0;
const POS_WEIGHT: f64 = 0.8;

/// Minimum occurrences for a term to be TF-IDF relevant in one document.
const MIN_TERM_COUNT: usize = 2;

/// Document frequencies over one enrichment batch. Smoothed IDF, so terms
/// seen in every document still score above zero.
#[derive(Debug, Default, Clone)]
pub struct CorpusStats {
    docs: usize,
    doc_freq: HashMap<String, usize>,
}

impl CorpusStats {
    pub fn from_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stats = Self::default();
        for text in texts {
            stats.docs += 1;
            let unique: BTreeSet<String> = text::content_tokens(text).into_iter().collect();
            for token in unique {
                *stats.doc_freq.entry(token).or_insert(0) += 1;
            }
        }
        stats
    }

    pub fn idf(&self, term: &str) -> f64 {
        let df = self.doc_freq.get(term).copied().unwrap_or(0);
        (((1 + self.docs) as f64) / ((1 + df) as f64)).ln() + 1.0
    }

    pub fn is_empty(&self) -> bool {
        self.docs == 0
    }
}

/// Heuristic stand-in for a part-of-speech filter: keeps noun/adjective-like
/// content tokens, drops adverbs and verb-like function words.
fn looks_like_content_word(token: &str) -> bool {
    const VERBISH: &[&str] = &[
        "showed", "shown", "used", "using", "based", "found", "performed", "treated",
        "observed", "reported", "associated", "compared", "included", "conducted",
    ];
    token.len() > 1 && !token.ends_with("ly") && !VERBISH.contains(&token)
}

pub struct KeywordExtractor {
    top_k: usize,
    min_tfidf_score: f64,
    dictionary: MedicalDictionary,
}

impl KeywordExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let dictionary = match &config.dictionary_path {
            Some(path) => MedicalDictionary::from_json_file(path)?,
            None => MedicalDictionary::embedded(),
        };
        Ok(Self {
            top_k: config.top_k,
            min_tfidf_score: config.min_tfidf_score,
            dictionary,
        })
    }

    pub fn dictionary(&self) -> &MedicalDictionary {
        &self.dictionary
    }

    /// Extract the top-K keywords from `text`. Deterministic: equal scores
    /// order by scorer precedence (dictionary, then TF-IDF, then the
    /// grammatical heuristic), then alphabetically.
    pub fn extract(&self, text: &str, corpus: &CorpusStats) -> Vec<ExtractedKeyword> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut merged: HashMap<String, ExtractedKeyword> = HashMap::new();
        let mut add = |surface: &str, category: Option<&str>, score: f64, method: ExtractionMethod| {
            let key = text::merge_key(surface);
            let entry = merged.entry(key).or_insert_with(|| ExtractedKeyword {
                keyword: surface.to_string(),
                category: None,
                score: 0.0,
                methods: BTreeSet::new(),
            });
            entry.score += score;
            entry.methods.insert(method);
            if entry.category.is_none() {
                entry.category = category.map(str::to_string);
            }
        };

        for hit in self.dictionary.find_matches(text) {
            add(
                &hit.term,
                Some(&hit.category),
                DICTIONARY_WEIGHT,
                ExtractionMethod::Dictionary,
            );
        }

        let tokens = text::content_tokens(text);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }
        let total = tokens.len().max(1) as f64;

        // Fall back to treating the document as its own corpus when no
        // batch statistics were supplied.
        let self_corpus;
        let corpus = if corpus.is_empty() {
            self_corpus = CorpusStats::from_texts([text]);
            &self_corpus
        } else {
            corpus
        };

        for (&token, &count) in &counts {
            if count < MIN_TERM_COUNT {
                continue;
            }
            let score = (count as f64 / total) * corpus.idf(token);
            if score >= self.min_tfidf_score {
                add(token, None, score, ExtractionMethod::Tfidf);
            }
        }

        for token in counts.keys() {
            if looks_like_content_word(token) {
                add(token, None, POS_WEIGHT, ExtractionMethod::Pos);
            }
        }

        let mut ranked: Vec<ExtractedKeyword> = merged.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let pa = a.methods.iter().next();
                    let pb = b.methods.iter().next();
                    pa.cmp(&pb)
                })
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        ranked.truncate(self.top_k);
        debug!(keywords = ranked.len(), "extracted keywords");
        ranked
    }
}
