//! Text normalization shared by the extractor and the classifier:
//! case-folding, tokenization, stop-word filtering, and a suffix-rule
//! lemmatizer for English plurals.

use std::collections::HashSet;
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may", "me",
    "might", "more", "most", "must", "my", "no", "nor", "not", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Reduce an English plural to its singular form with suffix rules.
/// Singulars and non-plural `-s` endings (`-ss`, `-us`, `-is`) pass through.
pub fn lemmatize(word: &str) -> String {
    let w = word.to_lowercase();
    if w.len() > 4 && w.ends_with("ies") {
        return format!("{}y", &w[..w.len() - 3]);
    }
    if w.ends_with("sses") {
        return w[..w.len() - 2].to_string();
    }
    if w.len() > 4
        && (w.ends_with("xes") || w.ends_with("ches") || w.ends_with("shes") || w.ends_with("zes"))
    {
        return w[..w.len() - 2].to_string();
    }
    if w.ends_with("ss") || w.ends_with("us") || w.ends_with("is") {
        return w;
    }
    if w.len() > 3 && w.ends_with('s') {
        return w[..w.len() - 1].to_string();
    }
    w
}

/// Case-folded alphabetic tokens with stop words and short tokens removed,
/// each reduced by [`lemmatize`]. This is the token stream every scorer and
/// the classifier operate on.
pub fn content_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2 && t.chars().all(|c| c.is_alphabetic()))
        .map(|t| t.to_lowercase())
        .filter(|t| !is_stop_word(t))
        .map(|t| lemmatize(&t))
        .collect()
}

/// Merge key for a (possibly multi-word) keyword surface form: case-folded,
/// each word lemmatized, single-space separated.
pub fn merge_key(surface: &str) -> String {
    surface
        .split_whitespace()
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemmatize_handles_common_plurals() {
        assert_eq!(lemmatize("studies"), "study");
        assert_eq!(lemmatize("blockers"), "blocker");
        assert_eq!(lemmatize("diseases"), "disease");
        assert_eq!(lemmatize("processes"), "process");
        assert_eq!(lemmatize("boxes"), "box");
    }

    #[test]
    fn lemmatize_leaves_non_plurals_alone() {
        assert_eq!(lemmatize("diagnosis"), "diagnosis");
        assert_eq!(lemmatize("virus"), "virus");
        assert_eq!(lemmatize("illness"), "illness");
        assert_eq!(lemmatize("gas"), "gas");
    }

    #[test]
    fn content_tokens_drop_stop_words_and_short_tokens() {
        let tokens = content_tokens("The patient was treated with beta blockers at 5 mg.");
        assert_eq!(tokens, vec!["patient", "treated", "beta", "blocker"]);
    }

    #[test]
    fn merge_key_normalizes_phrases() {
        assert_eq!(merge_key("Beta Blockers"), "beta blocker");
        assert_eq!(merge_key("myocardial infarction"), "myocardial infarction");
    }
}
