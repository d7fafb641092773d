//! Medical term dictionary keyed by category. Ships with an embedded
//! vocabulary; an external JSON file of the same shape can replace it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use medlit_common::{MedlitError, Result};
use regex::Regex;

/// The fixed category labels, in classifier output order.
pub const CATEGORIES: [&str; 15] = [
    "cardiology",
    "oncology",
    "neurology",
    "immunology",
    "pharmacology",
    "genetics",
    "infectious_diseases",
    "surgery",
    "pediatrics",
    "psychiatry",
    "radiology",
    "pathology",
    "epidemiology",
    "public_health",
    "clinical_trials",
];

/// Label used when no category clears the acceptance threshold.
pub const UNCATEGORIZED: &str = "uncategorized";

fn embedded_terms() -> BTreeMap<String, Vec<String>> {
    let seed: [(&str, &[&str]); 15] = [
        (
            "cardiology",
            &[
                "heart",
                "cardiac",
                "cardiovascular",
                "coronary",
                "myocardial",
                "myocardial infarction",
                "heart failure",
                "arrhythmia",
                "atrial fibrillation",
                "hypertension",
                "beta blockers",
            ],
        ),
        (
            "oncology",
            &[
                "cancer",
                "tumor",
                "malignant",
                "chemotherapy",
                "oncology",
                "carcinoma",
                "metastasis",
                "radiotherapy",
                "immunotherapy",
            ],
        ),
        (
            "neurology",
            &[
                "brain",
                "neurological",
                "stroke",
                "epilepsy",
                "neural",
                "seizure",
                "alzheimer",
                "parkinson",
                "multiple sclerosis",
            ],
        ),
        (
            "immunology",
            &[
                "immune",
                "immunology",
                "antibody",
                "antigen",
                "vaccination",
                "autoimmune",
                "cytokine",
                "lymphocyte",
                "inflammation",
            ],
        ),
        (
            "pharmacology",
            &[
                "drug",
                "medication",
                "pharmaceutical",
                "pharmacology",
                "dosage",
                "pharmacokinetics",
                "adverse effects",
                "drug interaction",
            ],
        ),
        (
            "genetics",
            &[
                "genetic",
                "dna",
                "gene",
                "genome",
                "hereditary",
                "mutation",
                "chromosome",
                "gene expression",
                "genomic sequencing",
            ],
        ),
        (
            "infectious_diseases",
            &[
                "infection",
                "bacterial",
                "viral",
                "antibiotic",
                "pathogen",
                "sepsis",
                "antimicrobial resistance",
                "influenza",
                "tuberculosis",
            ],
        ),
        (
            "surgery",
            &[
                "surgery",
                "surgical",
                "operation",
                "operative",
                "laparoscopic",
                "transplantation",
                "resection",
                "postoperative",
            ],
        ),
        (
            "pediatrics",
            &[
                "pediatric",
                "children",
                "infant",
                "child",
                "adolescent",
                "neonatal",
                "congenital",
                "childhood",
            ],
        ),
        (
            "psychiatry",
            &[
                "psychiatric",
                "mental",
                "depression",
                "anxiety",
                "psychological",
                "schizophrenia",
                "bipolar disorder",
                "mental health",
            ],
        ),
        (
            "radiology",
            &[
                "radiology",
                "imaging",
                "mri",
                "computed tomography",
                "ultrasound",
                "radiograph",
                "contrast agent",
                "pet scan",
            ],
        ),
        (
            "pathology",
            &[
                "pathology",
                "biopsy",
                "histology",
                "lesion",
                "cytology",
                "specimen",
                "histopathological",
                "staining",
            ],
        ),
        (
            "epidemiology",
            &[
                "epidemiology",
                "prevalence",
                "incidence",
                "cohort",
                "risk factor",
                "outbreak",
                "case control",
                "surveillance",
            ],
        ),
        (
            "public_health",
            &[
                "public health",
                "health policy",
                "prevention",
                "screening",
                "health promotion",
                "community health",
                "health disparities",
            ],
        ),
        (
            "clinical_trials",
            &[
                "clinical trial",
                "randomized",
                "placebo",
                "double blind",
                "efficacy",
                "enrollment",
                "intervention arm",
                "endpoint",
            ],
        ),
    ];
    seed.iter()
        .map(|(cat, terms)| {
            (
                cat.to_string(),
                terms.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

/// A single dictionary hit in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryMatch {
    /// Canonical (lower-case) dictionary form of the matched term.
    pub term: String,
    pub category: String,
}

pub struct MedicalDictionary {
    terms: BTreeMap<String, Vec<String>>,
    /// One whole-word alternation per category, longest term first so
    /// multi-word phrases win over their single-word prefixes.
    matchers: BTreeMap<String, Regex>,
}

impl MedicalDictionary {
    pub fn embedded() -> Self {
        // The embedded vocabulary is static and known to compile.
        Self::build(embedded_terms()).expect("embedded dictionary is valid")
    }

    /// Load a `{ "category": ["term", ...] }` JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| MedlitError::Config(format!("dictionary {}: {e}", path.display())))?;
        let terms: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        Self::build(terms)
    }

    fn build(terms: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut matchers = BTreeMap::new();
        for (category, list) in &terms {
            if list.is_empty() {
                continue;
            }
            let mut sorted: Vec<&String> = list.iter().collect();
            sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            let pattern = sorted
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            let matcher = Regex::new(&format!(r"(?i)\b({pattern})\b"))
                .map_err(|e| MedlitError::Config(format!("dictionary term in {category}: {e}")))?;
            matchers.insert(category.clone(), matcher);
        }
        Ok(Self { terms, matchers })
    }

    /// All distinct dictionary terms found in `text`, with their categories.
    pub fn find_matches(&self, text: &str) -> Vec<DictionaryMatch> {
        let mut matches = Vec::new();
        for (category, matcher) in &self.matchers {
            let mut seen = std::collections::BTreeSet::new();
            for m in matcher.find_iter(text) {
                let term = m.as_str().to_lowercase();
                if seen.insert(term.clone()) {
                    matches.push(DictionaryMatch {
                        term,
                        category: category.clone(),
                    });
                }
            }
        }
        matches
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn terms_for(&self, category: &str) -> &[String] {
        self.terms.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}
