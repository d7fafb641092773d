//! End-to-end enrichment over a canned batch: extraction, classification,
//! and the serialized shape handed to persistence.

use medlit_common::{CanonicalPaper, ExtractionMethod, MedlitConfig, Source};
use medlit_enrich::EnrichmentPipeline;
use pretty_assertions::assert_eq;

fn paper(id: &str, title: &str, abstract_text: &str) -> CanonicalPaper {
    CanonicalPaper {
        external_id: id.to_string(),
        source: Source::PubMed,
        title: title.to_string(),
        abstract_text: Some(abstract_text.to_string()),
        authors: vec!["Doe J".to_string()],
        journal: Some("Test Journal".to_string()),
        pub_date: None,
        doi: None,
        url: format!("https://pubmed.ncbi.nlm.nih.gov/{id}/"),
        keywords: Vec::new(),
    }
}

#[test]
fn mixed_batch_is_enriched_per_domain() {
    let pipeline = EnrichmentPipeline::new(&MedlitConfig::default()).unwrap();
    let enriched = pipeline.enrich_batch(vec![
        paper(
            "100",
            "Beta blockers after myocardial infarction",
            "The patient showed signs of myocardial infarction and was treated with beta blockers. \
             Cardiac function improved under beta blockers.",
        ),
        paper(
            "200",
            "Chemotherapy response in malignant tumors",
            "Tumor regression under chemotherapy was observed in malignant carcinoma cohorts.",
        ),
        paper(
            "300",
            "Randomized placebo-controlled trial design",
            "A randomized clinical trial with a placebo arm and double blind enrollment.",
        ),
    ]);

    assert_eq!(enriched.len(), 3);
    assert_eq!(enriched[0].category.label, "cardiology");
    assert_eq!(enriched[1].category.label, "oncology");
    assert_eq!(enriched[2].category.label, "clinical_trials");

    let cardiology_keywords: Vec<&str> = enriched[0]
        .extracted_keywords
        .iter()
        .filter(|k| k.methods.contains(&ExtractionMethod::Dictionary))
        .map(|k| k.keyword.as_str())
        .collect();
    assert!(cardiology_keywords.contains(&"myocardial infarction"));
    assert!(cardiology_keywords.contains(&"beta blockers"));
}

#[test]
fn keyword_ranking_is_stable_across_runs() {
    let pipeline = EnrichmentPipeline::new(&MedlitConfig::default()).unwrap();
    let batch = || {
        vec![paper(
            "1",
            "Gene expression in pediatric epilepsy",
            "Gene expression and mutation analysis in pediatric epilepsy cohorts. \
             Epilepsy onset correlated with gene expression changes.",
        )]
    };
    let first = pipeline.enrich_batch(batch());
    let second = pipeline.enrich_batch(batch());

    let order = |papers: &[medlit_common::EnrichedPaper]| {
        papers[0]
            .extracted_keywords
            .iter()
            .map(|k| k.keyword.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));
}

#[test]
fn enriched_paper_serializes_flat() {
    let pipeline = EnrichmentPipeline::new(&MedlitConfig::default()).unwrap();
    let enriched = pipeline.enrich_batch(vec![paper(
        "42",
        "Stroke imaging with MRI",
        "MRI imaging of the brain after stroke.",
    )]);

    let json = serde_json::to_value(&enriched[0]).unwrap();
    // Paper fields are flattened next to the enrichment fields.
    assert_eq!(json["external_id"], "42");
    assert_eq!(json["source"], "pubmed");
    assert!(json["extracted_keywords"].is_array());
    assert!(json["category"]["label"].is_string());
    assert!(json["category"]["confidence"].is_number());
}
