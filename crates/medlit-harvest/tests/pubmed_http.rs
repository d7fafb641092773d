//! PubMed adapter against a mocked E-utilities host: the esearch → efetch
//! flow, error mapping, and the live endpoint (ignored by default).

use medlit_common::{MedlitError, Source, SourceQuery};
use medlit_harvest::sources::pubmed::PubMedAdapter;
use medlit_harvest::sources::SourceAdapter;
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EFETCH_XML: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>1001</PMID>
      <Article>
        <Journal><Title>Heart</Title></Journal>
        <ArticleTitle>Arrhythmia management</ArticleTitle>
        <Abstract><AbstractText>Rhythm control strategies.</AbstractText></Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>1002</PMID>
      <Article>
        <ArticleTitle>Atrial fibrillation screening</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

fn query(keyword: &str, max_results: usize) -> SourceQuery {
    SourceQuery {
        keyword: keyword.to_string(),
        source: Source::PubMed,
        max_results,
    }
}

async fn mock_eutils(idlist: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("retmode", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "idlist": idlist }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pubmed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EFETCH_XML))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn fetch_runs_esearch_then_efetch() {
    let server = mock_eutils(&["1001", "1002"]).await;
    let adapter = PubMedAdapter::new(None, None)
        .unwrap()
        .with_base_url(server.uri());

    let records = adapter.fetch(&query("arrhythmia", 10)).await.unwrap();
    assert_eq!(records.len(), 2);

    let papers: Vec<_> = records
        .into_iter()
        .map(|r| adapter.normalize(r))
        .collect();
    assert_eq!(papers[0].external_id, "1001");
    assert_eq!(papers[0].title, "Arrhythmia management");
    assert_eq!(
        papers[0].abstract_text.as_deref(),
        Some("Rhythm control strategies.")
    );
    assert_eq!(papers[0].url, "https://pubmed.ncbi.nlm.nih.gov/1001/");
    assert_eq!(papers[1].external_id, "1002");
    assert_eq!(papers[1].abstract_text, None);
}

#[tokio::test]
async fn max_results_caps_returned_records() {
    let server = mock_eutils(&["1001", "1002"]).await;
    let adapter = PubMedAdapter::new(None, None)
        .unwrap()
        .with_base_url(server.uri());

    let records = adapter.fetch(&query("arrhythmia", 1)).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn server_error_maps_to_transient_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let adapter = PubMedAdapter::new(None, None)
        .unwrap()
        .with_base_url(server.uri());

    let err = adapter.fetch(&query("arrhythmia", 10)).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(
        err,
        MedlitError::Status { origin: "pubmed", status: 503 }
    ));
}

#[tokio::test]
async fn rate_limit_response_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    let adapter = PubMedAdapter::new(None, None)
        .unwrap()
        .with_base_url(server.uri());

    let err = adapter.fetch(&query("arrhythmia", 10)).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn api_key_and_email_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("api_key", "k123"))
        .and(query_param("email", "team@example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "idlist": [] }
        })))
        .mount(&server)
        .await;
    let adapter = PubMedAdapter::new(Some("k123".into()), Some("team@example.org".into()))
        .unwrap()
        .with_base_url(server.uri());

    let records = adapter.fetch(&query("sepsis", 5)).await.unwrap();
    assert!(records.is_empty());
}

/// Hits the real NCBI endpoint. Run with `cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn live_pubmed_search() {
    let adapter = PubMedAdapter::new(None, None).unwrap();
    let records = adapter.fetch(&query("myocardial infarction", 3)).await.unwrap();
    assert!(!records.is_empty());
    for record in records {
        let paper = adapter.normalize(record);
        assert!(!paper.external_id.is_empty());
        assert!(!paper.title.is_empty());
    }
}
