//! Europe PMC REST API adapter.
//!
//! Endpoint: https://www.ebi.ac.uk/europepmc/webservices/rest/search
//! Single JSON request per query; `pageSize` caps the result count.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use medlit_common::{CanonicalPaper, MedlitError, Result, Source, SourceQuery};

use super::{http_client, parse_loose_date, validate_query, RawRecord, SourceAdapter};

const EPMC_SEARCH_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";

pub struct EuropePmcAdapter {
    client: reqwest::Client,
    search_url: String,
}

impl EuropePmcAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            search_url: EPMC_SEARCH_URL.to_string(),
        })
    }

    /// Point the adapter at a different search endpoint (mock servers).
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for EuropePmcAdapter {
    fn source(&self) -> Source {
        Source::EuropePmc
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>> {
        validate_query(query)?;

        let page_size = query.max_results.to_string();
        let params = [
            ("query", query.keyword.as_str()),
            ("resultType", "core"),
            ("pageSize", page_size.as_str()),
            ("format", "json"),
        ];

        let resp = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MedlitError::Status {
                origin: "europepmc",
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let results = body["resultList"]["result"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        debug!(count = results.len(), "Europe PMC search returned results");

        let mut records = Vec::with_capacity(results.len());
        for r in &results {
            match EpmcResult::from_json(r) {
                Some(rec) => records.push(RawRecord::EuropePmc(rec)),
                None => warn!(id = ?r["id"].as_str(), "skipping result with missing id or title"),
            }
        }
        records.truncate(query.max_results);
        Ok(records)
    }
}

/// A validated Europe PMC search result.
#[derive(Debug, Clone)]
pub struct EpmcResult {
    pub id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub pub_date: Option<NaiveDate>,
    pub doi: Option<String>,
    pub keywords: Vec<String>,
    /// Europe PMC source tag ("MED", "PPR", …), used for the article URL.
    pub epmc_source: String,
}

impl EpmcResult {
    /// Field mapping from the `resultList.result` JSON shape. Returns None
    /// when the payload lacks an id or title, which rejects it at fetch time.
    fn from_json(r: &serde_json::Value) -> Option<Self> {
        let id = r["id"].as_str()?.to_string();
        let title = r["title"].as_str().filter(|t| !t.is_empty())?.to_string();

        let authors = r["authorList"]["author"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|a| a["fullName"].as_str().map(String::from))
            .collect();

        let keywords = r["keywordList"]["keyword"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|k| k.as_str().map(String::from))
            .collect();

        Some(Self {
            id,
            title,
            abstract_text: r["abstractText"].as_str().map(String::from),
            authors,
            journal: r["journalTitle"].as_str().map(String::from),
            pub_date: r["firstPublicationDate"]
                .as_str()
                .and_then(parse_loose_date),
            doi: r["doi"].as_str().map(String::from),
            keywords,
            epmc_source: r["source"].as_str().unwrap_or("MED").to_string(),
        })
    }

    pub(crate) fn into_canonical(self) -> CanonicalPaper {
        let url = format!("https://europepmc.org/article/{}/{}", self.epmc_source, self.id);
        CanonicalPaper {
            external_id: self.id,
            source: Source::EuropePmc,
            title: self.title,
            abstract_text: self.abstract_text,
            authors: self.authors,
            journal: self.journal,
            pub_date: self.pub_date,
            doi: self.doi,
            url,
            keywords: self.keywords,
        }
    }
}
