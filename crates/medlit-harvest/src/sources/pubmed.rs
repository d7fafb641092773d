//! PubMed E-utilities adapter.
//!
//! Endpoints used:
//!   esearch: {base}/esearch.fcgi — keyword search, returns PMID list (JSON)
//!   efetch:  {base}/efetch.fcgi  — abstract XML for a PMID batch
//!
//! efetch is called in batches of 200 PMIDs, the batch size NCBI recommends.

use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument, warn};

use medlit_common::config::CrawlConfig;
use medlit_common::{CanonicalPaper, MedlitError, Result, Source, SourceQuery};

use super::{http_client, validate_query, RawRecord, SourceAdapter};

const NCBI_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const EFETCH_BATCH: usize = 200;

pub struct PubMedAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    email: Option<String>,
}

impl PubMedAdapter {
    pub fn new(api_key: Option<String>, email: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: NCBI_EUTILS_BASE.to_string(),
            api_key,
            email,
        })
    }

    pub fn from_config(cfg: &CrawlConfig) -> Result<Self> {
        Self::new(cfg.pubmed_api_key.clone(), cfg.pubmed_email.clone())
    }

    /// Point the adapter at a different E-utilities host (mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        params
    }

    /// Search PubMed and return a list of PMIDs.
    #[instrument(skip(self))]
    async fn esearch(&self, term: &str, max: usize) -> Result<Vec<String>> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", term.to_string()),
            ("retmax", max.to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
        ];
        params.extend(self.auth_params());

        let resp = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MedlitError::Status {
                origin: "pubmed",
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let ids = body["esearchresult"]["idlist"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<Vec<_>>();

        debug!(count = ids.len(), "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch abstract XML for a PMID batch and parse it.
    #[instrument(skip(self, pmids), fields(batch = pmids.len()))]
    async fn efetch(&self, pmids: &[String]) -> Result<Vec<PubMedArticle>> {
        if pmids.is_empty() {
            return Ok(vec![]);
        }

        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];
        params.extend(self.auth_params());

        let resp = self
            .client
            .get(format!("{}/efetch.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MedlitError::Status {
                origin: "pubmed",
                status: resp.status().as_u16(),
            });
        }

        let xml = resp.text().await?;
        parse_pubmed_xml(&xml)
    }
}

#[async_trait]
impl SourceAdapter for PubMedAdapter {
    fn source(&self) -> Source {
        Source::PubMed
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>> {
        validate_query(query)?;

        let pmids = self.esearch(&query.keyword, query.max_results).await?;
        let mut articles = Vec::with_capacity(pmids.len().min(query.max_results));
        for batch in pmids.chunks(EFETCH_BATCH) {
            articles.extend(self.efetch(batch).await?);
        }
        articles.truncate(query.max_results);
        Ok(articles.into_iter().map(RawRecord::PubMed).collect())
    }
}

/// A validated PubMed article as parsed from efetch abstract XML.
#[derive(Debug, Clone)]
pub struct PubMedArticle {
    pub pmid: String,
    pub title: String,
    /// Abstract sections, already prefixed with their structured label
    /// ("METHODS: ...") where one was present.
    pub abstract_parts: Vec<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub pub_date: Option<NaiveDate>,
    pub doi: Option<String>,
    /// `<Keyword>` entries plus MeSH descriptor names.
    pub keywords: Vec<String>,
}

impl PubMedArticle {
    pub(crate) fn into_canonical(self) -> CanonicalPaper {
        let abstract_text = if self.abstract_parts.is_empty() {
            None
        } else {
            Some(self.abstract_parts.join(" "))
        };
        let url = format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.pmid);
        CanonicalPaper {
            external_id: self.pmid,
            source: Source::PubMed,
            title: self.title,
            abstract_text,
            authors: self.authors,
            journal: self.journal,
            pub_date: self.pub_date,
            doi: self.doi,
            url,
            keywords: self.keywords,
        }
    }
}

fn empty_article() -> PubMedArticle {
    PubMedArticle {
        pmid: String::new(),
        title: String::new(),
        abstract_parts: vec![],
        authors: vec![],
        journal: None,
        pub_date: None,
        doi: None,
        keywords: vec![],
    }
}

/// Month field in PubDate may be numeric or a three-letter name.
fn parse_month(s: &str) -> u32 {
    match s {
        "Jan" => 1, "Feb" => 2, "Mar" => 3, "Apr" => 4,
        "May" => 5, "Jun" => 6, "Jul" => 7, "Aug" => 8,
        "Sep" => 9, "Oct" => 10, "Nov" => 11, "Dec" => 12,
        other => other.parse().unwrap_or(1),
    }
}

/// Parse PubMed efetch XML (`<PubmedArticleSet><PubmedArticle>…`) into a
/// list of validated articles. Records with a missing PMID or title are
/// dropped here so `normalize` stays total.
fn parse_pubmed_xml(xml: &str) -> Result<Vec<PubMedArticle>> {
    let mut articles = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<PubMedArticle> = None;
    let mut in_pmid = false;
    let mut in_title = false;
    let mut in_abstract = false;
    let mut abstract_label: Option<String> = None;
    let mut in_author = false;
    let mut in_last_name = false;
    let mut in_fore_name = false;
    let mut in_journal = false;
    let mut in_pub_date = false;
    let mut in_year = false;
    let mut in_month = false;
    let mut in_day = false;
    let mut in_keyword = false;
    let mut in_descriptor = false;
    let mut article_id_type: Option<String> = None;
    let mut current_last = String::new();
    let mut current_fore = String::new();
    let mut year = String::new();
    let mut month = String::new();
    let mut day = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => current = Some(empty_article()),
                b"PMID" => in_pmid = true,
                b"ArticleTitle" => in_title = true,
                b"AbstractText" => {
                    in_abstract = true;
                    abstract_label = e
                        .try_get_attribute("Label")
                        .ok()
                        .flatten()
                        .and_then(|a| a.unescape_value().ok())
                        .map(|v| v.to_string());
                }
                b"Author" => {
                    in_author = true;
                    current_last.clear();
                    current_fore.clear();
                }
                b"LastName" => in_last_name = true,
                b"ForeName" => in_fore_name = true,
                b"Title" => in_journal = true,
                b"PubDate" => {
                    in_pub_date = true;
                    year.clear();
                    month.clear();
                    day.clear();
                }
                b"Year" => in_year = true,
                b"Month" => in_month = true,
                b"Day" => in_day = true,
                b"Keyword" => in_keyword = true,
                b"DescriptorName" => in_descriptor = true,
                b"ArticleId" => {
                    article_id_type = e
                        .try_get_attribute("IdType")
                        .ok()
                        .flatten()
                        .and_then(|a| a.unescape_value().ok())
                        .map(|v| v.to_string());
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut a) = current {
                    if in_pmid && a.pmid.is_empty() {
                        a.pmid = text.clone();
                    }
                    if in_title {
                        a.title = text.clone();
                    }
                    if in_abstract {
                        match &abstract_label {
                            Some(label) => a.abstract_parts.push(format!("{label}: {text}")),
                            None => a.abstract_parts.push(text.clone()),
                        }
                    }
                    if in_last_name { current_last = text.clone(); }
                    if in_fore_name { current_fore = text.clone(); }
                    if in_journal && a.journal.is_none() {
                        a.journal = Some(text.clone());
                    }
                    if in_pub_date {
                        if in_year { year = text.clone(); }
                        if in_month { month = text.clone(); }
                        if in_day { day = text.clone(); }
                    }
                    if in_keyword || in_descriptor {
                        a.keywords.push(text.clone());
                    }
                    if article_id_type.as_deref() == Some("doi") && a.doi.is_none() {
                        a.doi = Some(text.clone());
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"ArticleTitle" => in_title = false,
                b"AbstractText" => {
                    in_abstract = false;
                    abstract_label = None;
                }
                b"LastName" => in_last_name = false,
                b"ForeName" => in_fore_name = false,
                b"Title" => in_journal = false,
                b"Year" => in_year = false,
                b"Month" => in_month = false,
                b"Day" => in_day = false,
                b"Keyword" => in_keyword = false,
                b"DescriptorName" => in_descriptor = false,
                b"ArticleId" => article_id_type = None,
                b"Author" => {
                    if in_author {
                        if let Some(ref mut a) = current {
                            if !current_last.is_empty() {
                                let name = if current_fore.is_empty() {
                                    current_last.clone()
                                } else {
                                    format!("{} {}", current_fore, current_last)
                                };
                                a.authors.push(name);
                            }
                        }
                        in_author = false;
                    }
                }
                b"PubDate" => {
                    in_pub_date = false;
                    if let Some(ref mut a) = current {
                        if a.pub_date.is_none() {
                            if let Ok(y) = year.parse::<i32>() {
                                let m = parse_month(&month);
                                let d = day.parse::<u32>().unwrap_or(1);
                                a.pub_date = NaiveDate::from_ymd_opt(y, m, d)
                                    .or_else(|| NaiveDate::from_ymd_opt(y, 1, 1));
                            }
                        }
                    }
                }
                b"PubmedArticle" => {
                    if let Some(a) = current.take() {
                        if a.pmid.is_empty() || a.title.is_empty() {
                            warn!(pmid = %a.pmid, "skipping article with missing pmid or title");
                        } else {
                            articles.push(a);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(MedlitError::Xml(format!("pubmed efetch: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}
