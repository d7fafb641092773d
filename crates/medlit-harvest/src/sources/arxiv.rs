//! arXiv query API adapter.
//!
//! Endpoint: http://export.arxiv.org/api/query (Atom XML).
//! Queries are restricted to the medically relevant categories
//! (q-bio, physics.med-ph).

use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument, warn};

use medlit_common::{CanonicalPaper, MedlitError, Result, Source, SourceQuery};

use super::{http_client, parse_loose_date, validate_query, RawRecord, SourceAdapter};

const ARXIV_QUERY_URL: &str = "http://export.arxiv.org/api/query";
const MEDICAL_CATEGORIES: &[&str] = &["q-bio", "physics.med-ph"];

pub struct ArxivAdapter {
    client: reqwest::Client,
    query_url: String,
}

impl ArxivAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            query_url: ARXIV_QUERY_URL.to_string(),
        })
    }

    /// Point the adapter at a different query endpoint (mock servers).
    pub fn with_query_url(mut self, url: impl Into<String>) -> Self {
        self.query_url = url.into();
        self
    }

    /// Combine the keyword with the medical category filter.
    fn build_query(keyword: &str) -> String {
        let cats = MEDICAL_CATEGORIES
            .iter()
            .map(|c| format!("cat:{c}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({keyword}) AND ({cats})")
    }
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<RawRecord>> {
        validate_query(query)?;

        let search_query = Self::build_query(&query.keyword);
        let max = query.max_results.to_string();
        let params = [
            ("search_query", search_query.as_str()),
            ("start", "0"),
            ("max_results", max.as_str()),
            ("sortBy", "relevance"),
            ("sortOrder", "descending"),
        ];

        let resp = self
            .client
            .get(&self.query_url)
            .query(&params)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MedlitError::Status {
                origin: "arxiv",
                status: resp.status().as_u16(),
            });
        }

        let xml = resp.text().await?;
        let mut entries = parse_arxiv_atom(&xml)?;
        entries.truncate(query.max_results);
        debug!(count = entries.len(), "arXiv query returned entries");
        Ok(entries.into_iter().map(RawRecord::Arxiv).collect())
    }
}

/// A validated arXiv Atom entry.
#[derive(Debug, Clone)]
pub struct ArxivEntry {
    /// Identifier tail, e.g. "2403.01234v1".
    pub arxiv_id: String,
    /// Full abs URL from the entry `<id>`.
    pub id_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<NaiveDate>,
    pub doi: Option<String>,
    pub journal_ref: Option<String>,
    /// Category terms, kept as source-supplied keywords.
    pub categories: Vec<String>,
}

impl ArxivEntry {
    pub(crate) fn into_canonical(self) -> CanonicalPaper {
        CanonicalPaper {
            external_id: self.arxiv_id,
            source: Source::Arxiv,
            title: self.title,
            abstract_text: self.summary,
            authors: self.authors,
            journal: self.journal_ref,
            pub_date: self.published,
            doi: self.doi,
            url: self.id_url,
            keywords: self.categories,
        }
    }
}

fn empty_entry() -> ArxivEntry {
    ArxivEntry {
        arxiv_id: String::new(),
        id_url: String::new(),
        title: String::new(),
        summary: None,
        authors: vec![],
        published: None,
        doi: None,
        journal_ref: None,
        categories: vec![],
    }
}

/// Parse an arXiv Atom feed. Entries missing an id or title are dropped
/// with a warning, never surfaced as normalization failures.
fn parse_arxiv_atom(xml: &str) -> Result<Vec<ArxivEntry>> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<ArxivEntry> = None;
    let mut in_id = false;
    let mut in_title = false;
    let mut in_summary = false;
    let mut in_author = false;
    let mut in_name = false;
    let mut in_published = false;
    let mut in_doi = false;
    let mut in_journal_ref = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => current = Some(empty_entry()),
                b"id" => in_id = true,
                b"title" => in_title = true,
                b"summary" => in_summary = true,
                b"author" => in_author = true,
                b"name" => in_name = true,
                b"published" => in_published = true,
                b"arxiv:doi" => in_doi = true,
                b"arxiv:journal_ref" => in_journal_ref = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // <category term="q-bio.QM"/> and <arxiv:primary_category …/>
                if matches!(e.name().as_ref(), b"category" | b"arxiv:primary_category") {
                    if let Some(ref mut entry) = current {
                        if let Some(term) = e
                            .try_get_attribute("term")
                            .ok()
                            .flatten()
                            .and_then(|a| a.unescape_value().ok())
                        {
                            let term = term.to_string();
                            if !entry.categories.contains(&term) {
                                entry.categories.push(term);
                            }
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut entry) = current {
                    if in_id && entry.arxiv_id.is_empty() {
                        entry.id_url = text.clone();
                        entry.arxiv_id = text.rsplit('/').next().unwrap_or("").to_string();
                    }
                    if in_title {
                        entry.title = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    }
                    if in_summary {
                        entry.summary = Some(text.trim().to_string());
                    }
                    if in_author && in_name {
                        entry.authors.push(text.clone());
                    }
                    if in_published {
                        entry.published = parse_loose_date(&text);
                    }
                    if in_doi {
                        entry.doi = Some(text.clone());
                    }
                    if in_journal_ref {
                        entry.journal_ref = Some(text.clone());
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"id" => in_id = false,
                b"title" => in_title = false,
                b"summary" => in_summary = false,
                b"author" => in_author = false,
                b"name" => in_name = false,
                b"published" => in_published = false,
                b"arxiv:doi" => in_doi = false,
                b"arxiv:journal_ref" => in_journal_ref = false,
                b"entry" => {
                    if let Some(entry) = current.take() {
                        if entry.arxiv_id.is_empty() || entry.title.is_empty() {
                            warn!("skipping arXiv entry with missing id or title");
                        } else {
                            entries.push(entry);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(MedlitError::Xml(format!("arxiv atom: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2403.01234v1</id>
    <title>Deep learning for
        cardiac MRI segmentation</title>
    <summary>  We propose a segmentation model.  </summary>
    <published>2024-03-02T18:00:00Z</published>
    <author><name>A. Researcher</name></author>
    <author><name>B. Scientist</name></author>
    <arxiv:primary_category term="physics.med-ph"/>
    <category term="physics.med-ph"/>
    <category term="q-bio.QM"/>
    <arxiv:doi>10.48550/arXiv.2403.01234</arxiv:doi>
  </entry>
</feed>"#;

    #[test]
    fn parse_atom_entry() {
        let entries = parse_arxiv_atom(SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.arxiv_id, "2403.01234v1");
        assert_eq!(e.title, "Deep learning for cardiac MRI segmentation");
        assert_eq!(e.authors, vec!["A. Researcher", "B. Scientist"]);
        assert_eq!(e.published, NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(e.categories, vec!["physics.med-ph", "q-bio.QM"]);
        assert_eq!(e.doi.as_deref(), Some("10.48550/arXiv.2403.01234"));
    }

    #[test]
    fn normalize_uses_abs_url() {
        let entries = parse_arxiv_atom(SAMPLE).unwrap();
        let paper = entries.into_iter().next().unwrap().into_canonical();
        assert_eq!(paper.url, "http://arxiv.org/abs/2403.01234v1");
        assert_eq!(paper.external_id, "2403.01234v1");
        assert_eq!(paper.source, Source::Arxiv);
    }

    #[test]
    fn query_includes_category_filter() {
        let q = ArxivAdapter::build_query("covid-19");
        assert!(q.contains("(covid-19)"));
        assert!(q.contains("cat:q-bio"));
        assert!(q.contains("cat:physics.med-ph"));
    }
}
