//! PubMed E-utilities client.
//!
//! Two-step protocol:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!            → PMIDs, newest first
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi
//!            → PubmedArticleSet XML for the whole batch in one request

use async_trait::async_trait;
use medpulse_common::sandbox::SandboxClient as Client;
use medpulse_common::{MedpulseError, Paper, PaperSource};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ensure_success, year_from_date, LiteratureSource};

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

pub struct PubMedClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    /// Restricts esearch to records published in the last N days.
    lookback_days: Option<u32>,
}

impl PubMedClient {
    pub fn new(timeout: Duration) -> Result<Self, MedpulseError> {
        Ok(Self {
            client: Client::with_timeout(timeout)?,
            base_url: EUTILS_BASE.to_string(),
            api_key: None,
            lookback_days: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_lookback_days(mut self, days: Option<u32>) -> Self {
        self.lookback_days = days.filter(|d| *d > 0);
        self
    }

    /// Search PubMed and return a list of PMIDs.
    #[instrument(skip(self))]
    async fn esearch(&self, query: &str, max: usize) -> anyhow::Result<Vec<String>> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", max.to_string()),
            ("sort", "pub_date".to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(days) = self.lookback_days {
            params.push(("reldate", days.to_string()));
            params.push(("datetype", "pdat".to_string()));
        }
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let url = format!("{}/esearch.fcgi", self.base_url);
        let resp = self.client.get(&url)?.query(&params).send().await?;
        let resp: serde_json::Value = ensure_success(resp)?.json().await?;

        let ids: Vec<String> = resp["esearchresult"]["idlist"]
            .as_array()
            .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch PubMed XML for a batch of PMIDs and parse it into papers.
    #[instrument(skip(self))]
    async fn efetch(&self, pmids: &[String]) -> anyhow::Result<Vec<Paper>> {
        if pmids.is_empty() {
            return Ok(vec![]);
        }

        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("retmode", "xml".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let url = format!("{}/efetch.fcgi", self.base_url);
        let resp = self.client.get(&url)?.query(&params).send().await?;
        let xml = ensure_success(resp)?.text().await?;

        Ok(records_to_papers(parse_pubmed_xml(&xml), pmids))
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    fn source(&self) -> PaperSource { PaperSource::PubMed }

    async fn fetch(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Paper>> {
        let pmids = self.esearch(query, max_results).await?;
        self.efetch(&pmids).await
    }
}

/// One `<PubmedArticle>` as extracted from the efetch XML.
#[derive(Debug, Default)]
struct ArticleRecord {
    /// Position of the article in the efetch batch, counting skipped ones.
    position: usize,
    pmid: Option<String>,
    title: String,
    abstract_parts: Vec<String>,
    authors: Vec<String>,
    year: String,
}

/// Builds a paper per record. Each record links to its own PMID; when a
/// record carries none, the PMID requested at the record's own batch
/// position is used instead.
fn records_to_papers(records: Vec<ArticleRecord>, requested: &[String]) -> Vec<Paper> {
    records
        .into_iter()
        .map(|r| {
            let pmid = r.pmid.or_else(|| requested.get(r.position).cloned());
            let mut paper = Paper::new(PaperSource::PubMed);
            paper.title = r.title;
            paper.abstract_text = r.abstract_parts.join(" ");
            paper.authors = r.authors.join(", ");
            paper.year = r.year;
            paper.url = pmid
                .map(|id| format!("{ARTICLE_URL}/{id}/"))
                .unwrap_or_default();
            paper
        })
        .collect()
}

/// True when any open element on `path` is named `name`.
fn under(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.iter().any(|p| p.as_slice() == name)
}

fn normalise_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse PubMed XML (efetch) into article records.
///
/// Fields are located by element path: `MedlineCitation/PMID`,
/// `ArticleTitle`, `Abstract/AbstractText`, `AuthorList/Author/{ForeName,LastName}`
/// and `PubDate/{Year,MedlineDate}`. A missing field stays empty; a record
/// without a title is skipped. A malformed document keeps the records
/// completed before the error.
fn parse_pubmed_xml(xml: &str) -> Vec<ArticleRecord> {
    let mut records = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<ArticleRecord> = None;
    let mut seen = 0usize;
    let mut title = String::new();
    let mut abstract_part = String::new();
    let mut fore = String::new();
    let mut last = String::new();
    let mut medline_date = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"PubmedArticle" => {
                        current = Some(ArticleRecord { position: seen, ..Default::default() });
                        seen += 1;
                    }
                    b"ArticleTitle" => title.clear(),
                    b"AbstractText" => abstract_part.clear(),
                    b"Author" => { fore.clear(); last.clear(); }
                    b"PubDate" => medline_date.clear(),
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(rec) = current.as_mut() {
                    match e.unescape() {
                        Ok(text) => {
                            let leaf = path.last().map(Vec::as_slice).unwrap_or_default();
                            let parent = path.len().checked_sub(2).map(|i| path[i].as_slice());

                            if under(&path, b"ArticleTitle") {
                                title.push_str(&text);
                            } else if under(&path, b"AbstractText") && under(&path, b"Abstract") {
                                abstract_part.push_str(&text);
                            } else if leaf == b"PMID" && parent == Some(b"MedlineCitation".as_slice()) {
                                if rec.pmid.is_none() {
                                    rec.pmid = Some(text.trim().to_string());
                                }
                            } else if under(&path, b"Author") && leaf == b"ForeName" {
                                fore.push_str(&text);
                            } else if under(&path, b"Author") && leaf == b"LastName" {
                                last.push_str(&text);
                            } else if under(&path, b"PubDate") && leaf == b"Year" {
                                if rec.year.is_empty() {
                                    rec.year = year_from_date(&text);
                                }
                            } else if under(&path, b"PubDate") && leaf == b"MedlineDate" {
                                medline_date.push_str(&text);
                            }
                        }
                        Err(err) => warn!("Skipping undecodable PubMed text: {}", err),
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                path.pop();
                if let Some(rec) = current.as_mut() {
                    match e.name().as_ref() {
                        b"ArticleTitle" if rec.title.is_empty() => rec.title = normalise_ws(&title),
                        b"AbstractText" if under(&path, b"Abstract") => {
                            let part = normalise_ws(&abstract_part);
                            if !part.is_empty() {
                                rec.abstract_parts.push(part);
                            }
                        }
                        b"Author" => {
                            // Only personal names with both parts are kept.
                            let (f, l) = (fore.trim(), last.trim());
                            if !f.is_empty() && !l.is_empty() {
                                rec.authors.push(format!("{} {}", f, l));
                            }
                        }
                        b"PubDate" if rec.year.is_empty() => rec.year = year_from_date(&medline_date),
                        _ => {}
                    }
                }
                if e.name().as_ref() == b"PubmedArticle" {
                    if let Some(rec) = current.take() {
                        if rec.title.is_empty() {
                            warn!(pmid = ?rec.pmid, "Skipping PubMed article with empty title");
                        } else {
                            records.push(rec);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("PubMed XML parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    records
}
