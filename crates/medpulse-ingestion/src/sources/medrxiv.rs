//! medRxiv preprint client.
//!
//! Endpoint: https://api.medrxiv.org/details/medrxiv?q=…&page=1&size=N
//!
//! Response: `{"results": [{title, abstract, authors: [..], date, doi}]}`.
//! The paper `url` holds the DOI as returned, not a resolvable page URL.

use async_trait::async_trait;
use medpulse_common::sandbox::SandboxClient as Client;
use medpulse_common::{MedpulseError, Paper, PaperSource};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ensure_success, year_from_date, LiteratureSource};

const MEDRXIV_SEARCH_URL: &str = "https://api.medrxiv.org/details/medrxiv";

pub struct MedRxivClient {
    client: Client,
    base_url: String,
}

impl MedRxivClient {
    pub fn new(timeout: Duration) -> Result<Self, MedpulseError> {
        Ok(Self {
            client: Client::with_timeout(timeout)?,
            base_url: MEDRXIV_SEARCH_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LiteratureSource for MedRxivClient {
    fn source(&self) -> PaperSource { PaperSource::MedRxiv }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Paper>> {
        let size = max_results.to_string();
        let resp = self.client
            .get(&self.base_url)?
            .query(&[("q", query), ("page", "1"), ("size", size.as_str())])
            .send()
            .await?;
        let body: serde_json::Value = ensure_success(resp)?.json().await?;

        let papers = parse_results(&body);
        debug!(n = papers.len(), "medRxiv preprints retrieved");
        Ok(papers)
    }
}

fn text_field(item: &serde_json::Value, field: &str) -> String {
    item[field].as_str().unwrap_or("").trim().to_string()
}

/// Authors arrive as a list of names; a plain `;`-separated string is
/// accepted too.
fn join_authors(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(names) => names
            .iter()
            .filter_map(|n| n.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::String(s) => s
            .split(';')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn parse_results(body: &serde_json::Value) -> Vec<Paper> {
    let results = body["results"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    results
        .iter()
        .filter_map(|item| {
            if !item.is_object() {
                warn!("Skipping malformed medRxiv record");
                return None;
            }
            let mut paper = Paper::new(PaperSource::MedRxiv);
            paper.title = text_field(item, "title");
            paper.abstract_text = text_field(item, "abstract");
            paper.authors = join_authors(&item["authors"]);
            paper.year = year_from_date(&text_field(item, "date"));
            paper.url = text_field(item, "doi");
            Some(paper)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_results() {
        let body = json!({"results": [{
            "title": "AI triage in emergency care",
            "abstract": "We evaluate a triage model.",
            "authors": ["A. Khan", "B. Lee"],
            "date": "2024-11-02",
            "doi": "10.1101/2024.11.02.24316543"
        }]});
        let papers = parse_results(&body);
        assert_eq!(papers.len(), 1);
        let p = &papers[0];
        assert_eq!(p.title, "AI triage in emergency care");
        assert_eq!(p.authors, "A. Khan, B. Lee");
        assert_eq!(p.year, "2024");
        assert_eq!(p.url, "10.1101/2024.11.02.24316543");
        assert_eq!(p.source, PaperSource::MedRxiv);
    }

    #[test]
    fn test_string_authors_and_missing_fields() {
        let body = json!({"results": [{"title": "T", "authors": "Khan, A.; Lee, B."}, 7]});
        let papers = parse_results(&body);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].authors, "Khan, A., Lee, B.");
        assert_eq!(papers[0].abstract_text, "");
        assert_eq!(papers[0].year, "");
        assert_eq!(papers[0].url, "");
    }

    #[test]
    fn test_unexpected_shape_yields_nothing() {
        assert!(parse_results(&json!({"collection": []})).is_empty());
        assert!(parse_results(&json!(null)).is_empty());
    }
}
