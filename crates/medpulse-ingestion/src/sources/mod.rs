//! Literature source clients.

pub mod clinicaltrials;
pub mod medrxiv;
pub mod pubmed;

use async_trait::async_trait;
use medpulse_common::{Paper, PaperSource};
use tracing::warn;

/// Common interface for all literature source clients.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Tag stamped on every record this source produces.
    fn source(&self) -> PaperSource;

    /// Queries the upstream API. Transport and whole-response parse
    /// failures are errors; malformed individual records are skipped.
    async fn fetch(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Paper>>;

    /// Like [`fetch`](Self::fetch), but any failure degrades to an empty
    /// list so one unavailable source never aborts a search.
    async fn search(&self, query: &str, max_results: usize) -> Vec<Paper> {
        match self.fetch(query, max_results).await {
            Ok(papers) => papers,
            Err(e) => {
                warn!(source = %self.source(), error = %e, "Search failed; no results from this source");
                Vec::new()
            }
        }
    }
}

/// Fails on any non-2xx status so callers can `?` straight to the body.
pub(crate) fn ensure_success(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("upstream returned HTTP {} for {}", status.as_u16(), resp.url());
    }
    Ok(resp)
}

/// Four-digit year from a date string. ISO dates yield their first four
/// characters; free-form dates ("March 2021") yield the first 4-digit run.
pub(crate) fn year_from_date(date: &str) -> String {
    let bytes = date.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .map(|i| date[i..i + 4].to_string())
        .unwrap_or_default()
}
