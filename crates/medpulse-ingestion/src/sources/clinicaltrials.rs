//! ClinicalTrials.gov study-fields client.
//!
//! Endpoint: https://clinicaltrials.gov/api/query/study_fields
//!
//! Every requested field comes back wrapped in a list
//! (`"BriefTitle": ["…"]`); element 0 is used. Studies map to papers as:
//!   - title    = BriefTitle
//!   - abstract = BriefSummary
//!   - authors  = LocationFacility (first site)
//!   - year     = StartDate
//!   - url      = study page for NCTId

use async_trait::async_trait;
use medpulse_common::sandbox::SandboxClient as Client;
use medpulse_common::{MedpulseError, Paper, PaperSource};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ensure_success, year_from_date, LiteratureSource};

const CT_API_URL: &str = "https://clinicaltrials.gov/api/query/study_fields";
const CT_STUDY_URL: &str = "https://clinicaltrials.gov/ct2/show";
const CT_FIELDS: &str = "NCTId,BriefTitle,BriefSummary,LocationFacility,StartDate,CompletionDate";

pub struct ClinicalTrialsClient {
    client: Client,
    base_url: String,
}

impl ClinicalTrialsClient {
    pub fn new(timeout: Duration) -> Result<Self, MedpulseError> {
        Ok(Self {
            client: Client::with_timeout(timeout)?,
            base_url: CT_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LiteratureSource for ClinicalTrialsClient {
    fn source(&self) -> PaperSource { PaperSource::ClinicalTrials }

    #[instrument(skip(self))]
    async fn fetch(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<Paper>> {
        // Rank window [1, max_results]
        let max_rank = max_results.to_string();
        let resp = self.client
            .get(&self.base_url)?
            .query(&[
                ("expr",    query),
                ("fields",  CT_FIELDS),
                ("min_rnk", "1"),
                ("max_rnk", max_rank.as_str()),
                ("fmt",     "json"),
            ])
            .send()
            .await?;
        let body: serde_json::Value = ensure_success(resp)?.json().await?;

        let papers = parse_study_fields(&body);
        debug!(n = papers.len(), "ClinicalTrials.gov studies retrieved");
        Ok(papers)
    }
}

/// Element 0 of a list-wrapped field, or "" when absent.
fn first_value(study: &serde_json::Value, field: &str) -> String {
    study[field]
        .as_array()
        .and_then(|values| values.first())
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn parse_study_fields(body: &serde_json::Value) -> Vec<Paper> {
    let studies = body["StudyFieldsResponse"]["StudyFields"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    studies
        .iter()
        .filter_map(|study| {
            if !study.is_object() {
                warn!("Skipping malformed ClinicalTrials.gov study record");
                return None;
            }
            let nct_id = first_value(study, "NCTId");
            let mut paper = Paper::new(PaperSource::ClinicalTrials);
            paper.title = first_value(study, "BriefTitle");
            paper.abstract_text = first_value(study, "BriefSummary");
            paper.authors = first_value(study, "LocationFacility");
            paper.year = year_from_date(&first_value(study, "StartDate"));
            if !nct_id.is_empty() {
                paper.url = format!("{CT_STUDY_URL}/{nct_id}");
            }
            Some(paper)
        })
        .collect()
}
