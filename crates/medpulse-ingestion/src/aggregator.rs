//! Concurrent search across every enabled literature source.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use medpulse_common::sandbox::DEFAULT_TIMEOUT;
use medpulse_common::{MedpulseError, Paper};
use tracing::{debug, instrument, warn};

use crate::sources::clinicaltrials::ClinicalTrialsClient;
use crate::sources::medrxiv::MedRxivClient;
use crate::sources::pubmed::PubMedClient;
use crate::sources::LiteratureSource;

/// Which sources to query and how.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub pubmed: bool,
    pub clinicaltrials: bool,
    pub medrxiv: bool,
    /// Optional NCBI API key for higher rate limits.
    pub pubmed_api_key: Option<String>,
    pub lookback_days: Option<u32>,
    pub timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            pubmed: true,
            clinicaltrials: true,
            medrxiv: true,
            pubmed_api_key: None,
            lookback_days: Some(1),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Runs all sources for one query and flattens their output in source
/// order, then in each source's own result order. No cross-source dedup.
pub struct Aggregator {
    sources: Vec<Arc<dyn LiteratureSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn LiteratureSource>>) -> Self {
        Self { sources }
    }

    /// PubMed, ClinicalTrials.gov and medRxiv, in that order, as enabled.
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, MedpulseError> {
        let mut sources: Vec<Arc<dyn LiteratureSource>> = Vec::new();
        if settings.pubmed {
            sources.push(Arc::new(
                PubMedClient::new(settings.timeout)?
                    .with_api_key(settings.pubmed_api_key.clone())
                    .with_lookback_days(settings.lookback_days),
            ));
        }
        if settings.clinicaltrials {
            sources.push(Arc::new(ClinicalTrialsClient::new(settings.timeout)?));
        }
        if settings.medrxiv {
            sources.push(Arc::new(MedRxivClient::new(settings.timeout)?));
        }
        if sources.is_empty() {
            return Err(MedpulseError::Config("all sources are disabled".to_string()));
        }
        Ok(Self::new(sources))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Queries every source concurrently and waits for all of them.
    ///
    /// Each source runs in its own task; a source that fails, or whose task
    /// panics, contributes nothing and the others are unaffected.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit_per_source: usize) -> Vec<Paper> {
        let handles = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let query = query.to_string();
            tokio::spawn(async move { source.search(&query, limit_per_source).await })
        });
        let outcomes = join_all(handles).await;

        let mut all_papers = Vec::new();
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            match outcome {
                Ok(papers) => {
                    debug!(source = %source.source(), n = papers.len(), "Papers retrieved");
                    all_papers.extend(papers);
                }
                Err(e) => warn!(source = %source.source(), error = %e, "Source task failed"),
            }
        }
        all_papers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medpulse_common::PaperSource;

    struct Fixed(PaperSource, Vec<&'static str>);

    #[async_trait]
    impl LiteratureSource for Fixed {
        fn source(&self) -> PaperSource { self.0 }
        async fn fetch(&self, _query: &str, max: usize) -> anyhow::Result<Vec<Paper>> {
            Ok(self.1.iter().take(max).map(|t| {
                let mut p = Paper::new(self.0);
                p.title = t.to_string();
                p
            }).collect())
        }
    }

    struct Panicking;

    #[async_trait]
    impl LiteratureSource for Panicking {
        fn source(&self) -> PaperSource { PaperSource::ClinicalTrials }
        async fn fetch(&self, _query: &str, _max: usize) -> anyhow::Result<Vec<Paper>> {
            panic!("adapter bug")
        }
    }

    #[tokio::test]
    async fn test_flattens_in_source_order() {
        let agg = Aggregator::new(vec![
            Arc::new(Fixed(PaperSource::PubMed, vec!["p1", "p2"])),
            Arc::new(Fixed(PaperSource::ClinicalTrials, vec![])),
            Arc::new(Fixed(PaperSource::MedRxiv, vec!["m1"])),
        ]);
        let titles: Vec<String> = agg.search("q", 5).await.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["p1", "p2", "m1"]);
    }

    #[tokio::test]
    async fn test_limit_is_passed_to_each_source() {
        let agg = Aggregator::new(vec![
            Arc::new(Fixed(PaperSource::PubMed, vec!["a", "b", "c", "d"])),
            Arc::new(Fixed(PaperSource::MedRxiv, vec!["e", "f", "g", "h"])),
        ]);
        assert_eq!(agg.search("q", 3).await.len(), 6);
    }

    #[tokio::test]
    async fn test_panicking_source_is_isolated() {
        let agg = Aggregator::new(vec![
            Arc::new(Fixed(PaperSource::PubMed, vec!["p1"])),
            Arc::new(Panicking),
            Arc::new(Fixed(PaperSource::MedRxiv, vec!["m1"])),
        ]);
        let papers = agg.search("q", 3).await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].source, PaperSource::MedRxiv);
    }

    #[test]
    fn test_from_settings_respects_flags() {
        let settings = SourceSettings { clinicaltrials: false, ..Default::default() };
        assert_eq!(Aggregator::from_settings(&settings).unwrap().source_count(), 2);

        let none = SourceSettings { pubmed: false, clinicaltrials: false, medrxiv: false, ..Default::default() };
        assert!(Aggregator::from_settings(&none).is_err());
    }
}
