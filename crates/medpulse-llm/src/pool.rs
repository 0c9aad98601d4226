//! Summarizer pool: every loaded backend summarizes every paper.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use medpulse_common::paper::summary_key;
use medpulse_common::{MedpulseError, Paper};
use tracing::{debug, info, instrument, warn};

use crate::backend::SummaryBackend;
use crate::catalog::BackendRegistry;
use crate::text::preview;

/// Loaded backends keyed by model identifier, in load order.
pub struct SummarizerPool {
    backends: Vec<(String, Arc<dyn SummaryBackend>)>,
    parallel: bool,
}

impl std::fmt::Debug for SummarizerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerPool")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl SummarizerPool {
    /// Constructs each requested backend. Unknown keys and failed
    /// constructions are logged and left out; an empty result is fatal.
    pub fn load(registry: &BackendRegistry, requested: &[String]) -> Result<Self, MedpulseError> {
        let mut backends: Vec<(String, Arc<dyn SummaryBackend>)> = Vec::new();

        for key in requested {
            if backends.iter().any(|(k, _)| k == key) {
                continue;
            }
            if !registry.contains(key) {
                warn!(model = %key, "Unknown model key; skipping");
                continue;
            }
            match registry.build(key) {
                Ok(backend) => {
                    debug!(model = %key, id = backend.model_id(), "Backend loaded");
                    backends.push((key.clone(), backend));
                }
                Err(e) => warn!(model = %key, error = %e, "Error loading backend"),
            }
        }

        Self::from_backends(backends)
    }

    /// Wraps already-built backends.
    pub fn from_backends(backends: Vec<(String, Arc<dyn SummaryBackend>)>) -> Result<Self, MedpulseError> {
        if backends.is_empty() {
            return Err(MedpulseError::NoBackends);
        }
        info!(n = backends.len(), "Summarizer pool ready");
        Ok(Self { backends, parallel: true })
    }

    /// Whether a paper's backend calls run concurrently (default) or one at a time.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.backends.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Summarizes one paper with every backend, returning `summary_<key>` entries.
    ///
    /// Each call runs in its own task; a backend whose task panics gets an
    /// error placeholder and the other backends are unaffected.
    #[instrument(skip(self, paper), fields(title = preview(&paper.title, 60)))]
    pub async fn summarize_all(&self, paper: &Paper) -> BTreeMap<String, String> {
        let text: Arc<str> = Arc::from(paper.render_for_summary());

        let results: Vec<(String, String)> = if self.parallel {
            let handles = self.backends.iter().map(|(_, backend)| spawn_summary(backend, &text));
            let outcomes = join_all(handles).await;
            self.backends
                .iter()
                .zip(outcomes)
                .map(|((key, _), outcome)| (summary_key(key), settle(key, outcome)))
                .collect()
        } else {
            let mut out = Vec::with_capacity(self.backends.len());
            for (key, backend) in &self.backends {
                debug!(model = %key, "Using model");
                let outcome = spawn_summary(backend, &text).await;
                out.push((summary_key(key), settle(key, outcome)));
            }
            out
        };

        for (key, summary) in &results {
            debug!(%key, summary = preview(summary, 100), "Summary generated");
        }
        results.into_iter().collect()
    }

    /// Summarizes every paper in order, merging results into each record.
    pub async fn enrich(&self, papers: &mut [Paper]) {
        let total = papers.len();
        for (i, paper) in papers.iter_mut().enumerate() {
            info!("Processing paper {}/{}: {}", i + 1, total, preview(&paper.title, 100));
            let summaries = self.summarize_all(paper).await;
            paper.merge_summaries(summaries);
        }
    }
}

fn spawn_summary(
    backend: &Arc<dyn SummaryBackend>,
    text: &Arc<str>,
) -> tokio::task::JoinHandle<String> {
    let backend = Arc::clone(backend);
    let text = Arc::clone(text);
    tokio::spawn(async move { backend.summarize(&text).await })
}

fn settle(key: &str, outcome: Result<String, tokio::task::JoinError>) -> String {
    outcome.unwrap_or_else(|e| {
        warn!(model = %key, error = %e, "Backend task failed");
        format!("Error: backend task failed: {e}")
    })
}
