//! Pipeline driver: one full daily run.
//!
//! Stages:
//!   1. Topic search (all sources, all topics)
//!   2. Summarizer pool fan-out, paper by paper
//!   3. Hand-off to the report generator and tabular exporter
//!
//! Only two conditions abort a run: no summarization backend could be
//! loaded (checked before any network traffic) and no paper survived the
//! search. Everything else degrades to partial results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use medpulse_common::{MedpulseError, Paper, Result};
use medpulse_llm::{BackendRegistry, SummarizerPool};
use medpulse_report::{ReportGenerator, TabularExporter};
use tracing::{error, info, warn};

use crate::topics::TopicDriver;

pub const DEFAULT_OUTPUT_DIR: &str = "results";

pub fn report_file_name(stamp: &str) -> String {
    format!("medical_research_report_{stamp}.pdf")
}

pub fn data_file_name(stamp: &str) -> String {
    format!("medical_research_data_{stamp}.csv")
}

/// Result of a completed run. Output paths are `None` when the collaborator
/// is disabled or failed.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub papers: Vec<Paper>,
    pub report_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
}

pub struct PipelineDriver {
    topics: TopicDriver,
    pool: SummarizerPool,
    report: Option<Arc<dyn ReportGenerator>>,
    exporter: Option<Arc<dyn TabularExporter>>,
    output_dir: PathBuf,
}

impl PipelineDriver {
    pub fn new(topics: TopicDriver, pool: SummarizerPool) -> Self {
        Self {
            topics,
            pool,
            report: None,
            exporter: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Loads the requested models first; fails with
    /// [`MedpulseError::NoBackends`] if none of them can be constructed.
    pub fn load(topics: TopicDriver, registry: &BackendRegistry, models: &[String]) -> Result<Self> {
        let pool = SummarizerPool::load(registry, models)?;
        Ok(Self::new(topics, pool))
    }

    pub fn with_pool_parallelism(mut self, parallel: bool) -> Self {
        self.pool = self.pool.with_parallel(parallel);
        self
    }

    pub fn with_report(mut self, report: Arc<dyn ReportGenerator>) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn TabularExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn run(&self) -> Result<PipelineOutcome> {
        info!(models = self.pool.len(), "Starting medical research analysis");

        let mut papers = self.topics.search_recent_papers().await;
        if papers.is_empty() {
            return Err(MedpulseError::NoPapers);
        }

        info!("Analyzing {} papers...", papers.len());
        self.pool.enrich(&mut papers).await;

        let (report_path, csv_path) = self.write_outputs(&papers).await;
        Ok(PipelineOutcome { papers, report_path, csv_path })
    }

    async fn write_outputs(&self, papers: &[Paper]) -> (Option<PathBuf>, Option<PathBuf>) {
        if self.report.is_none() && self.exporter.is_none() {
            return (None, None);
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            error!(dir = %self.output_dir.display(), error = %e, "Cannot create output directory");
            return (None, None);
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let shared: Arc<Vec<Paper>> = Arc::new(papers.to_vec());

        let report_path = match &self.report {
            Some(report) => {
                let report = Arc::clone(report);
                let papers = Arc::clone(&shared);
                let path = self.output_dir.join(report_file_name(&stamp));
                run_blocking("report", move || report.generate(&papers, &path)).await
            }
            None => None,
        };

        let csv_path = match &self.exporter {
            Some(exporter) => {
                let exporter = Arc::clone(exporter);
                let papers = Arc::clone(&shared);
                let path = self.output_dir.join(data_file_name(&stamp));
                run_blocking("csv", move || exporter.export(&papers, &path)).await
            }
            None => None,
        };

        (report_path, csv_path)
    }
}

/// Runs a file-writing collaborator off the async workers. Failures are
/// logged; the in-memory results stay valid either way.
async fn run_blocking<F>(what: &'static str, job: F) -> Option<PathBuf>
where
    F: FnOnce() -> Result<PathBuf> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(path)) => {
            info!(output = what, path = %path.display(), "Output written");
            Some(path)
        }
        Ok(Err(e)) => {
            warn!(output = what, error = %e, "Output generation failed");
            None
        }
        Err(e) => {
            error!(output = what, error = %e, "Output task panicked");
            None
        }
    }
}
