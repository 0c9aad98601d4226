//! medpulse-ingestion: Literature discovery and the daily run.
//! - Source adapters (PubMed, ClinicalTrials.gov, medRxiv)
//! - Concurrent aggregation across sources
//! - Per-topic search with required-field filtering and cross-topic dedup
//! - Pipeline driver: search, summarize, then report and export

pub mod aggregator;
pub mod dedup;
pub mod pipeline;
pub mod sources;
pub mod topics;

pub use aggregator::Aggregator;
pub use pipeline::{PipelineDriver, PipelineOutcome};
pub use topics::{SearchSettings, TopicDriver};
