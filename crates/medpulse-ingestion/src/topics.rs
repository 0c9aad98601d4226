//! Topic driver: one aggregated search per configured topic.

use std::time::Duration;

use medpulse_common::Paper;
use medpulse_llm::text::preview;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::dedup::Deduplicator;

/// Default topic list: the "innovations" and "research" groups.
pub const DEFAULT_TOPICS: &[&str] = &[
    "medical technology innovations",
    "healthcare innovations",
    "medical device innovations",
    "digital health innovations",
    "clinical research breakthroughs",
    "medical research developments",
    "healthcare research findings",
];

/// Read-only search inputs, fixed at startup.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub topics: Vec<String>,
    pub limit_per_source: usize,
    /// Pause between consecutive topics.
    pub topic_delay: Duration,
    /// Fields a record must have non-empty, beyond title and abstract
    /// which are always required.
    pub required_fields: Vec<String>,
    pub dedupe_across_topics: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            limit_per_source: 3,
            topic_delay: Duration::from_secs(1),
            required_fields: vec!["title".to_string(), "abstract".to_string()],
            dedupe_across_topics: true,
        }
    }
}

pub struct TopicDriver {
    aggregator: Aggregator,
    settings: SearchSettings,
}

impl TopicDriver {
    pub fn new(aggregator: Aggregator, settings: SearchSettings) -> Self {
        Self { aggregator, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Searches every topic in order and returns the surviving papers.
    ///
    /// Source failures are already absorbed by the aggregator, so a topic
    /// that fails simply contributes nothing and the run moves on.
    pub async fn search_recent_papers(&self) -> Vec<Paper> {
        let mut papers = Vec::new();
        let mut dedup = Deduplicator::new();
        let mut duplicates = 0usize;

        info!(topics = self.settings.topics.len(), "Starting medical research search");
        for (i, topic) in self.settings.topics.iter().enumerate() {
            info!("Searching for: {}", topic);
            let results = self
                .aggregator
                .search(topic, self.settings.limit_per_source)
                .await;

            let found = results.len();
            for paper in results {
                if !paper.has_fields(&self.settings.required_fields) {
                    debug!(source = %paper.source, title = preview(&paper.title, 100), "Dropping paper missing required fields");
                    continue;
                }
                if self.settings.dedupe_across_topics && !dedup.admit(&paper) {
                    duplicates += 1;
                    continue;
                }
                info!("    Found [{}]: {}...", paper.source, preview(&paper.title, 100));
                papers.push(paper);
            }
            debug!(%topic, found, kept = papers.len(), "Topic complete");

            if i + 1 < self.settings.topics.len() && !self.settings.topic_delay.is_zero() {
                tokio::time::sleep(self.settings.topic_delay).await;
            }
        }

        info!(total = papers.len(), duplicates, "Search complete");
        papers
    }
}
