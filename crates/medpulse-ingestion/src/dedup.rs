//! Cross-topic deduplication.
//!
//! Different topics often surface the same record. Identity is the
//! producing source plus its URL (PMID, NCT ID or DOI); records without a
//! URL fall back to a normalised title. Records from different sources are
//! never merged.

use std::collections::HashSet;

use medpulse_common::{Paper, PaperSource};

/// Identity of a record for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaperKey {
    Url(PaperSource, String),
    Title(PaperSource, String),
}

impl PaperKey {
    pub fn of(paper: &Paper) -> Self {
        let url = paper.url.trim().to_lowercase();
        if url.is_empty() {
            PaperKey::Title(paper.source, normalise_title(&paper.title))
        } else {
            PaperKey::Url(paper.source, url)
        }
    }
}

/// Lowercase, alphanumerics only, single spaces.
pub fn normalise_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remembers every key admitted so far.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<PaperKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a record's key is seen.
    pub fn admit(&mut self, paper: &Paper) -> bool {
        self.seen.insert(PaperKey::of(paper))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
