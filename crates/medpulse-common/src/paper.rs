//! Normalized paper record shared by the source adapters, the summarizer
//! pool and the report collaborators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of every key in [`Paper::summaries`].
pub const SUMMARY_PREFIX: &str = "summary_";

/// Field names a required-fields policy may refer to.
pub const KNOWN_FIELDS: &[&str] = &["title", "abstract", "authors", "year", "url"];

/// Builds the summary key for a model identifier (`summary_<model>`).
pub fn summary_key(model: &str) -> String {
    format!("{SUMMARY_PREFIX}{model}")
}

/// Which adapter produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaperSource {
    #[serde(rename = "PubMed")]
    PubMed,
    #[serde(rename = "ClinicalTrials.gov")]
    ClinicalTrials,
    #[serde(rename = "medRxiv")]
    MedRxiv,
}

impl PaperSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSource::PubMed         => "PubMed",
            PaperSource::ClinicalTrials => "ClinicalTrials.gov",
            PaperSource::MedRxiv        => "medRxiv",
        }
    }
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One research item harmonized across the source-specific formats.
///
/// Adapters always populate every text field, using an empty string when
/// the upstream record omits it. `summaries` starts empty and is only ever
/// extended by [`Paper::merge_summaries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: String,
    pub year: String,
    pub url: String,
    pub source: PaperSource,
    #[serde(default)]
    pub summaries: BTreeMap<String, String>,
}

impl Paper {
    /// An empty record tagged with its producing source.
    pub fn new(source: PaperSource) -> Self {
        Self {
            title: String::new(),
            abstract_text: String::new(),
            authors: String::new(),
            year: String::new(),
            url: String::new(),
            source,
            summaries: BTreeMap::new(),
        }
    }

    /// Looks up a text field by its policy name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title"    => Some(&self.title),
            "abstract" => Some(&self.abstract_text),
            "authors"  => Some(&self.authors),
            "year"     => Some(&self.year),
            "url"      => Some(&self.url),
            _ => None,
        }
    }

    /// True when title and abstract are both non-empty (after trimming).
    pub fn has_title_and_abstract(&self) -> bool {
        !self.title.trim().is_empty() && !self.abstract_text.trim().is_empty()
    }

    /// True when title, abstract and every extra named field are non-empty.
    /// Unknown field names count as missing.
    pub fn has_fields(&self, required: &[String]) -> bool {
        self.has_title_and_abstract()
            && required.iter().all(|name| {
                self.field(name).is_some_and(|v| !v.trim().is_empty())
            })
    }

    /// Text handed to every summarization backend.
    pub fn render_for_summary(&self) -> String {
        let authors = if self.authors.is_empty() { "Unknown" } else { &self.authors };
        format!(
            "Title: {}\nAbstract: {}\nSource: {}\nAuthors: {}",
            self.title, self.abstract_text, self.source, authors
        )
    }

    /// Adds summaries without removing any key already present.
    /// A key produced again overwrites only its own value.
    pub fn merge_summaries<I>(&mut self, summaries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.summaries.extend(summaries);
    }
}
