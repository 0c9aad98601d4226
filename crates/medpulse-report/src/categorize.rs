//! Keyword buckets used to group papers in the report.
//!
//! A paper lands in every bucket whose keywords appear (as substrings) in
//! its lowercased title and abstract, or in `Other Research` if none match.

use std::fmt;

use medpulse_common::Paper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Treatment,
    Diagnostics,
    Devices,
    PublicHealth,
    ClinicalTrials,
    Other,
}

impl Category {
    /// Report order.
    pub const ALL: [Category; 6] = [
        Category::Treatment,
        Category::Diagnostics,
        Category::Devices,
        Category::PublicHealth,
        Category::ClinicalTrials,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Treatment      => "Treatment & Therapeutics",
            Category::Diagnostics    => "Diagnostics & Detection",
            Category::Devices        => "Medical Devices",
            Category::PublicHealth   => "Public Health",
            Category::ClinicalTrials => "Clinical Trials",
            Category::Other          => "Other Research",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Treatment      => &["treatment", "therapy", "therapeutic", "drug", "medication"],
            Category::Diagnostics    => &["diagnostic", "diagnosis", "detection", "screening", "imaging"],
            Category::Devices        => &["device", "technology", "equipment", "instrument"],
            Category::PublicHealth   => &["public health", "population", "epidemiology", "prevention"],
            Category::ClinicalTrials => &["clinical trial", "phase", "randomized"],
            Category::Other          => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buckets for one paper, in report order. Never empty.
pub fn categorize(paper: &Paper) -> Vec<Category> {
    let text = format!("{} {}", paper.title, paper.abstract_text).to_lowercase();
    let matched: Vec<Category> = Category::ALL
        .iter()
        .copied()
        .filter(|c| c.keywords().iter().any(|k| text.contains(k)))
        .collect();
    if matched.is_empty() {
        vec![Category::Other]
    } else {
        matched
    }
}
