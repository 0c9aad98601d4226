//! The daily PDF report.
//!
//! Sections, in order:
//!   1. Title page with the report date
//!   2. Research Overview: pies by source and by category
//!   3. Executive Summary: per-category counts
//!   4. Detailed Findings: every paper under each of its categories
//!   5. Key Takeaways & Recommendations

pub mod chart;
pub mod layout;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use medpulse_common::paper::SUMMARY_PREFIX;
use medpulse_common::{Paper, PaperSource, Result};
use tracing::info;

use crate::categorize::{categorize, Category};
use crate::ReportGenerator;
use layout::{Align, Font, Layout};

const ABSTRACT_PREVIEW_CHARS: usize = 500;
const SUMMARY_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct PdfReport {
    date: NaiveDate,
}

impl Default for PdfReport {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfReport {
    /// A report dated today.
    pub fn new() -> Self {
        Self { date: Local::now().date_naive() }
    }

    pub fn with_date(date: NaiveDate) -> Self {
        Self { date }
    }

    fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Lays out the whole document in memory.
    pub fn render(&self, papers: &[Paper]) -> Layout {
        let mut grouped: BTreeMap<Category, Vec<&Paper>> = BTreeMap::new();
        for paper in papers {
            for category in categorize(paper) {
                grouped.entry(category).or_default().push(paper);
            }
        }
        let count = |c: Category| grouped.get(&c).map_or(0, Vec::len);

        let mut doc = Layout::new(format!("Medical Research Daily Update - {}", self.date_string()));
        self.title_page(&mut doc);
        overview(&mut doc, papers, &grouped);

        doc.add_page();
        chapter_title(&mut doc, "Executive Summary");
        doc.paragraph(&executive_summary(papers.len(), &count), Font::Regular, 11.0, 14.0);

        doc.add_page();
        chapter_title(&mut doc, "Detailed Findings");
        for (category, members) in &grouped {
            detailed_category(&mut doc, *category, members);
        }

        doc.add_page();
        chapter_title(&mut doc, "Key Takeaways & Recommendations");
        doc.paragraph(&recommendations(&count), Font::Regular, 11.0, 14.0);

        doc
    }

    fn title_page(&self, doc: &mut Layout) {
        doc.ln(120.0);
        doc.cell("Medical Research", Font::Bold, 24.0, 40.0, Align::Center);
        doc.cell("Daily Update Report", Font::Bold, 16.0, 24.0, Align::Center);
        doc.cell(&self.date_string(), Font::Regular, 12.0, 20.0, Align::Center);
    }
}

impl ReportGenerator for PdfReport {
    fn generate(&self, papers: &[Paper], path: &Path) -> Result<PathBuf> {
        let doc = self.render(papers);
        let pages = doc.page_count();
        doc.save(path)?;
        info!(path = %path.display(), pages, "Report generated");
        Ok(path.to_path_buf())
    }
}

fn chapter_title(doc: &mut Layout, title: &str) {
    doc.ln(10.0);
    doc.cell(title, Font::Bold, 16.0, 22.0, Align::Left);
    doc.ln(6.0);
}

fn overview(doc: &mut Layout, papers: &[Paper], grouped: &BTreeMap<Category, Vec<&Paper>>) {
    chapter_title(doc, "Research Overview");

    let mut by_source: BTreeMap<PaperSource, usize> = BTreeMap::new();
    for paper in papers {
        *by_source.entry(paper.source).or_default() += 1;
    }
    let sources: Vec<(String, usize)> = by_source
        .into_iter()
        .map(|(s, n)| (s.to_string(), n))
        .collect();
    let categories: Vec<(String, usize)> = grouped
        .iter()
        .map(|(c, members)| (c.to_string(), members.len()))
        .collect();

    chart::draw_pie_pair(
        doc,
        ("Papers by Source", sources.as_slice()),
        ("Papers by Category", categories.as_slice()),
    );
}

fn executive_summary(total: usize, count: &dyn Fn(Category) -> usize) -> String {
    format!(
        "This report summarizes {total} recent medical research papers across various categories:\n\
         \n\
         Key Highlights:\n\
         - Treatment & Therapeutics: {} papers on new treatments and therapeutic approaches\n\
         - Diagnostics & Detection: {} papers on diagnostic methods and disease detection\n\
         - Medical Devices: {} papers on medical technology and devices\n\
         - Public Health: {} papers on public health and prevention\n\
         - Clinical Trials: {} papers on ongoing clinical trials\n\
         - Other Research: {} papers on various other topics",
        count(Category::Treatment),
        count(Category::Diagnostics),
        count(Category::Devices),
        count(Category::PublicHealth),
        count(Category::ClinicalTrials),
        count(Category::Other),
    )
}

fn recommendations(count: &dyn Fn(Category) -> usize) -> String {
    format!(
        "Based on today's research findings:\n\
         \n\
         1. Treatment Advances:\n\
         \x20  - {} new studies on treatments\n\
         \x20  - Focus on personalized medicine and targeted therapies\n\
         \n\
         2. Diagnostic Improvements:\n\
         \x20  - {} new diagnostic approaches\n\
         \x20  - Emphasis on early detection and precision diagnostics\n\
         \n\
         3. Technology Integration:\n\
         \x20  - {} new medical devices and technologies\n\
         \x20  - Trend towards AI-enabled and smart medical devices\n\
         \n\
         4. Public Health Implications:\n\
         \x20  - {} public health studies\n\
         \x20  - Important findings for population health management\n\
         \n\
         Recommended Actions:\n\
         1. Review promising treatments in clinical trials for potential fast-track approval\n\
         2. Evaluate new diagnostic tools for integration into healthcare systems\n\
         3. Consider pilot programs for innovative medical devices\n\
         4. Update public health guidelines based on new findings",
        count(Category::Treatment),
        count(Category::Diagnostics),
        count(Category::Devices),
        count(Category::PublicHealth),
    )
}

fn detailed_category(doc: &mut Layout, category: Category, papers: &[&Paper]) {
    doc.ln(5.0);
    doc.cell(category.label(), Font::Bold, 14.0, 20.0, Align::Left);
    doc.ln(5.0);

    for (i, paper) in papers.iter().enumerate() {
        doc.paragraph(&format!("{}. {}", i + 1, paper.title), Font::Bold, 12.0, 16.0);
        doc.cell(&format!("Source: {}", paper.source), Font::Regular, 10.0, 13.0, Align::Left);
        doc.paragraph(&format!("Authors: {}", or_na(&paper.authors)), Font::Regular, 10.0, 13.0);
        doc.cell(&format!("Year: {}", or_na(&paper.year)), Font::Regular, 10.0, 13.0, Align::Left);

        if !paper.abstract_text.is_empty() {
            doc.ln(5.0);
            doc.paragraph(&clip(&paper.abstract_text, ABSTRACT_PREVIEW_CHARS), Font::Italic, 10.0, 13.0);
        }

        for (key, summary) in &paper.summaries {
            doc.ln(5.0);
            doc.cell(&format!("{} Summary:", model_label(key)), Font::Bold, 10.0, 13.0, Align::Left);
            doc.paragraph(&clip(summary, SUMMARY_PREVIEW_CHARS), Font::Regular, 10.0, 13.0);
        }
        doc.ln(10.0);
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

/// First `max` characters, with "..." appended when cut.
fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// `summary_huggingface_flan_t5` -> `Huggingface Flan T5`.
pub fn model_label(key: &str) -> String {
    key.strip_prefix(SUMMARY_PREFIX)
        .unwrap_or(key)
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
