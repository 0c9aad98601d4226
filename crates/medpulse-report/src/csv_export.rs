//! CSV export of the enriched paper list.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use medpulse_common::{MedpulseError, Paper, Result};
use tracing::info;

use crate::TabularExporter;

/// Fixed leading columns; the summary columns follow in key order.
pub const BASE_COLUMNS: &[&str] = &["title", "abstract", "authors", "year", "url", "source"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }
}

/// Union of every summary key across the papers, sorted.
fn summary_columns(papers: &[Paper]) -> Vec<&str> {
    papers
        .iter()
        .flat_map(|p| p.summaries.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn csv_err(e: csv::Error) -> MedpulseError {
    MedpulseError::Report(format!("CSV export failed: {e}"))
}

impl TabularExporter for CsvExporter {
    fn export(&self, papers: &[Paper], path: &Path) -> Result<PathBuf> {
        let summary_cols = summary_columns(papers);
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

        let header = BASE_COLUMNS.iter().copied().chain(summary_cols.iter().copied());
        writer.write_record(header).map_err(csv_err)?;

        for paper in papers {
            let mut row: Vec<&str> = vec![
                paper.title.as_str(),
                paper.abstract_text.as_str(),
                paper.authors.as_str(),
                paper.year.as_str(),
                paper.url.as_str(),
                paper.source.as_str(),
            ];
            row.extend(
                summary_cols
                    .iter()
                    .map(|key| paper.summaries.get(*key).map(String::as_str).unwrap_or("")),
            );
            writer.write_record(&row).map_err(csv_err)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = papers.len(), "Data saved");
        Ok(path.to_path_buf())
    }
}
