//! medpulse-report: Output collaborators for a finished run.
//!
//! - `PdfReport`: the daily PDF report with overview charts
//! - `CsvExporter`: one row per paper, one column per summary model
//!
//! The pipeline only sees the two traits below and never inspects what
//! they write.

pub mod categorize;
pub mod csv_export;
pub mod pdf;

use std::path::{Path, PathBuf};

use medpulse_common::{Paper, Result};

pub use categorize::{categorize, Category};
pub use csv_export::CsvExporter;
pub use pdf::PdfReport;

/// Renders the enriched paper list as a document at `path`.
pub trait ReportGenerator: Send + Sync {
    fn generate(&self, papers: &[Paper], path: &Path) -> Result<PathBuf>;
}

/// Writes the enriched paper list as a flat file at `path`.
pub trait TabularExporter: Send + Sync {
    fn export(&self, papers: &[Paper], path: &Path) -> Result<PathBuf>;
}
