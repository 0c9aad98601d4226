//! medpulse-common: Shared types, errors, and the HTTP client used across all Medpulse crates.

pub mod error;
pub mod paper;
pub mod sandbox;

// Re-export commonly used types
pub use error::{MedpulseError, Result};
pub use paper::{Paper, PaperSource};
