//! Summarization backend trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0} not set in environment variables")]
    MissingCredential(String),
    #[error("Model is currently loading: {0}")]
    ModelLoading(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Backend construction failed: {0}")]
    Construction(String),
    #[error("Unknown model key: {0}")]
    UnknownModel(String),
}

impl LlmError {
    /// The "try again shortly" condition that earns a single retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::ModelLoading(_))
    }

    /// Error-tagged placeholder stored in place of a summary.
    pub fn to_placeholder(&self) -> String {
        format!("Error: {self}")
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// One loaded summarization service.
///
/// `summarize` never fails: transport and parse errors are returned as an
/// error-tagged string (see [`LlmError::to_placeholder`]).
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn summarize(&self, text: &str) -> String;
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_loading_is_transient() {
        assert!(LlmError::ModelLoading("x".into()).is_transient());
        assert!(!LlmError::ApiError { status: 500, message: "boom".into() }.is_transient());
        assert!(!LlmError::MissingCredential("HF_API_KEY".into()).is_transient());
    }

    #[test]
    fn test_placeholder_format() {
        let e = LlmError::MissingCredential("HF_API_KEY".into());
        assert_eq!(e.to_placeholder(), "Error: HF_API_KEY not set in environment variables");
    }
}
