//! medpulse-llm: Summarization backends and the per-process summarizer pool.
//!
//! Backends:
//!   HuggingFaceBackend: hosted Inference API, one instance per catalog model
//!
//! Every backend fails closed: errors come back as `"Error: …"` strings so
//! one broken model never blocks the others.

pub mod backend;
pub mod catalog;
pub mod huggingface;
pub mod pool;
pub mod text;

pub use backend::{LlmError, SummaryBackend};
pub use catalog::BackendRegistry;
pub use huggingface::{HuggingFaceBackend, HuggingFaceSettings};
pub use pool::SummarizerPool;
