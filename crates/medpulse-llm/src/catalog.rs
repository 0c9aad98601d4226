//! Model catalog and the key → constructor registry used by the pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{LlmError, SummaryBackend};
use crate::huggingface::{HuggingFaceBackend, HuggingFaceSettings};

/// Prefix of every Hugging Face pool key.
pub const HF_KEY_PREFIX: &str = "huggingface_";

/// Catalog key → hosted model id.
pub const HOSTED_MODELS: &[(&str, &str)] = &[
    // General purpose
    ("flan_t5",         "google/flan-t5-large"),
    ("pegasus_xsum",    "google/pegasus-xsum"),
    ("mistral",         "mistralai/Mistral-7B-Instruct-v0.2"),
    ("bloomz",          "bigscience/bloomz-560m"),
    // Academic
    ("bart_cnn",        "facebook/bart-large-cnn"),
    ("pegasus_pubmed",  "google/pegasus-pubmed"),
    ("led_base",        "allenai/led-base-16384"),
    ("bigbird_pegasus", "google/bigbird-pegasus-large-pubmed"),
    // Arabic
    ("arabic_mt5",      "marefa-nlp/marefa-mt5-base"),
    ("arabert",         "aubmindlab/arabert-base-v2"),
    ("camelbert",       "CAMeL-Lab/bert-base-arabic-camelbert-mix"),
    ("ara_t5",          "araT5/araT5-base-title-generation"),
];

/// Catalog keys loaded when no model list is configured.
/// bloomz and the Arabic models produce unusable summaries and stay opt-in.
pub const DEFAULT_MODEL_KEYS: &[&str] = &[
    "flan_t5",
    "pegasus_xsum",
    "mistral",
    "bart_cnn",
    "pegasus_pubmed",
    "led_base",
    "bigbird_pegasus",
];

/// Resolves a catalog key to its hosted model id.
pub fn hosted_model(key: &str) -> Option<&'static str> {
    HOSTED_MODELS.iter().find(|(k, _)| *k == key).map(|(_, id)| *id)
}

/// Zero-argument constructor for one backend.
pub type BackendFactory =
    Box<dyn Fn() -> Result<Arc<dyn SummaryBackend>, LlmError> + Send + Sync>;

/// String-keyed constructors, evaluated lazily by the pool.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one `huggingface_<key>` entry per catalog model.
    pub fn huggingface(settings: &HuggingFaceSettings) -> Self {
        let mut registry = Self::new();
        for (key, _) in HOSTED_MODELS {
            let settings = settings.clone();
            let catalog_key = key.to_string();
            registry.register(format!("{HF_KEY_PREFIX}{key}"), move || {
                let model = hosted_model(&catalog_key)
                    .ok_or_else(|| LlmError::UnknownModel(catalog_key.clone()))?;
                let backend = HuggingFaceBackend::from_env(model, &settings)?;
                Ok(Arc::new(backend) as Arc<dyn SummaryBackend>)
            });
        }
        registry
    }

    /// Pool keys loaded by default.
    pub fn default_keys() -> Vec<String> {
        DEFAULT_MODEL_KEYS
            .iter()
            .map(|k| format!("{HF_KEY_PREFIX}{k}"))
            .collect()
    }

    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn SummaryBackend>, LlmError> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Runs the constructor registered under `key`.
    pub fn build(&self, key: &str) -> Result<Arc<dyn SummaryBackend>, LlmError> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| LlmError::UnknownModel(key.to_string()))?;
        factory()
    }
}
