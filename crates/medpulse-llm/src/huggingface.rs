//! Hugging Face hosted Inference API backend.
//!
//! Endpoint: {base_url}/{model id}, e.g.
//!   https://api-inference.huggingface.co/models/google/flan-t5-large
//!
//! A 503 (or a body saying the model "is currently loading") is the
//! transient-unavailable signal: the call is retried once after
//! `retry_delay`. Every other failure is final for that call.

use std::time::Duration;

use async_trait::async_trait;
use medpulse_common::sandbox::{SandboxClient, DEFAULT_TIMEOUT};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::backend::{LlmError, SummaryBackend};
use crate::text::{chunk_text, preview, truncate_chars};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_API_KEY_ENV: &str = "HF_API_KEY";

/// Shared construction settings for every Hugging Face backend.
#[derive(Debug, Clone)]
pub struct HuggingFaceSettings {
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// Word-aligned chunk cap, in characters.
    pub chunk_size: usize,
    /// Per-call input budget; longer text is chunked, each call is truncated to it.
    pub max_input_chars: usize,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for HuggingFaceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            chunk_size: 1500,
            max_input_chars: 2048,
            retry_delay: Duration::from_secs(20),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceParameters {
    pub max_length: u32,
    pub min_length: u32,
    pub do_sample: bool,
    pub early_stopping: bool,
    pub num_beams: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub length_penalty: f32,
    pub no_repeat_ngram_size: u32,
}

impl Default for InferenceParameters {
    fn default() -> Self {
        Self {
            max_length: 250,
            min_length: 100,
            do_sample: false,
            early_stopping: true,
            num_beams: 4,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            repetition_penalty: 1.2,
            length_penalty: 2.0,
            no_repeat_ngram_size: 3,
        }
    }
}

pub struct HuggingFaceBackend {
    model: String,
    endpoint: String,
    api_key: Option<SecretString>,
    api_key_env: String,
    client: SandboxClient,
    chunk_size: usize,
    max_input_chars: usize,
    retry_delay: Duration,
    parameters: InferenceParameters,
}

impl HuggingFaceBackend {
    /// Builds a backend for a hosted model id. A missing key is allowed here;
    /// it is reported per call.
    pub fn new(
        model: impl Into<String>,
        api_key: Option<SecretString>,
        settings: &HuggingFaceSettings,
    ) -> Result<Self, LlmError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(LlmError::Construction("empty model id".to_string()));
        }
        if settings.chunk_size == 0 || settings.max_input_chars == 0 {
            return Err(LlmError::Construction(
                "chunk_size and max_input_chars must be positive".to_string(),
            ));
        }
        // Chunks are sent whole; a larger chunk would be cut mid-sequence.
        if settings.chunk_size > settings.max_input_chars {
            return Err(LlmError::Construction(format!(
                "chunk_size ({}) exceeds max_input_chars ({})",
                settings.chunk_size, settings.max_input_chars
            )));
        }

        let endpoint = format!("{}/{}", settings.base_url.trim_end_matches('/'), model);
        let client = SandboxClient::with_timeout(settings.timeout)
            .map_err(|e| LlmError::Construction(e.to_string()))?;
        if !client.is_allowed(&endpoint) {
            return Err(LlmError::Construction(format!(
                "endpoint not in allowlist: {endpoint}"
            )));
        }

        Ok(Self {
            model,
            endpoint,
            api_key,
            api_key_env: settings.api_key_env.clone(),
            client,
            chunk_size: settings.chunk_size,
            max_input_chars: settings.max_input_chars,
            retry_delay: settings.retry_delay,
            parameters: InferenceParameters::default(),
        })
    }

    /// Builds a backend reading the key from `settings.api_key_env`.
    pub fn from_env(model: impl Into<String>, settings: &HuggingFaceSettings) -> Result<Self, LlmError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        Self::new(model, api_key, settings)
    }

    pub fn with_parameters(mut self, parameters: InferenceParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn try_summarize(&self, text: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::MissingCredential(self.api_key_env.clone()))?;

        if text.chars().count() <= self.max_input_chars {
            return self.summarize_chunk(api_key, text).await;
        }

        let chunks = chunk_text(text, self.chunk_size);
        debug!(n = chunks.len(), "Input chunked");
        let mut summaries = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            summaries.push(self.summarize_chunk(api_key, chunk).await?);
        }
        Ok(summaries.join(" "))
    }

    async fn summarize_chunk(&self, api_key: &SecretString, text: &str) -> Result<String, LlmError> {
        let payload = serde_json::json!({
            "inputs":     truncate_chars(text, self.max_input_chars),
            "parameters": self.parameters,
        });

        match self.post(api_key, &payload).await {
            Err(e) if e.is_transient() => {
                warn!(model = %self.model, delay_s = self.retry_delay.as_secs_f32(), "Model loading; retrying once");
                tokio::time::sleep(self.retry_delay).await;
                self.post(api_key, &payload).await
            }
            other => other,
        }
    }

    async fn post(&self, api_key: &SecretString, payload: &serde_json::Value) -> Result<String, LlmError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .map_err(|e| LlmError::Construction(e.to_string()))?
            .bearer_auth(api_key.expose_secret())
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::SERVICE_UNAVAILABLE
            || (!status.is_success() && body.contains("currently loading"))
        {
            return Err(LlmError::ModelLoading(preview(&body, 200).to_string()));
        }
        if !status.is_success() {
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: format!(
                    "{} | Response: {}",
                    status.canonical_reason().unwrap_or("request failed"),
                    preview(&body, 200)
                ),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        extract_summary(&json)
    }
}

/// Pulls the generated text out of an inference response.
/// Lists yield their first element; objects prefer `summary_text` over
/// `generated_text`; any other JSON value is returned in string form.
fn extract_summary(json: &serde_json::Value) -> Result<String, LlmError> {
    fn from_object(obj: &serde_json::Value) -> String {
        obj["summary_text"]
            .as_str()
            .or_else(|| obj["generated_text"].as_str())
            .unwrap_or("")
            .to_string()
    }

    match json {
        serde_json::Value::Array(items) => items
            .first()
            .map(from_object)
            .ok_or_else(|| LlmError::ApiError {
                status: 200,
                message: "empty result list".to_string(),
            }),
        serde_json::Value::Object(_) => Ok(from_object(json)),
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

#[async_trait]
impl SummaryBackend for HuggingFaceBackend {
    async fn summarize(&self, text: &str) -> String {
        match self.try_summarize(text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(model = %self.model, error = %e, "Summarization failed");
                e.to_placeholder()
            }
        }
    }

    fn model_id(&self) -> &str { &self.model }
}
