use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::MedpulseError;

/// Default per-request timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("medpulse/", env!("CARGO_PKG_VERSION"));

/// An HTTP client that only allows requests to approved domains.
/// Every source adapter and model backend owns its own instance.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, MedpulseError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with the default allowlist and an explicit per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, MedpulseError> {
        let domains = [
            "eutils.ncbi.nlm.nih.gov",      // PubMed
            "clinicaltrials.gov",           // ClinicalTrials
            "api.medrxiv.org",              // medRxiv
            "api.biorxiv.org",              // bioRxiv / medRxiv details
            "api-inference.huggingface.co", // HF inference
            "huggingface.co",
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MedpulseError::Ingestion(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn check(&self, url: &str) -> Result<(), MedpulseError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(MedpulseError::Security(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )))
        }
    }

    /// Builds a GET request for an allowlisted URL.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, MedpulseError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    /// Builds a POST request for an allowlisted URL.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, MedpulseError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_accepts_known_hosts() {
        let c = SandboxClient::new().unwrap();
        assert!(c.is_allowed("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"));
        assert!(c.is_allowed("https://api-inference.huggingface.co/models/google/flan-t5-large"));
        assert!(c.is_allowed("http://127.0.0.1:8080/x"));
    }

    #[test]
    fn test_allowlist_rejects_unknown_hosts() {
        let mut c = SandboxClient::new().unwrap();
        assert!(!c.is_allowed("https://example.com/"));
        assert!(!c.is_allowed("not a url"));
        assert!(c.get("https://example.com/").is_err());

        c.allow_domain("example.com");
        assert!(c.is_allowed("https://api.example.com/"));
    }
}
