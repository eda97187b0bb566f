//! Vulnerability counts from the OSV database

use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{AdvisorySettings, RegistrySettings};
use crate::error::RegistryError;

/// Source of known-vulnerability counts per package
pub trait VulnerabilitySource {
    /// Number of known advisories; 0 when unknown or on failure
    fn vulnerability_count(&self, package: &str) -> usize;
}

/// Used when advisories are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvisories;

impl VulnerabilitySource for NoAdvisories {
    fn vulnerability_count(&self, _package: &str) -> usize {
        0
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    vulns: Vec<serde_json::Value>,
}

/// Client for `POST https://api.osv.dev/v1/query`
#[derive(Debug, Clone)]
pub struct OsvClient {
    client: Client,
    api_url: String,
    ecosystem: String,
}

impl OsvClient {
    pub fn new(
        advisories: &AdvisorySettings,
        registry: &RegistrySettings,
    ) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(registry.timeout_seconds))
            .user_agent(registry.user_agent.clone())
            .build()
            .map_err(|e| RegistryError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            api_url: advisories.api_url.clone(),
            ecosystem: advisories.ecosystem.clone(),
        })
    }

    fn query(&self, package: &str) -> Result<usize, RegistryError> {
        let body = serde_json::json!({
            "package": { "name": package, "ecosystem": self.ecosystem }
        });

        debug!("POST {} for {}", self.api_url, package);
        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .map_err(|e| RegistryError::network(format!("Failed to query {}", self.api_url), e))?;

        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status(),
                url: self.api_url.clone(),
            });
        }

        let parsed: QueryResponse = response
            .json()
            .map_err(|e| RegistryError::network("Failed to parse OSV response".to_string(), e))?;
        Ok(parsed.vulns.len())
    }
}

impl VulnerabilitySource for OsvClient {
    fn vulnerability_count(&self, package: &str) -> usize {
        self.query(package).unwrap_or_else(|e| {
            warn!("Vulnerability lookup for {} failed: {}", package, e);
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_decoding() {
        let body = r#"{"vulns": [{"id": "GHSA-1"}, {"id": "PYSEC-2"}]}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.vulns.len(), 2);

        // OSV returns an empty object when nothing is known
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.vulns.is_empty());
    }

    #[test]
    fn test_failure_counts_as_zero() {
        let advisories = AdvisorySettings {
            api_url: "http://127.0.0.1:9/v1/query".to_string(),
            ..AdvisorySettings::default()
        };
        let osv = OsvClient::new(&advisories, &RegistrySettings::default()).unwrap();
        assert_eq!(osv.vulnerability_count("requests"), 0);
        assert_eq!(NoAdvisories.vulnerability_count("requests"), 0);
    }
}
