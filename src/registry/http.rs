/// HTTP client for a chain registry service
///
/// Each chain's registry program/contract is fronted by a service exposing the
/// public reverse index:
///
/// - `GET {base}/keys/{key}/dids` lists registered DIDs for a key
/// - `POST {base}/keys/{key}/dids` registers a DID; the service signs the
///   registration transaction with the caller's connected wallet
use crate::{
    error::{MirrorError, MirrorResult},
    registry::KeyRegistry,
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Registry endpoint configuration
#[derive(Debug, Clone)]
pub struct HttpRegistryConfig {
    /// Base URL of the registry service, no trailing slash
    pub base_url: String,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Transport-level request timeout
    pub timeout: Duration,
}

impl Default for HttpRegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/registry".to_string(),
            user_agent: "sol-did-mirror/0.1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    did: &'a str,
}

/// Production registry client for one chain
#[derive(Clone)]
pub struct HttpKeyRegistry {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpKeyRegistry {
    /// Create a new registry client
    pub fn new(config: HttpRegistryConfig) -> MirrorResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MirrorError::Resolution(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn dids_url(&self, key: &str) -> String {
        format!("{}/keys/{}/dids", self.base_url, key)
    }
}

#[async_trait]
impl KeyRegistry for HttpKeyRegistry {
    async fn list_dids(&self, key: &str) -> MirrorResult<Vec<String>> {
        let response = self
            .http_client
            .get(self.dids_url(key))
            .send()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Failed to reach registry: {}", e)))?;

        if !response.status().is_success() {
            return Err(MirrorError::Resolution(format!(
                "Registry returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Invalid registry listing: {}", e)))
    }

    async fn register(&self, key: &str, did: &str) -> MirrorResult<()> {
        let response = self
            .http_client
            .post(self.dids_url(key))
            .json(&RegisterRequest { did })
            .send()
            .await
            .map_err(|e| MirrorError::Transaction(format!("Failed to submit registration: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Transaction(format!(
                "Registry rejected registration ({}): {}",
                status, body
            )));
        }

        Ok(())
    }
}
