/// HTTP client for a did:sol driver service
///
/// The driver exposes resolution, account inspection and transaction
/// submission over REST:
///
/// - `GET {base}/{did}` resolves the document (generative for uninitialized
///   accounts)
/// - `GET {base}/{did}/account` reports the account address and format
///   version; 404 means uninitialized
/// - `POST {base}/{did}/transactions` submits a mutation and returns after
///   ledger confirmation
use crate::{
    document::{DidDocument, ServiceEndpoint, VerificationMethodFlags},
    error::{MirrorError, MirrorResult},
    ledger::{AddVerificationMethodParams, DidAccountInfo, LedgerService},
};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Driver endpoint configuration
#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    /// Base URL of the driver service, no trailing slash
    pub base_url: String,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Transport-level request timeout
    pub timeout: Duration,
}

impl Default for HttpLedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/did".to_string(),
            user_agent: "sol-did-mirror/0.1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Mutation payload submitted to the driver
#[derive(Debug, Serialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
enum TransactionRequest<'a> {
    AddService { service: &'a ServiceEndpoint },
    RemoveService { fragment: &'a str },
    AddVerificationMethod { params: &'a AddVerificationMethodParams },
    RemoveVerificationMethod { fragment: &'a str },
    SetVerificationMethodFlags {
        fragment: &'a str,
        flags: VerificationMethodFlags,
    },
    Migrate,
}

/// Production ledger adapter speaking to a DID driver service
#[derive(Clone)]
pub struct HttpLedgerService {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerService {
    /// Create a new driver client
    pub fn new(config: HttpLedgerConfig) -> MirrorResult<Self> {
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

    fn did_url(&self, did: &str) -> String {
        format!("{}/{}", self.base_url, did)
    }

    /// Submit a mutation and wait for ledger confirmation
    async fn submit(&self, did: &str, request: TransactionRequest<'_>) -> MirrorResult<()> {
        let url = format!("{}/transactions", self.did_url(did));

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MirrorError::Transaction(format!("Failed to submit transaction: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Transaction(format!(
                "Driver rejected transaction ({}): {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerService for HttpLedgerService {
    async fn resolve(&self, did: &str) -> MirrorResult<DidDocument> {
        let response = self
            .http_client
            .get(self.did_url(did))
            .send()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Failed to reach driver: {}", e)))?;

        if !response.status().is_success() {
            return Err(MirrorError::Resolution(format!(
                "Driver returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Invalid DID document: {}", e)))
    }

    async fn account_info(&self, did: &str) -> MirrorResult<Option<DidAccountInfo>> {
        let url = format!("{}/account", self.did_url(did));

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Failed to reach driver: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MirrorError::Resolution(format!(
                "Driver returned error: {}",
                response.status()
            )));
        }

        let info: DidAccountInfo = response
            .json()
            .await
            .map_err(|e| MirrorError::Resolution(format!("Invalid account info: {}", e)))?;

        Ok(Some(info))
    }

    async fn add_service(&self, did: &str, service: ServiceEndpoint) -> MirrorResult<()> {
        self.submit(did, TransactionRequest::AddService { service: &service })
            .await
    }

    async fn remove_service(&self, did: &str, fragment: &str) -> MirrorResult<()> {
        self.submit(did, TransactionRequest::RemoveService { fragment })
            .await
    }

    async fn add_verification_method(
        &self,
        did: &str,
        params: AddVerificationMethodParams,
    ) -> MirrorResult<()> {
        self.submit(did, TransactionRequest::AddVerificationMethod { params: &params })
            .await
    }

    async fn remove_verification_method(&self, did: &str, fragment: &str) -> MirrorResult<()> {
        self.submit(did, TransactionRequest::RemoveVerificationMethod { fragment })
            .await
    }

    async fn set_verification_method_flags(
        &self,
        did: &str,
        fragment: &str,
        flags: VerificationMethodFlags,
    ) -> MirrorResult<()> {
        self.submit(
            did,
            TransactionRequest::SetVerificationMethodFlags { fragment, flags },
        )
        .await
    }

    async fn migrate(&self, did: &str) -> MirrorResult<()> {
        self.submit(did, TransactionRequest::Migrate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let service = HttpLedgerService::new(HttpLedgerConfig {
            base_url: "http://localhost:3000/did/".to_string(),
            ..HttpLedgerConfig::default()
        })
        .unwrap();

        assert_eq!(
            service.did_url("did:sol:devnet:abc"),
            "http://localhost:3000/did/did:sol:devnet:abc"
        );
    }

    #[test]
    fn test_transaction_request_wire_shape() {
        let request = TransactionRequest::RemoveService { fragment: "agent" };
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded["operation"], "removeService");
        assert_eq!(encoded["fragment"], "agent");

        let encoded = serde_json::to_value(&TransactionRequest::Migrate).unwrap();
        assert_eq!(encoded["operation"], "migrate");
    }
}
