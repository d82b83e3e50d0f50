/// Ledger Service Adapter
///
/// The sole I/O boundary for DID resolution and mutation. The trait is the
/// contract the engines depend on; `HttpLedgerService` is the production
/// implementation speaking to a DID driver service. Transaction building and
/// signing live inside the driver and are opaque to this crate.
pub mod driver;

pub use driver::{HttpLedgerConfig, HttpLedgerService};

use crate::document::{
    DidDocument, ServiceEndpoint, VerificationMethodFlags, VerificationMethodType,
};
use crate::error::MirrorResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// On-chain account format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountVersion {
    /// Superseded format, eligible for migration
    Legacy,
    Current,
}

/// Raw facts about a DID's on-chain account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidAccountInfo {
    /// Address of the account holding the document data
    pub address: String,
    pub version: AccountVersion,
}

/// Parameters for adding a verification method to a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVerificationMethodParams {
    pub fragment: String,
    pub method_type: VerificationMethodType,
    /// Base58 public key or 0x-prefixed address, shaped by `method_type`
    pub key_data: String,
    pub flags: VerificationMethodFlags,
}

/// Chain-specific DID client contract
///
/// Every mutation requires a connected signing capability on the caller's
/// side, returns only after ledger confirmation, and fails with
/// `MirrorError::Transaction` on rejection. Reads fail with
/// `MirrorError::Resolution` when the ledger is unreachable.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Resolve the DID document. An uninitialized account resolves to its
    /// generative document, computed purely from the DID string.
    async fn resolve(&self, did: &str) -> MirrorResult<DidDocument>;

    /// Account facts, `None` when no on-chain account exists
    async fn account_info(&self, did: &str) -> MirrorResult<Option<DidAccountInfo>>;

    async fn add_service(&self, did: &str, service: ServiceEndpoint) -> MirrorResult<()>;

    async fn remove_service(&self, did: &str, fragment: &str) -> MirrorResult<()>;

    async fn add_verification_method(
        &self,
        did: &str,
        params: AddVerificationMethodParams,
    ) -> MirrorResult<()>;

    async fn remove_verification_method(&self, did: &str, fragment: &str) -> MirrorResult<()>;

    async fn set_verification_method_flags(
        &self,
        did: &str,
        fragment: &str,
        flags: VerificationMethodFlags,
    ) -> MirrorResult<()>;

    /// One-way transition of the account to the current format
    async fn migrate(&self, did: &str) -> MirrorResult<()>;

    /// Address of the document account, `None` when uninitialized
    async fn account_address(&self, did: &str) -> MirrorResult<Option<String>> {
        Ok(self.account_info(did).await?.map(|info| info.address))
    }

    /// Whether an on-chain account exists for this DID
    async fn is_initialized(&self, did: &str) -> MirrorResult<bool> {
        Ok(self.account_info(did).await?.is_some())
    }

    /// Whether the account exists in the superseded format
    async fn is_migratable(&self, did: &str) -> MirrorResult<bool> {
        Ok(self
            .account_info(did)
            .await?
            .is_some_and(|info| info.version == AccountVersion::Legacy))
    }

    /// Current flags of one verification method, `None` when the account or
    /// the fragment is absent
    async fn verification_method_flags(
        &self,
        did: &str,
        fragment: &str,
    ) -> MirrorResult<Option<VerificationMethodFlags>> {
        if self.account_info(did).await?.is_none() {
            return Ok(None);
        }
        let document = self.resolve(did).await?;
        Ok(document
            .find_verification_method(fragment)
            .map(|vm| vm.flags))
    }
}
