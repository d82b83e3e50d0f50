/// DID state engine
///
/// Single authoritative view of the DID the user is currently working with:
/// the active identifier, its resolved document, and the derived account
/// state. All mutation entry points live here and follow the
/// mutation-then-reload protocol: the ledger call must confirm before the
/// mirrored state is recomputed, and a failed call changes nothing locally.
use crate::{
    document::{DidDocument, ServiceEndpoint, VerificationMethodFlags, VerificationMethodType},
    error::{MirrorError, MirrorResult},
    identifier::{parse_fragment, DidSolIdentifier, Network},
    ledger::{AddVerificationMethodParams, DidAccountInfo, LedgerService},
    registry::{Chain, KeyRegistryEngine},
    wallet::SolanaPublicKey,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

/// Derived lifecycle of the active DID's on-chain account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountState {
    /// No on-chain account; the document is generative
    #[default]
    Uninitialized,
    /// Account exists in the superseded format and is eligible for migration
    InitializedLegacy,
    /// Account exists in the current format
    InitializedCurrent,
}

impl AccountState {
    fn from_info(info: Option<&DidAccountInfo>) -> Self {
        use crate::ledger::AccountVersion;

        match info {
            None => AccountState::Uninitialized,
            Some(info) if info.version == AccountVersion::Legacy => AccountState::InitializedLegacy,
            Some(_) => AccountState::InitializedCurrent,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, AccountState::Uninitialized)
    }

    pub fn is_migratable(&self) -> bool {
        matches!(self, AccountState::InitializedLegacy)
    }
}

/// Published snapshot of the engine state
#[derive(Debug, Clone, Default)]
pub struct DidSnapshot {
    pub did: Option<DidSolIdentifier>,
    pub document: DidDocument,
    pub account_state: AccountState,
    pub account_address: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Engine owning the active DID, its document mirror and mutation entry
/// points
pub struct DidStateEngine {
    network: Network,
    ledger: Arc<dyn LedgerService>,
    registry: Arc<KeyRegistryEngine>,
    snapshot: RwLock<DidSnapshot>,
    watch_tx: watch::Sender<DidSnapshot>,
    /// Serializes mutation-then-reload sequences: at most one in flight
    mutation_lock: Mutex<()>,
    /// Set when the active DID came from an external reference; wallet
    /// connection then no longer overrides it
    external_reference: AtomicBool,
    disposed: AtomicBool,
}

impl DidStateEngine {
    pub fn new(
        network: Network,
        ledger: Arc<dyn LedgerService>,
        registry: Arc<KeyRegistryEngine>,
    ) -> Self {
        let (watch_tx, _) = watch::channel(DidSnapshot::default());
        Self {
            network,
            ledger,
            registry,
            snapshot: RwLock::new(DidSnapshot::default()),
            watch_tx,
            mutation_lock: Mutex::new(()),
            external_reference: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Set the initial DID. An explicit external reference always takes
    /// precedence over a wallet-derived one.
    pub async fn initialize(&self, external: Option<DidSolIdentifier>) -> MirrorResult<()> {
        if let Some(did) = external {
            self.external_reference.store(true, Ordering::SeqCst);
            return self.set_did(did).await;
        }
        if let Some(natural) = self.registry.natural_did().await {
            return self.set_did(natural).await;
        }
        Ok(())
    }

    /// Connect a Solana wallet: registers the key with the registry engine
    /// and, unless an external reference is pinned, derives the active DID
    /// from the key
    pub async fn connect_wallet(&self, key: SolanaPublicKey) -> MirrorResult<()> {
        self.ensure_live()?;
        self.registry.connect_solana(key.clone()).await?;

        if self.external_reference.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.set_did(DidSolIdentifier::derive(self.network, &key)).await
    }

    /// Pin the active DID to an externally supplied reference
    pub async fn set_external_did(&self, did: DidSolIdentifier) -> MirrorResult<()> {
        self.external_reference.store(true, Ordering::SeqCst);
        self.set_did(did).await
    }

    /// Change the active DID and run a full reload
    pub async fn set_did(&self, did: DidSolIdentifier) -> MirrorResult<()> {
        self.ensure_live()?;
        tracing::info!(did = %did, "Active DID set");
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.did = Some(did);
            self.watch_tx.send_replace(snapshot.clone());
        }
        self.reload().await
    }

    /// Recompute the mirrored state from the ledger: document, account state
    /// and address concurrently, then the connected wallet's linked-DID
    /// lists. A resolution failure leaves the previous document unchanged.
    pub async fn reload(&self) -> MirrorResult<()> {
        let Some(did) = self.snapshot.read().await.did.clone() else {
            return Ok(());
        };
        let did_str = did.to_string();

        let (document, account_info) = futures::try_join!(
            self.ledger.resolve(&did_str),
            self.ledger.account_info(&did_str)
        )?;
        document.validate()?;

        let account_state = AccountState::from_info(account_info.as_ref());
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.document = document;
            snapshot.account_state = account_state;
            snapshot.account_address = account_info.map(|info| info.address);
            snapshot.refreshed_at = Some(Utc::now());
            self.watch_tx.send_replace(snapshot.clone());
        }
        tracing::debug!(did = %did_str, ?account_state, "Reloaded DID state");

        let wallet = self.registry.wallet().await;
        if wallet.solana.is_some() || wallet.ethereum.is_some() {
            self.registry.refresh().await?;
        }

        Ok(())
    }

    /// Add a service endpoint to the document
    pub async fn add_service(&self, service: ServiceEndpoint) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let did = self.begin_mutation().await?;

        self.ledger.add_service(&did, service).await?;
        self.reload().await
    }

    /// Remove the service named by a fully qualified entry identifier
    pub async fn remove_service(&self, identifier: &str) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let did = self.begin_mutation().await?;
        let fragment = parse_fragment(identifier)?;

        self.ledger.remove_service(&did, fragment).await?;
        self.reload().await
    }

    /// Add a verification method to the document
    pub async fn add_key(&self, params: AddVerificationMethodParams) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let did = self.begin_mutation().await?;

        self.ledger.add_verification_method(&did, params).await?;
        self.reload().await
    }

    /// Remove the verification method named by a fully qualified entry
    /// identifier
    pub async fn remove_key(&self, identifier: &str) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let did = self.begin_mutation().await?;
        let fragment = parse_fragment(identifier)?;

        self.ledger.remove_verification_method(&did, fragment).await?;
        self.reload().await
    }

    /// Self-attest ownership of a verification method
    ///
    /// The ledger program's signature check is the real enforcement, but the
    /// engine independently verifies that the target method's key material
    /// belongs to the connected wallet before issuing the call, so a doomed
    /// transaction is never submitted.
    pub async fn set_key_owned(
        &self,
        fragment: &str,
        method_type: VerificationMethodType,
    ) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        let did = self.begin_mutation().await?;

        let document = self.ledger.resolve(&did).await?;
        let vm = document.find_verification_method(fragment).ok_or_else(|| {
            MirrorError::InvalidIdentifier(format!("no verification method: {}", fragment))
        })?;
        if vm.method_type != method_type {
            return Err(MirrorError::InvalidIdentifier(format!(
                "verification method type mismatch for {}",
                fragment
            )));
        }

        let key_str = vm
            .key_string()
            .ok_or_else(|| MirrorError::KeyNotHeld(fragment.to_string()))?;
        if !self.registry.is_connected(key_str).await {
            return Err(MirrorError::KeyNotHeld(key_str.to_string()));
        }

        let flags = vm.flags | VerificationMethodFlags::OWNERSHIP_PROOF;
        self.ledger
            .set_verification_method_flags(&did, fragment, flags)
            .await?;
        self.reload().await
    }

    /// Migrate the account to the current format. Eligibility is re-checked
    /// against the ledger at call time, not read from the last reload.
    pub async fn migrate(&self) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        self.ensure_live()?;
        let did = self.active_did().await?;
        self.require_solana_wallet().await?;

        if !self.ledger.is_migratable(&did).await? {
            return Err(MirrorError::NotMigratable(did));
        }

        self.ledger.migrate(&did).await?;
        self.reload().await
    }

    /// Register the active DID under the connected wallet's key for `chain`
    pub async fn register_did_on_key(&self, chain: Chain) -> MirrorResult<()> {
        let _guard = self.mutation_lock.lock().await;
        self.ensure_live()?;
        let did = self.active_did().await?;

        self.registry.register(chain, &did).await?;
        self.reload().await
    }

    /// Current flags of one verification method, `None` when the account or
    /// fragment is absent
    pub async fn key_flags(&self, fragment: &str) -> MirrorResult<Option<VerificationMethodFlags>> {
        let Some(did) = self.snapshot.read().await.did.clone() else {
            return Ok(None);
        };
        self.ledger
            .verification_method_flags(&did.to_string(), fragment)
            .await
    }

    /// Endpoint URI of the document's profile-picture service, if any
    pub async fn profile_picture(&self) -> Option<String> {
        self.snapshot
            .read()
            .await
            .document
            .profile_picture()
            .map(String::from)
    }

    pub async fn did(&self) -> Option<DidSolIdentifier> {
        self.snapshot.read().await.did.clone()
    }

    pub async fn document(&self) -> DidDocument {
        self.snapshot.read().await.document.clone()
    }

    pub async fn account_state(&self) -> AccountState {
        self.snapshot.read().await.account_state
    }

    pub async fn account_address(&self) -> Option<String> {
        self.snapshot.read().await.account_address.clone()
    }

    pub async fn snapshot(&self) -> DidSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Observe state changes; the receiver holds the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<DidSnapshot> {
        self.watch_tx.subscribe()
    }

    /// Tear the engine down: resets all slots to the empty defaults and
    /// rejects further operations
    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let mut snapshot = self.snapshot.write().await;
        *snapshot = DidSnapshot::default();
        self.watch_tx.send_replace(snapshot.clone());
        tracing::info!("DID state engine disposed");
    }

    fn ensure_live(&self) -> MirrorResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MirrorError::Validation("engine is disposed".to_string()));
        }
        Ok(())
    }

    async fn active_did(&self) -> MirrorResult<String> {
        self.snapshot
            .read()
            .await
            .did
            .as_ref()
            .map(|did| did.to_string())
            .ok_or_else(|| MirrorError::InvalidIdentifier("no active DID".to_string()))
    }

    async fn require_solana_wallet(&self) -> MirrorResult<SolanaPublicKey> {
        self.registry
            .wallet()
            .await
            .solana
            .ok_or(MirrorError::WalletNotConnected)
    }

    /// Preconditions shared by document mutations: live engine, active DID,
    /// connected signer, and an account that is not stuck in the legacy
    /// format (uninitialized accounts are allocated by the ledger on first
    /// write)
    async fn begin_mutation(&self) -> MirrorResult<String> {
        self.ensure_live()?;
        let did = self.active_did().await?;
        self.require_solana_wallet().await?;

        if self.snapshot.read().await.account_state == AccountState::InitializedLegacy {
            return Err(MirrorError::Transaction(format!(
                "{} uses the legacy account format; migrate before mutating",
                did
            )));
        }

        Ok(did)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountVersion;

    #[test]
    fn test_account_state_derivation() {
        assert_eq!(AccountState::from_info(None), AccountState::Uninitialized);

        let legacy = DidAccountInfo {
            address: "addr".to_string(),
            version: AccountVersion::Legacy,
        };
        assert_eq!(
            AccountState::from_info(Some(&legacy)),
            AccountState::InitializedLegacy
        );
        assert!(AccountState::from_info(Some(&legacy)).is_migratable());

        let current = DidAccountInfo {
            address: "addr".to_string(),
            version: AccountVersion::Current,
        };
        assert_eq!(
            AccountState::from_info(Some(&current)),
            AccountState::InitializedCurrent
        );
        assert!(AccountState::from_info(Some(&current)).is_initialized());
        assert!(!AccountState::from_info(Some(&current)).is_migratable());
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = DidSnapshot::default();
        assert!(snapshot.did.is_none());
        assert_eq!(snapshot.document, DidDocument::empty());
        assert_eq!(snapshot.account_state, AccountState::Uninitialized);
        assert!(snapshot.refreshed_at.is_none());
    }
}
