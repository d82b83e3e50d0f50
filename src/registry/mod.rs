/// Multi-chain key registry engine
///
/// Cross-chain reverse index from a key or address to the DIDs that claim to
/// be controlled by it. Each chain has an independent registry service; the
/// engine merges registry membership with the deterministically-derivable
/// natural DID and owns the per-chain linked-DID lists.
pub mod http;

pub use http::{HttpKeyRegistry, HttpRegistryConfig};

use crate::{
    error::{MirrorError, MirrorResult},
    identifier::{DidSolIdentifier, Network},
    wallet::{EthereumAddress, SolanaPublicKey, WalletConnection},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Chain a registry lookup is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Ethereum,
}

/// Chain-specific registry contract
///
/// A registry entry is readable by anyone; `register` is only accepted when
/// the transaction is signed by the owner of `key`.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// All DIDs registered under `key` in this chain's registry
    async fn list_dids(&self, key: &str) -> MirrorResult<Vec<String>>;

    /// Record `did` under the caller's own `key`
    async fn register(&self, key: &str, did: &str) -> MirrorResult<()>;
}

/// Engine owning the per-chain linked-DID lists for the connected wallet
pub struct KeyRegistryEngine {
    network: Network,
    solana_registry: Arc<dyn KeyRegistry>,
    ethereum_registry: Arc<dyn KeyRegistry>,
    wallet: RwLock<WalletConnection>,
    solana_dids: RwLock<Vec<String>>,
    ethereum_dids: RwLock<Vec<String>>,
}

impl KeyRegistryEngine {
    pub fn new(
        network: Network,
        solana_registry: Arc<dyn KeyRegistry>,
        ethereum_registry: Arc<dyn KeyRegistry>,
    ) -> Self {
        Self {
            network,
            solana_registry,
            ethereum_registry,
            wallet: RwLock::new(WalletConnection::default()),
            solana_dids: RwLock::new(Vec::new()),
            ethereum_dids: RwLock::new(Vec::new()),
        }
    }

    fn registry(&self, chain: Chain) -> &dyn KeyRegistry {
        match chain {
            Chain::Solana => self.solana_registry.as_ref(),
            Chain::Ethereum => self.ethereum_registry.as_ref(),
        }
    }

    /// Snapshot of the connected wallet state
    pub async fn wallet(&self) -> WalletConnection {
        self.wallet.read().await.clone()
    }

    /// True only when a connected wallet's serialized key or address equals
    /// `key_str` exactly
    pub async fn is_connected(&self, key_str: &str) -> bool {
        self.wallet.read().await.is_connected(key_str)
    }

    /// Natural DID of the connected Solana wallet, if one is connected
    pub async fn natural_did(&self) -> Option<DidSolIdentifier> {
        self.wallet
            .read()
            .await
            .solana
            .as_ref()
            .map(|key| DidSolIdentifier::derive(self.network, key))
    }

    /// Connect a Solana wallet key and refresh its linked-DID list
    pub async fn connect_solana(&self, key: SolanaPublicKey) -> MirrorResult<()> {
        tracing::debug!(key = %key, "Solana wallet connected");
        self.wallet.write().await.solana = Some(key);
        self.refresh_chain(Chain::Solana).await
    }

    /// Drop the Solana connection; its linked-DID list becomes empty
    pub async fn disconnect_solana(&self) {
        self.wallet.write().await.solana = None;
        self.solana_dids.write().await.clear();
    }

    /// Connect an Ethereum account and refresh its linked-DID list
    pub async fn connect_ethereum(&self, address: EthereumAddress) -> MirrorResult<()> {
        tracing::debug!(address = %address, "Ethereum wallet connected");
        self.wallet.write().await.ethereum = Some(address);
        self.refresh_chain(Chain::Ethereum).await
    }

    /// Drop the Ethereum connection; its linked-DID list becomes empty
    pub async fn disconnect_ethereum(&self) {
        self.wallet.write().await.ethereum = None;
        self.ethereum_dids.write().await.clear();
    }

    /// Registry membership for a key, merged with the natural DID
    ///
    /// The natural DID is only derivable from a Solana key; for Ethereum
    /// addresses the list is registry membership alone. The result is
    /// de-duplicated and the natural DID appears exactly once, first unless
    /// the registry already listed it.
    pub async fn linked_dids(&self, chain: Chain, key: &str) -> MirrorResult<Vec<String>> {
        let registered = self.registry(chain).list_dids(key).await?;

        let mut dids: Vec<String> = Vec::with_capacity(registered.len() + 1);
        if chain == Chain::Solana {
            let key = SolanaPublicKey::new(key)?;
            let natural = DidSolIdentifier::derive(self.network, &key).to_string();
            if !registered.contains(&natural) {
                dids.push(natural);
            }
        }
        for did in registered {
            if !dids.contains(&did) {
                dids.push(did);
            }
        }

        Ok(dids)
    }

    /// Whether `did` is linked to `key` on `chain`
    pub async fn registered(&self, chain: Chain, key: &str, did: &str) -> MirrorResult<bool> {
        Ok(self
            .linked_dids(chain, key)
            .await?
            .iter()
            .any(|linked| linked == did))
    }

    /// Register `did` under the connected wallet's key for `chain`, then
    /// refresh that chain's list from source
    pub async fn register(&self, chain: Chain, did: &str) -> MirrorResult<()> {
        let key = self.connected_key(chain).await?;

        tracing::info!(?chain, did, "Registering DID");
        self.registry(chain).register(&key, did).await?;
        self.refresh_chain(chain).await
    }

    async fn connected_key(&self, chain: Chain) -> MirrorResult<String> {
        let wallet = self.wallet.read().await;
        let key = match chain {
            Chain::Solana => wallet.solana.as_ref().map(|k| k.as_str().to_string()),
            Chain::Ethereum => wallet.ethereum.as_ref().map(|a| a.as_str().to_string()),
        };
        key.ok_or(MirrorError::WalletNotConnected)
    }

    /// Register `did` on a specific key string, failing fast unless the
    /// connected wallet actually holds that key
    pub async fn register_key(&self, chain: Chain, key_str: &str, did: &str) -> MirrorResult<()> {
        if !self.is_connected(key_str).await {
            return Err(MirrorError::KeyNotHeld(key_str.to_string()));
        }
        self.register(chain, did).await
    }

    /// Refresh both chains' linked-DID lists from source
    pub async fn refresh(&self) -> MirrorResult<()> {
        self.refresh_chain(Chain::Solana).await?;
        self.refresh_chain(Chain::Ethereum).await
    }

    /// Recompute one chain's linked-DID list. No connection for the chain
    /// yields an empty list, not an error.
    pub async fn refresh_chain(&self, chain: Chain) -> MirrorResult<()> {
        let key = match (chain, &*self.wallet.read().await) {
            (Chain::Solana, wallet) => wallet.solana.as_ref().map(|k| k.as_str().to_string()),
            (Chain::Ethereum, wallet) => wallet.ethereum.as_ref().map(|a| a.as_str().to_string()),
        };

        let dids = match key {
            Some(key) => self.linked_dids(chain, &key).await?,
            None => Vec::new(),
        };

        match chain {
            Chain::Solana => *self.solana_dids.write().await = dids,
            Chain::Ethereum => *self.ethereum_dids.write().await = dids,
        }

        Ok(())
    }

    /// Last refreshed linked-DID list for the connected Solana key
    pub async fn registered_solana_dids(&self) -> Vec<String> {
        self.solana_dids.read().await.clone()
    }

    /// Last refreshed linked-DID list for the connected Ethereum address
    pub async fn registered_ethereum_dids(&self) -> Vec<String> {
        self.ethereum_dids.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory registry fake keyed by key string
    #[derive(Default)]
    struct FakeRegistry {
        entries: RwLock<HashMap<String, Vec<String>>>,
    }

    #[async_trait]
    impl KeyRegistry for FakeRegistry {
        async fn list_dids(&self, key: &str) -> MirrorResult<Vec<String>> {
            Ok(self.entries.read().await.get(key).cloned().unwrap_or_default())
        }

        async fn register(&self, key: &str, did: &str) -> MirrorResult<()> {
            self.entries
                .write()
                .await
                .entry(key.to_string())
                .or_default()
                .push(did.to_string());
            Ok(())
        }
    }

    fn engine_with(
        solana: Arc<FakeRegistry>,
        ethereum: Arc<FakeRegistry>,
    ) -> KeyRegistryEngine {
        KeyRegistryEngine::new(Network::Devnet, solana, ethereum)
    }

    fn test_key() -> SolanaPublicKey {
        SolanaPublicKey::new(bs58::encode([9u8; 32]).into_string()).unwrap()
    }

    #[tokio::test]
    async fn test_linked_dids_with_no_registrations_is_exactly_the_natural_did() {
        let engine = engine_with(Arc::default(), Arc::default());
        let key = test_key();

        let linked = engine.linked_dids(Chain::Solana, key.as_str()).await.unwrap();
        assert_eq!(linked, vec![format!("did:sol:devnet:{}", key)]);
    }

    #[tokio::test]
    async fn test_linked_dids_merge_is_idempotent_for_registered_natural_did() {
        let solana = Arc::new(FakeRegistry::default());
        let key = test_key();
        let natural = format!("did:sol:devnet:{}", key);
        solana.register(key.as_str(), &natural).await.unwrap();

        let engine = engine_with(solana, Arc::default());
        let linked = engine.linked_dids(Chain::Solana, key.as_str()).await.unwrap();

        assert_eq!(linked.iter().filter(|d| **d == natural).count(), 1);
        assert_eq!(linked, vec![natural]);
    }

    #[tokio::test]
    async fn test_linked_dids_prepends_natural_before_registered() {
        let solana = Arc::new(FakeRegistry::default());
        let key = test_key();
        solana.register(key.as_str(), "did:sol:devnet:other").await.unwrap();

        let engine = engine_with(solana, Arc::default());
        let linked = engine.linked_dids(Chain::Solana, key.as_str()).await.unwrap();

        assert_eq!(
            linked,
            vec![
                format!("did:sol:devnet:{}", key),
                "did:sol:devnet:other".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_ethereum_linked_dids_have_no_natural_did() {
        let ethereum = Arc::new(FakeRegistry::default());
        let address = "0x00000000219ab540356cbb839cbe05303d7705fa";
        ethereum.register(address, "did:sol:devnet:claimed").await.unwrap();

        let engine = engine_with(Arc::default(), ethereum);
        let linked = engine.linked_dids(Chain::Ethereum, address).await.unwrap();

        assert_eq!(linked, vec!["did:sol:devnet:claimed".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnected_chain_yields_empty_list() {
        let engine = engine_with(Arc::default(), Arc::default());

        engine.refresh().await.unwrap();
        assert!(engine.registered_solana_dids().await.is_empty());
        assert!(engine.registered_ethereum_dids().await.is_empty());
    }

    #[tokio::test]
    async fn test_connect_refreshes_only_that_chain() {
        let engine = engine_with(Arc::default(), Arc::default());
        let key = test_key();

        engine.connect_solana(key.clone()).await.unwrap();

        let solana_dids = engine.registered_solana_dids().await;
        assert_eq!(solana_dids, vec![format!("did:sol:devnet:{}", key)]);
        assert!(engine.registered_ethereum_dids().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_refreshes_from_source() {
        let solana = Arc::new(FakeRegistry::default());
        let engine = engine_with(solana, Arc::default());
        let key = test_key();

        engine.connect_solana(key.clone()).await.unwrap();
        engine.register(Chain::Solana, "did:sol:devnet:extra").await.unwrap();

        let linked = engine.registered_solana_dids().await;
        assert_eq!(
            linked,
            vec![
                format!("did:sol:devnet:{}", key),
                "did:sol:devnet:extra".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_register_without_wallet_is_rejected() {
        let engine = engine_with(Arc::default(), Arc::default());

        let result = engine.register(Chain::Solana, "did:sol:devnet:x").await;
        assert!(matches!(result, Err(MirrorError::WalletNotConnected)));
    }

    #[tokio::test]
    async fn test_register_key_rejects_unheld_key() {
        let engine = engine_with(Arc::default(), Arc::default());
        engine.connect_solana(test_key()).await.unwrap();

        let foreign = bs58::encode([8u8; 32]).into_string();
        let result = engine
            .register_key(Chain::Solana, &foreign, "did:sol:devnet:x")
            .await;
        assert!(matches!(result, Err(MirrorError::KeyNotHeld(_))));
    }

    #[tokio::test]
    async fn test_disconnect_clears_list() {
        let engine = engine_with(Arc::default(), Arc::default());
        engine.connect_solana(test_key()).await.unwrap();
        assert!(!engine.registered_solana_dids().await.is_empty());

        engine.disconnect_solana().await;
        assert!(engine.registered_solana_dids().await.is_empty());
    }
}
