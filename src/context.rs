/// Explicit construction and wiring of the mirror engines
///
/// The context is built once at host startup and passed by reference to the
/// UI layer; nothing here is process-global, and teardown is explicit via
/// `dispose`.
use crate::{
    config::MirrorConfig,
    error::MirrorResult,
    identifier::DidSolIdentifier,
    ledger::{HttpLedgerConfig, HttpLedgerService},
    registry::{HttpKeyRegistry, HttpRegistryConfig, KeyRegistryEngine},
    state::DidStateEngine,
    wallet::{EthereumAddress, SolanaPublicKey},
};
use std::sync::Arc;
use std::time::Duration;

/// Application context holding both engines and their shared clients
#[derive(Clone)]
pub struct MirrorContext {
    pub config: Arc<MirrorConfig>,
    pub registry: Arc<KeyRegistryEngine>,
    pub state: Arc<DidStateEngine>,
}

impl MirrorContext {
    /// Create a new context from configuration
    pub fn new(config: MirrorConfig) -> MirrorResult<Self> {
        config.validate()?;

        let timeout = Duration::from_secs(config.http.timeout_secs);

        let ledger = Arc::new(HttpLedgerService::new(HttpLedgerConfig {
            base_url: config.ledger.driver_url.clone(),
            user_agent: config.http.user_agent.clone(),
            timeout,
        })?);

        let solana_registry = Arc::new(HttpKeyRegistry::new(HttpRegistryConfig {
            base_url: config.registries.solana_url.clone(),
            user_agent: config.http.user_agent.clone(),
            timeout,
        })?);
        let ethereum_registry = Arc::new(HttpKeyRegistry::new(HttpRegistryConfig {
            base_url: config.registries.ethereum_url.clone(),
            user_agent: config.http.user_agent.clone(),
            timeout,
        })?);

        let registry = Arc::new(KeyRegistryEngine::new(
            config.network,
            solana_registry,
            ethereum_registry,
        ));
        let state = Arc::new(DidStateEngine::new(
            config.network,
            ledger,
            Arc::clone(&registry),
        ));

        Ok(Self {
            config: Arc::new(config),
            registry,
            state,
        })
    }

    /// Start the session, optionally pinning an externally supplied DID
    /// reference (e.g. parsed from a deep link)
    pub async fn start(&self, external: Option<DidSolIdentifier>) -> MirrorResult<()> {
        self.state.initialize(external).await
    }

    /// Wallet-connection event for the Solana chain
    pub async fn connect_solana_wallet(&self, key: SolanaPublicKey) -> MirrorResult<()> {
        self.state.connect_wallet(key).await
    }

    /// Wallet-connection event for the Ethereum chain
    pub async fn connect_ethereum_wallet(&self, address: EthereumAddress) -> MirrorResult<()> {
        self.registry.connect_ethereum(address).await
    }

    pub async fn disconnect_solana_wallet(&self) {
        self.registry.disconnect_solana().await;
    }

    pub async fn disconnect_ethereum_wallet(&self) {
        self.registry.disconnect_ethereum().await;
    }

    /// Tear down the session state
    pub async fn dispose(&self) {
        self.registry.disconnect_solana().await;
        self.registry.disconnect_ethereum().await;
        self.state.dispose().await;
    }
}
