/// Context wiring tests
use sol_did_mirror::config::{
    HttpConfig, LedgerConfig, LoggingConfig, MirrorConfig, RegistriesConfig,
};
use sol_did_mirror::{MirrorContext, MirrorError, Network};

fn test_config() -> MirrorConfig {
    MirrorConfig {
        network: Network::Devnet,
        ledger: LedgerConfig {
            driver_url: "http://localhost:3000/did".to_string(),
        },
        registries: RegistriesConfig {
            solana_url: "http://localhost:3001/registry/solana".to_string(),
            ethereum_url: "http://localhost:3001/registry/ethereum".to_string(),
        },
        http: HttpConfig {
            user_agent: "sol-did-mirror/test".to_string(),
            timeout_secs: 10,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
    }
}

#[tokio::test]
async fn test_context_builds_engines_from_config() {
    let ctx = MirrorContext::new(test_config()).unwrap();

    // Fresh context has no active DID and the empty default document
    assert!(ctx.state.did().await.is_none());
    assert!(ctx.state.document().await.verification_method.is_empty());
    assert!(ctx.registry.wallet().await.solana.is_none());
}

#[test]
fn test_context_rejects_invalid_config() {
    let mut config = test_config();
    config.registries.ethereum_url = "not-a-url".to_string();

    let result = MirrorContext::new(config);
    assert!(matches!(result, Err(MirrorError::Validation(_))));
}

#[tokio::test]
async fn test_dispose_resets_session_state() {
    let ctx = MirrorContext::new(test_config()).unwrap();

    ctx.dispose().await;

    assert!(ctx.state.did().await.is_none());
    assert!(ctx.registry.registered_solana_dids().await.is_empty());
    assert!(ctx.registry.registered_ethereum_dids().await.is_empty());
}
