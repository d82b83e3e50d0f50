/// Configuration management for the mirror engines
use crate::error::{MirrorError, MirrorResult};
use crate::identifier::Network;
use serde::{Deserialize, Serialize};
use std::env;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub network: Network,
    pub ledger: LedgerConfig,
    pub registries: RegistriesConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// DID driver endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub driver_url: String,
}

/// Per-chain registry endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistriesConfig {
    pub solana_url: String,
    pub ethereum_url: String,
}

/// HTTP client configuration shared by all outbound clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl MirrorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MirrorResult<Self> {
        dotenv::dotenv().ok();

        let network = env::var("SOL_DID_NETWORK")
            .unwrap_or_else(|_| "mainnet".to_string())
            .parse::<Network>()
            .map_err(|_| MirrorError::Validation("Invalid network name".to_string()))?;

        let driver_url = env::var("SOL_DID_DRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:3000/did".to_string());
        let solana_url = env::var("SOL_DID_SOLANA_REGISTRY_URL")
            .unwrap_or_else(|_| "http://localhost:3001/registry/solana".to_string());
        let ethereum_url = env::var("SOL_DID_ETHEREUM_REGISTRY_URL")
            .unwrap_or_else(|_| "http://localhost:3001/registry/ethereum".to_string());

        let user_agent = env::var("SOL_DID_USER_AGENT")
            .unwrap_or_else(|_| format!("sol-did-mirror/{}", env!("CARGO_PKG_VERSION")));
        let timeout_secs = env::var("SOL_DID_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(MirrorConfig {
            network,
            ledger: LedgerConfig { driver_url },
            registries: RegistriesConfig {
                solana_url,
                ethereum_url,
            },
            http: HttpConfig {
                user_agent,
                timeout_secs,
            },
            logging: LoggingConfig { level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> MirrorResult<()> {
        for (name, url) in [
            ("driver", &self.ledger.driver_url),
            ("Solana registry", &self.registries.solana_url),
            ("Ethereum registry", &self.registries.ethereum_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MirrorError::Validation(format!(
                    "{} URL must be http(s): {}",
                    name, url
                )));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(MirrorError::Validation(
                "HTTP timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = test_config();
        config.ledger.driver_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = test_config();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
