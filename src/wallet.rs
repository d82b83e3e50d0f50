/// Wallet capability snapshots
///
/// The engines never build or sign transactions themselves; they only need to
/// know which key or address the connected wallet serializes to, so they can
/// derive DIDs and gate write operations on exact key possession.
use crate::error::{MirrorError, MirrorResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of an Ed25519 public key
const SOLANA_PUBKEY_LEN: usize = 32;

/// Length in bytes of an Ethereum account address
const ETHEREUM_ADDRESS_LEN: usize = 20;

/// Base58-encoded Ed25519 public key of a Solana wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolanaPublicKey(String);

impl SolanaPublicKey {
    /// Validate and wrap a base58 key string
    pub fn new(base58: impl Into<String>) -> MirrorResult<Self> {
        let base58 = base58.into();
        let bytes = bs58::decode(&base58)
            .into_vec()
            .map_err(|_| MirrorError::InvalidIdentifier(format!("not base58: {}", base58)))?;
        if bytes.len() != SOLANA_PUBKEY_LEN {
            return Err(MirrorError::InvalidIdentifier(format!(
                "expected a {}-byte public key, got {} bytes: {}",
                SOLANA_PUBKEY_LEN,
                bytes.len(),
                base58
            )));
        }
        Ok(Self(base58))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SolanaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 0x-prefixed Ethereum account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthereumAddress(String);

impl EthereumAddress {
    /// Validate and wrap a hex address string
    pub fn new(address: impl Into<String>) -> MirrorResult<Self> {
        let address = address.into();
        let digits = address
            .strip_prefix("0x")
            .ok_or_else(|| MirrorError::InvalidIdentifier(format!("missing 0x prefix: {}", address)))?;
        let bytes = hex::decode(digits)
            .map_err(|_| MirrorError::InvalidIdentifier(format!("not hex: {}", address)))?;
        if bytes.len() != ETHEREUM_ADDRESS_LEN {
            return Err(MirrorError::InvalidIdentifier(format!(
                "expected a {}-byte address, got {} bytes: {}",
                ETHEREUM_ADDRESS_LEN,
                bytes.len(),
                address
            )));
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connected wallet state, one slot per chain
///
/// A user may hold a Solana wallet, an Ethereum wallet, both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletConnection {
    pub solana: Option<SolanaPublicKey>,
    pub ethereum: Option<EthereumAddress>,
}

impl WalletConnection {
    /// True only when a connected wallet's serialized key or address equals
    /// `key_str` exactly. Gates self-attestation and registration writes.
    pub fn is_connected(&self, key_str: &str) -> bool {
        self.solana.as_ref().is_some_and(|k| k.as_str() == key_str)
            || self.ethereum.as_ref().is_some_and(|a| a.as_str() == key_str)
    }
}
