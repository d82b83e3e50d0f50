/// DID identifier derivation and parsing
///
/// A did:sol identifier has the form `did:sol:[<network>:]<address>` where the
/// network segment is omitted on mainnet. Derivation from a public key is pure
/// and deterministic; parsing is the inverse and rejects foreign methods.
use crate::error::{MirrorError, MirrorResult};
use crate::wallet::SolanaPublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DID_PREFIX: &str = "did";
const SOL_METHOD: &str = "sol";

/// Solana cluster a DID is anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

impl Network {
    /// Network segment carried inside a DID string. Mainnet DIDs have none.
    pub fn did_segment(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Devnet => Some("devnet"),
            Network::Testnet => Some("testnet"),
            Network::Localnet => Some("localnet"),
        }
    }

    fn from_segment(segment: &str) -> Option<Network> {
        match segment {
            "devnet" => Some(Network::Devnet),
            "testnet" => Some(Network::Testnet),
            "localnet" => Some(Network::Localnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = MirrorError;

    fn from_str(s: &str) -> MirrorResult<Self> {
        match s {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(MirrorError::InvalidIdentifier(format!(
                "unknown network: {}",
                other
            ))),
        }
    }
}

/// A parsed did:sol identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidSolIdentifier {
    pub network: Network,
    /// Base58 authority key the DID is derived from
    pub authority: String,
}

impl DidSolIdentifier {
    /// Derive the natural DID for a public key on a network. Total, no I/O.
    pub fn derive(network: Network, key: &SolanaPublicKey) -> Self {
        Self {
            network,
            authority: key.as_str().to_string(),
        }
    }

    /// Fully qualified identifier of an entry inside this DID's document
    pub fn entry_id(&self, fragment: &str) -> String {
        format!("{}#{}", self, fragment)
    }
}

impl fmt::Display for DidSolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network.did_segment() {
            Some(segment) => write!(f, "{}:{}:{}:{}", DID_PREFIX, SOL_METHOD, segment, self.authority),
            None => write!(f, "{}:{}:{}", DID_PREFIX, SOL_METHOD, self.authority),
        }
    }
}

impl FromStr for DidSolIdentifier {
    type Err = MirrorError;

    fn from_str(did: &str) -> MirrorResult<Self> {
        let invalid = || MirrorError::InvalidIdentifier(did.to_string());

        let rest = did
            .strip_prefix(DID_PREFIX)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(invalid)?;
        let rest = rest
            .strip_prefix(SOL_METHOD)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(invalid)?;

        let (network, authority) = match rest.split_once(':') {
            Some((segment, authority)) => {
                let network = Network::from_segment(segment).ok_or_else(invalid)?;
                (network, authority)
            }
            None => (Network::Mainnet, rest),
        };

        // The authority must be a well-formed public key
        let key = SolanaPublicKey::new(authority).map_err(|_| invalid())?;

        Ok(Self {
            network,
            authority: key.as_str().to_string(),
        })
    }
}

/// Extract the fragment from a verification-method or service identifier of
/// the form `<did>#<fragment>`. Fails when no non-empty fragment is present.
pub fn parse_fragment(identifier: &str) -> MirrorResult<&str> {
    identifier
        .rsplit_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
        .ok_or_else(|| MirrorError::InvalidIdentifier(identifier.to_string()))
}
