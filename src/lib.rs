/// sol-did-mirror
///
/// Client-side mirror of an on-chain did:sol document. Owns the active DID,
/// keeps its resolved document and account state in sync through a
/// mutation-then-reload protocol, and cross-references document keys against
/// per-chain ownership registries. The UI layer consumes the two engines
/// through `MirrorContext`; all ledger and registry I/O goes through the
/// adapter traits.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod identifier;
pub mod ledger;
pub mod registry;
pub mod state;
pub mod telemetry;
pub mod wallet;

pub use config::MirrorConfig;
pub use context::MirrorContext;
pub use document::{
    DidDocument, DocumentEntry, ServiceEndpoint, VerificationMethod, VerificationMethodFlags,
    VerificationMethodType,
};
pub use error::{MirrorError, MirrorResult};
pub use identifier::{parse_fragment, DidSolIdentifier, Network};
pub use ledger::{
    AccountVersion, AddVerificationMethodParams, DidAccountInfo, HttpLedgerConfig,
    HttpLedgerService, LedgerService,
};
pub use registry::{Chain, HttpKeyRegistry, HttpRegistryConfig, KeyRegistry, KeyRegistryEngine};
pub use state::{AccountState, DidSnapshot, DidStateEngine};
pub use wallet::{EthereumAddress, SolanaPublicKey, WalletConnection};
