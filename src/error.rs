/// Unified error types for the mirror engines
use thiserror::Error;

/// Main error type for DID mirror operations
#[derive(Error, Debug)]
pub enum MirrorError {
    /// No signing capability available for a write
    #[error("Wallet is not connected")]
    WalletNotConnected,

    /// Malformed DID string or entry identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Migration requested on a non-eligible account
    #[error("DID is not migratable: {0}")]
    NotMigratable(String),

    /// Ledger or registry read failure
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Ledger write failure or rejected transaction
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A write targeted a key the connected wallet does not hold
    #[error("Key is not held by the connected wallet: {0}")]
    KeyNotHeld(String),

    /// Configuration errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for mirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;
