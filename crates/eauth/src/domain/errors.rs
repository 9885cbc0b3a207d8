//! # Engine Errors
//!
//! Error types for challenge construction and signature verification.
//!
//! Collaborator failures are caught at the service boundary and surfaced as
//! negative verification results, so callers cannot distinguish a transport
//! fault from a forged signature.

use thiserror::Error;

/// Errors that can occur while building or verifying a challenge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The signature is not 65 bytes of valid hex
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Signature has a high S value (EIP-2 malleability protection)
    #[error("malleable signature (high S value)")]
    MalleableSignature,

    /// Failed to recover a public key from the signature
    #[error("failed to recover public key")]
    RecoveryFailed,

    /// A typed field was declared without a name
    #[error("typed field missing a name")]
    UnnamedField,

    /// A typed field uses a type the tight packer does not support
    #[error("unsupported typed field type: {0}")]
    UnsupportedFieldType(String),

    /// An empty typed field list cannot be hashed
    #[error("empty typed field list")]
    EmptyTypedData,

    /// A `bytes`-typed field value was not valid hex
    #[error("invalid hex in typed field value")]
    InvalidFieldValue,

    /// The verifying contract address in configuration is malformed
    #[error("invalid verifying contract address: {0}")]
    InvalidVerifyingContract(String),

    /// The wallet contract call failed (transport, revert, or decoding)
    #[error("wallet validation call failed: {0}")]
    WalletCall(String),
}
