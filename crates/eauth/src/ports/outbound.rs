//! # Outbound Port (Driven Port / SPI)
//!
//! The one external dependency of the engine: a ledger gateway able to ask a
//! wallet contract whether a signature is its own.

use thiserror::Error;

/// The 4-byte marker a wallet contract returns to accept a signature.
pub type MagicValue = [u8; 4];

/// Magic value returned by contracts validating the raw data bytes
/// (`isValidSignature(bytes,bytes)` deployments).
pub const MAGIC_VALUE_DATA: MagicValue = [0x20, 0xc1, 0x3b, 0x0b];

/// Magic value returned by contracts validating a 32-byte digest
/// (`isValidSignature(bytes32,bytes)` deployments).
pub const MAGIC_VALUE_DIGEST: MagicValue = [0x16, 0x26, 0xba, 0x7e];

/// Whether a returned marker is one of the accepted magic values.
///
/// Deployments in the wild disagree on the argument encoding, so both
/// markers are accepted; anything else is a negative result.
pub fn is_accepted_magic(value: &MagicValue) -> bool {
    *value == MAGIC_VALUE_DATA || *value == MAGIC_VALUE_DIGEST
}

/// Error from the wallet contract call.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The remote node was unreachable or refused the request
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// The call reverted or the node reported an error
    #[error("rpc call failed: {0}")]
    Call(String),

    /// The response was not a decodable return value
    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),

    /// The call exceeded its deadline
    #[error("wallet call timed out")]
    Timeout,
}

/// Gateway to the remote ledger's signature-validation entry point.
///
/// Implementations must bound the call with an explicit timeout; a slow or
/// unresponsive node must never stall unrelated authentication attempts.
#[async_trait::async_trait]
pub trait WalletGateway: Send + Sync {
    /// Ask `contract` to validate `signature` over `data`, returning the
    /// 4-byte marker from its validation entry point.
    ///
    /// # Errors
    /// * [`WalletError::Transport`] - node unreachable
    /// * [`WalletError::Call`] - call reverted
    /// * [`WalletError::MalformedResponse`] - undecodable return value
    /// * [`WalletError::Timeout`] - deadline exceeded
    async fn is_valid_signature(
        &self,
        contract: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<MagicValue, WalletError>;
}
