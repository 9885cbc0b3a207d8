//! # Inbound Port (Driving Port / API)
//!
//! The public API of the authentication engine. One protocol run is two
//! calls: a challenge issuance followed by a verification, with the engine
//! holding the pending challenge in between.

use async_trait::async_trait;

use crate::domain::entities::{ChallengePayload, VerificationOutcome};

/// Primary authentication API.
///
/// Implementations must be thread-safe (`Send + Sync`); many protocol runs
/// are in flight concurrently against one instance.
#[async_trait]
pub trait AuthenticationApi: Send + Sync {
    /// Issue a challenge for an externally-owned account.
    ///
    /// Returns `None` when the address is malformed or the configured method
    /// is a wallet-validation method, so callers can silently fall through to
    /// other resolution strategies. `chain_id` participates only in the
    /// EIP-712 domain; `None` falls back to the configured default.
    fn issue_account_challenge(
        &self,
        address: &str,
        chain_id: Option<u64>,
    ) -> Option<ChallengePayload>;

    /// Issue a challenge for a contract wallet.
    ///
    /// Returns `None` when the address is malformed or the configured method
    /// is not a wallet-validation method. The returned payload carries the
    /// token the wallet's operator signs; the token, not the contract
    /// address, later keys the verification lookup.
    fn issue_wallet_challenge(&self, contract: &str) -> Option<ChallengePayload>;

    /// Verify an echoed challenge and signature under the configured method.
    ///
    /// On success the pending challenge is consumed and the lowercase
    /// identity that requested it is returned; a consumed, expired, or never
    /// issued challenge is `Rejected`. Collaborator failures surface as
    /// `Error` without consuming the challenge.
    async fn verify(
        &self,
        message: &str,
        signature: &str,
        chain_id: Option<u64>,
    ) -> VerificationOutcome;
}
