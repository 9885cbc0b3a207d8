//! # Authentication Service
//!
//! Application service wiring the challenge lifecycle together: token
//! derivation, the pending-challenge store, per-method payload shapes, and
//! the two verification paths (direct ECDSA recovery and delegated wallet
//! validation).
//!
//! Scheme dispatch is a closed match over [`SigningMethod`]; each arm pairs
//! the build shape with the verify digest so the two can never drift apart.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::challenge::{challenge_document, challenge_domain, challenge_fields};
use crate::domain::config::{ConfigError, EauthConfig};
use crate::domain::ecdsa::recover_address;
use crate::domain::entities::{
    address_to_hex, is_valid_address, ChallengeMessage, ChallengePayload, Digest, EcdsaSignature,
    SigningMethod, VerificationOutcome,
};
use crate::domain::errors::AuthError;
use crate::domain::hashing::{eip191_prefixed, personal_message_digest};
use crate::domain::nonce::ChallengeSecret;
use crate::domain::pending::ChallengeStore;
use crate::domain::typed_data::{
    typed_data_v4_digest, typed_message_bytes, typed_signature_digest,
};
use crate::ports::inbound::AuthenticationApi;
use crate::ports::outbound::{is_accepted_magic, WalletGateway};

/// Challenge-response authentication service.
///
/// Owns the process-wide secret and the pending-challenge store; generic over
/// the outbound ledger gateway so wallet validation can be mocked in tests.
/// Builder and verifier read the same configuration, which is what makes the
/// reconstructed signing payloads match bit-for-bit.
pub struct EauthService<W: WalletGateway> {
    config: EauthConfig,
    store: Arc<ChallengeStore>,
    secret: ChallengeSecret,
    wallet: W,
}

impl<W: WalletGateway> EauthService<W> {
    /// Create a service with a fresh secret and a store sized from the
    /// configured TTL.
    pub fn new(config: EauthConfig, wallet: W) -> Result<Self, ConfigError> {
        let store = Arc::new(ChallengeStore::new(config.challenge_ttl()));
        Self::from_parts(config, store, ChallengeSecret::generate(), wallet)
    }

    /// Assemble a service from explicit parts.
    ///
    /// Lets tests inject an independent store or a fixed secret; production
    /// callers should prefer [`new`](Self::new).
    pub fn from_parts(
        config: EauthConfig,
        store: Arc<ChallengeStore>,
        secret: ChallengeSecret,
        wallet: W,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            secret,
            wallet,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &EauthConfig {
        &self.config
    }

    /// Shared handle to the pending-challenge store (for the sweep task).
    pub fn store(&self) -> Arc<ChallengeStore> {
        Arc::clone(&self.store)
    }

    fn chain_id(&self, declared: Option<u64>) -> u64 {
        declared.unwrap_or(self.config.default_chain_id)
    }

    fn collaborator_failure(&self, error: AuthError) -> VerificationOutcome {
        // Logged here, opaque to the caller: a transport fault and a forged
        // signature must be indistinguishable on the wire.
        warn!(error = %error, "verification failed at a collaborator boundary");
        VerificationOutcome::Error(error)
    }

    /// Recover the signer over `digest` and consume the matching challenge.
    fn verify_recovered(
        &self,
        message: &str,
        digest: Digest,
        signature: &str,
    ) -> VerificationOutcome {
        let sig = match EcdsaSignature::from_hex(signature) {
            Ok(sig) => sig,
            Err(e) => return self.collaborator_failure(e),
        };
        let recovered = match recover_address(&digest, &sig) {
            Ok(addr) => addr,
            Err(e) => return self.collaborator_failure(e),
        };

        let identity = address_to_hex(&recovered);
        if self.store.consume_matching(&identity, message) {
            debug!(identity = %identity, "challenge verified");
            VerificationOutcome::Verified(identity)
        } else {
            warn!(identity = %identity, "no live challenge matches this signer");
            VerificationOutcome::Rejected
        }
    }

    /// Delegate validation of `data` to the wallet contract pending under
    /// `message`, consuming the challenge only on acceptance.
    async fn verify_wallet(
        &self,
        message: &str,
        data: Vec<u8>,
        signature: &str,
    ) -> VerificationOutcome {
        let Some(contract) = self.store.peek(message) else {
            warn!("no pending wallet challenge for the presented message");
            return VerificationOutcome::Rejected;
        };

        let body = signature.strip_prefix("0x").unwrap_or(signature);
        let sig_bytes = match hex::decode(body) {
            Ok(bytes) => bytes,
            Err(_) => return self.collaborator_failure(AuthError::InvalidSignatureFormat),
        };

        match self
            .wallet
            .is_valid_signature(&contract, &data, &sig_bytes)
            .await
        {
            Ok(magic) if is_accepted_magic(&magic) => {
                // The consume can lose to a concurrent winner; only one
                // caller may see Verified for a given challenge.
                if self.store.consume(message).is_some() {
                    debug!(contract = %contract, "wallet signature accepted");
                    VerificationOutcome::Verified(contract)
                } else {
                    VerificationOutcome::Rejected
                }
            }
            Ok(magic) => {
                // Challenge left intact: the wallet may retry within the TTL
                warn!(
                    contract = %contract,
                    magic = %hex::encode(magic),
                    "wallet returned a non-matching magic value"
                );
                VerificationOutcome::Rejected
            }
            Err(e) => self.collaborator_failure(AuthError::WalletCall(e.to_string())),
        }
    }
}

#[async_trait]
impl<W: WalletGateway> AuthenticationApi for EauthService<W> {
    fn issue_account_challenge(
        &self,
        address: &str,
        chain_id: Option<u64>,
    ) -> Option<ChallengePayload> {
        if !is_valid_address(address) {
            debug!(address = %address, "ignoring malformed account address");
            return None;
        }

        let token = self.secret.derive_token(address);
        let payload = match self.config.method {
            SigningMethod::PersonalSign => ChallengePayload::Text(token.clone()),
            SigningMethod::TypedData => {
                ChallengePayload::Fields(challenge_fields(&self.config.banner, &token))
            }
            SigningMethod::TypedDataV4 => ChallengePayload::Document(challenge_document(
                &self.config.banner,
                &self.config.prefix,
                &token,
                self.chain_id(chain_id),
                &self.config.verifying_contract,
            )),
            SigningMethod::WalletPersonal | SigningMethod::WalletTypedData => return None,
        };

        self.store.issue(address.to_lowercase(), token);
        Some(payload)
    }

    fn issue_wallet_challenge(&self, contract: &str) -> Option<ChallengePayload> {
        if !is_valid_address(contract) {
            debug!(contract = %contract, "ignoring malformed contract address");
            return None;
        }

        let token = self.secret.derive_token(contract);
        let payload = match self.config.method {
            SigningMethod::WalletPersonal => ChallengePayload::Text(token.clone()),
            SigningMethod::WalletTypedData => {
                ChallengePayload::Fields(challenge_fields(&self.config.banner, &token))
            }
            _ => return None,
        };

        // Keyed by the token: the signer answering for the contract may not
        // be the contract's own address, so the token is what comes back.
        self.store.issue(token, contract.to_lowercase());
        Some(payload)
    }

    async fn verify(
        &self,
        message: &str,
        signature: &str,
        chain_id: Option<u64>,
    ) -> VerificationOutcome {
        match self.config.method {
            SigningMethod::PersonalSign => self.verify_recovered(
                message,
                personal_message_digest(message.as_bytes()),
                signature,
            ),
            SigningMethod::TypedData => {
                match typed_signature_digest(&challenge_fields(&self.config.banner, message)) {
                    Ok(digest) => self.verify_recovered(message, digest, signature),
                    Err(e) => self.collaborator_failure(e),
                }
            }
            SigningMethod::TypedDataV4 => {
                let domain = challenge_domain(
                    &self.config.banner,
                    self.chain_id(chain_id),
                    &self.config.verifying_contract,
                );
                let body = ChallengeMessage {
                    banner: self.config.banner.clone(),
                    message: self.config.prefix.clone(),
                    token: message.to_string(),
                };
                match typed_data_v4_digest(&domain, &body) {
                    Ok(digest) => self.verify_recovered(message, digest, signature),
                    Err(e) => self.collaborator_failure(e),
                }
            }
            SigningMethod::WalletPersonal => {
                self.verify_wallet(message, eip191_prefixed(message.as_bytes()), signature)
                    .await
            }
            SigningMethod::WalletTypedData => {
                match typed_message_bytes(&challenge_fields(&self.config.banner, message)) {
                    Ok(packed) => self.verify_wallet(message, packed.to_vec(), signature).await,
                    Err(e) => self.collaborator_failure(e),
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
