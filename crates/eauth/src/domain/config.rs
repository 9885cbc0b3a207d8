//! Engine configuration with validation.
//!
//! All knobs live in one serde-deserializable struct, validated once when the
//! service is constructed. The builder and verifier share the same instance;
//! banner, prefix, and domain values participate in the signed content, so a
//! configuration change invalidates outstanding challenges.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::entities::{is_valid_address, SigningMethod};

/// Default challenge lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EauthConfig {
    /// Request parameter carrying an externally-owned account address.
    pub address_param: String,
    /// Request parameter carrying a contract wallet address.
    pub contract_param: String,
    /// Request parameter echoing the challenge back.
    pub message_param: String,
    /// Request parameter carrying the signature.
    pub signature_param: String,
    /// Display string embedded in structured payloads.
    pub banner: String,
    /// Opaque string mixed into the EIP-712 message body.
    pub prefix: String,
    /// The signing scheme this deployment serves.
    pub method: SigningMethod,
    /// Remote ledger endpoint used for contract-wallet validation.
    pub rpc_url: Option<String>,
    /// Challenge lifetime in seconds (per deployment, not per request).
    pub challenge_ttl_secs: u64,
    /// Timeout for the outbound `eth_call`, in seconds.
    pub call_timeout_secs: u64,
    /// Chain id assumed when the request carries none.
    pub default_chain_id: u64,
    /// EIP-712 `verifyingContract` domain field.
    pub verifying_contract: String,
}

impl Default for EauthConfig {
    fn default() -> Self {
        Self {
            address_param: "Address".to_string(),
            contract_param: "Contract".to_string(),
            message_param: "Message".to_string(),
            signature_param: "Signature".to_string(),
            banner: "Eauth".to_string(),
            prefix: String::new(),
            method: SigningMethod::TypedData,
            rpc_url: None,
            challenge_ttl_secs: DEFAULT_TTL_SECS,
            call_timeout_secs: 10,
            default_chain_id: 1,
            verifying_contract: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

impl EauthConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in [
            ("address", &self.address_param),
            ("contract", &self.contract_param),
            ("message", &self.message_param),
            ("signature", &self.signature_param),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyParamName(label));
            }
        }

        if self.message_param == self.address_param
            || self.message_param == self.contract_param
            || self.signature_param == self.address_param
            || self.signature_param == self.contract_param
            || self.message_param == self.signature_param
        {
            return Err(ConfigError::DuplicateParamNames);
        }

        if self.challenge_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl);
        }

        if self.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if self.method.is_wallet_method() && self.rpc_url.is_none() {
            return Err(ConfigError::MissingRpcUrl(self.method));
        }

        if self.method == SigningMethod::TypedDataV4 && !is_valid_address(&self.verifying_contract)
        {
            return Err(ConfigError::InvalidVerifyingContract(
                self.verifying_contract.clone(),
            ));
        }

        Ok(())
    }

    /// Challenge lifetime as a [`Duration`].
    pub fn challenge_ttl(&self) -> Duration {
        Duration::from_secs(self.challenge_ttl_secs)
    }

    /// Outbound call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A request parameter name is empty
    #[error("{0} parameter name is empty")]
    EmptyParamName(&'static str),

    /// Two request parameters share a name
    #[error("request parameter names must be distinct")]
    DuplicateParamNames,

    /// Challenge TTL of zero would expire every challenge on issuance
    #[error("challenge ttl cannot be 0")]
    InvalidTtl,

    /// Call timeout of zero would fail every wallet validation
    #[error("call timeout cannot be 0")]
    InvalidTimeout,

    /// Wallet validation methods need a ledger endpoint
    #[error("method {0} requires an rpc url")]
    MissingRpcUrl(SigningMethod),

    /// The verifying contract must be a hex address
    #[error("invalid verifying contract address: {0}")]
    InvalidVerifyingContract(String),
}
