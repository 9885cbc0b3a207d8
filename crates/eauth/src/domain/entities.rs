//! # Domain Entities
//!
//! Core data structures for the challenge-response protocol.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::AuthError;

/// 32-byte keccak-256 digest.
pub type Digest = [u8; 32];

/// Ethereum-style address derived from a public key (last 20 bytes of
/// keccak256(pubkey)).
pub type Address = [u8; 20];

/// Check that a string is a plain hex Ethereum address (`0x` + 40 hex chars).
///
/// Mixed-case input is accepted; checksum casing is not enforced. Lookups
/// always operate on the lowercase form.
pub fn is_valid_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Render a recovered address as a lowercase `0x`-prefixed hex string.
pub fn address_to_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

// =============================================================================
// ECDSA Signature (secp256k1)
// =============================================================================

/// ECDSA signature on the secp256k1 curve, in Ethereum's 65-byte layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Parse a `0x`-prefixed 65-byte hex signature (`r ‖ s ‖ v`).
    pub fn from_hex(s: &str) -> Result<Self, AuthError> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(body).map_err(|_| AuthError::InvalidSignatureFormat)?;
        if bytes.len() != 65 {
            return Err(AuthError::InvalidSignatureFormat);
        }

        let mut r = [0u8; 32];
        let mut sig_s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        sig_s.copy_from_slice(&bytes[32..64]);

        Ok(Self {
            r,
            s: sig_s,
            v: bytes[64],
        })
    }
}

// =============================================================================
// Signing Methods
// =============================================================================

/// The closed set of supported signing schemes.
///
/// Each variant fixes the exact byte layout that is hashed and signed, the
/// recovery path (direct ECDSA vs. contract-wallet validation), and whether a
/// prefix or domain separator participates in the digest. Wire names match the
/// RPC methods clients invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningMethod {
    /// Raw token string, EIP-191 prefixed before hashing.
    #[serde(rename = "personal_sign")]
    PersonalSign,
    /// Ordered `[banner, message]` field list, pre-EIP-712 typed hashing.
    #[serde(rename = "eth_signTypedData")]
    TypedData,
    /// EIP-712 document with a chain-separated domain.
    #[serde(rename = "eth_signTypedData_v4")]
    TypedDataV4,
    /// Contract wallet validating an EIP-191 prefixed token.
    #[serde(rename = "wallet_validation_personal")]
    WalletPersonal,
    /// Contract wallet validating the typed `[banner, message]` packing.
    #[serde(rename = "wallet_validation_typedData")]
    WalletTypedData,
}

impl SigningMethod {
    /// Whether verification is delegated to an on-chain wallet contract.
    pub fn is_wallet_method(&self) -> bool {
        matches!(self, Self::WalletPersonal | Self::WalletTypedData)
    }

    /// Wire name, as configured and as sent by clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalSign => "personal_sign",
            Self::TypedData => "eth_signTypedData",
            Self::TypedDataV4 => "eth_signTypedData_v4",
            Self::WalletPersonal => "wallet_validation_personal",
            Self::WalletTypedData => "wallet_validation_typedData",
        }
    }
}

impl fmt::Display for SigningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Challenge Payloads
// =============================================================================

/// One `{type, name, value}` entry of a typed-data v1 field list.
///
/// Field order is part of the signed content and must not be reordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    /// Solidity type of the value (`string` or `bytes`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Field name, part of the signed schema.
    pub name: String,
    /// Field value.
    pub value: String,
}

impl TypedField {
    /// A `string`-typed field.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One member of an EIP-712 type definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedMember {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// EIP-712 domain separator fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    #[serde(rename = "verifyingContract")]
    pub verifying_contract: String,
}

/// Values of the primary `Eauth` struct signed under EIP-712.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeMessage {
    /// Display banner shown by the wallet.
    pub banner: String,
    /// Configured opaque prefix.
    pub message: String,
    /// The nonce token.
    pub token: String,
}

/// Full EIP-712 signing request, as handed to `eth_signTypedData_v4`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataDocument {
    pub types: BTreeMap<String, Vec<TypedMember>>,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub domain: TypedDataDomain,
    pub message: ChallengeMessage,
}

/// The outward challenge, shaped per signing method.
///
/// Serializes untagged so the wire form is a plain string, a field array, or
/// an EIP-712 document, exactly as wallet RPCs expect.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChallengePayload {
    /// Raw token string (`personal_sign` and `wallet_validation_personal`).
    Text(String),
    /// Ordered typed-data v1 field list.
    Fields(Vec<TypedField>),
    /// EIP-712 v4 document.
    Document(TypedDataDocument),
}

impl ChallengePayload {
    /// The nonce token embedded in this payload.
    pub fn token(&self) -> &str {
        match self {
            Self::Text(token) => token,
            Self::Fields(fields) => fields
                .last()
                .map(|f| f.value.as_str())
                .unwrap_or_default(),
            Self::Document(doc) => &doc.message.token,
        }
    }
}

// =============================================================================
// Verification Outcome
// =============================================================================

/// Result of one verification attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Recovery succeeded and matched a live challenge; carries the
    /// lowercase identity that issued it.
    Verified(String),
    /// Recovery succeeded but no live challenge matched (never issued,
    /// already consumed, expired, or a different signer).
    Rejected,
    /// A collaborator call failed (malformed signature, unreachable remote,
    /// decoding failure). Indistinguishable from `Rejected` on the wire.
    Error(AuthError),
}

impl VerificationOutcome {
    /// Whether this outcome authenticates an identity.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// The authenticated identity, if any.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Verified(addr) => Some(addr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address_accepted() {
        assert!(is_valid_address("0x550890336f0b5afd85fc355351372253e2491a6e"));
        assert!(is_valid_address("0x550890336F0B5AFD85FC355351372253E2491A6E"));
    }

    #[test]
    fn test_invalid_address_rejected() {
        assert!(!is_valid_address("550890336f0b5afd85fc355351372253e2491a6e"));
        assert!(!is_valid_address("0x550890336f0b5afd85fc355351372253e2491a6"));
        assert!(!is_valid_address("0x550890336f0b5afd85fc355351372253e2491a6ez"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
    }

    #[test]
    fn test_signature_from_hex() {
        let mut raw = String::from("0x");
        raw.push_str(&"aa".repeat(32));
        raw.push_str(&"bb".repeat(32));
        raw.push_str("1b");

        let sig = EcdsaSignature::from_hex(&raw).unwrap();
        assert_eq!(sig.r, [0xAA; 32]);
        assert_eq!(sig.s, [0xBB; 32]);
        assert_eq!(sig.v, 27);
    }

    #[test]
    fn test_signature_from_hex_rejects_bad_input() {
        assert!(EcdsaSignature::from_hex("0x1234").is_err());
        assert!(EcdsaSignature::from_hex("not hex").is_err());
        // 64 bytes: r and s without the recovery byte
        let short = format!("0x{}", "ab".repeat(64));
        assert!(EcdsaSignature::from_hex(&short).is_err());
    }

    #[test]
    fn test_method_wire_names_round_trip() {
        for method in [
            SigningMethod::PersonalSign,
            SigningMethod::TypedData,
            SigningMethod::TypedDataV4,
            SigningMethod::WalletPersonal,
            SigningMethod::WalletTypedData,
        ] {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            let parsed: SigningMethod = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, method);
        }
    }

    #[test]
    fn test_payload_serializes_untagged() {
        let text = ChallengePayload::Text("deadbeef".into());
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"deadbeef\"");

        let fields = ChallengePayload::Fields(vec![
            TypedField::string("banner", "Eauth"),
            TypedField::string("message", "deadbeef"),
        ]);
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json[0]["type"], "string");
        assert_eq!(json[1]["value"], "deadbeef");
    }

    #[test]
    fn test_payload_token_accessor() {
        let fields = ChallengePayload::Fields(vec![
            TypedField::string("banner", "Eauth"),
            TypedField::string("message", "cafe"),
        ]);
        assert_eq!(fields.token(), "cafe");
    }
}
