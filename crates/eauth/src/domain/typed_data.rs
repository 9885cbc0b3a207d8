//! # Typed-Data Digests
//!
//! The two structured signing schemes reproduced bit-for-bit:
//!
//! - **v1** (`eth_signTypedData`): an ordered field list hashed as
//!   `keccak256(keccak256(schema) ‖ keccak256(values))`, each half tightly
//!   packed with no length framing. Field order is part of the signed content.
//! - **v4** (`eth_signTypedData_v4`): EIP-712 struct hashing under a
//!   chain-separated domain, digested as
//!   `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)`.

use super::entities::{ChallengeMessage, Digest, TypedDataDomain, TypedField};
use super::errors::AuthError;
use super::hashing::{keccak256, keccak256_concat};

/// EIP-712 type string of the domain separator.
const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// EIP-712 type string of the primary challenge struct.
const CHALLENGE_TYPE: &str = "Eauth(string banner,string message,string token)";

// =============================================================================
// v1 (pre-EIP-712) typed signing
// =============================================================================

/// Tight-pack a field value per its declared solidity type.
fn pack_value(field: &TypedField) -> Result<Vec<u8>, AuthError> {
    if field.name.is_empty() {
        return Err(AuthError::UnnamedField);
    }
    match field.kind.as_str() {
        "string" => Ok(field.value.as_bytes().to_vec()),
        "bytes" => {
            let body = field.value.strip_prefix("0x").unwrap_or(&field.value);
            hex::decode(body).map_err(|_| AuthError::InvalidFieldValue)
        }
        other => Err(AuthError::UnsupportedFieldType(other.to_string())),
    }
}

/// Schema hash and value hash of a v1 field list, concatenated.
///
/// This 64-byte packing is the exact byte sequence a contract wallet is asked
/// to validate for the typed variant; it is *not* hashed again before the
/// contract call.
pub fn typed_message_bytes(fields: &[TypedField]) -> Result<[u8; 64], AuthError> {
    if fields.is_empty() {
        return Err(AuthError::EmptyTypedData);
    }

    let mut schema = Vec::new();
    let mut values = Vec::new();
    for field in fields {
        if field.name.is_empty() {
            return Err(AuthError::UnnamedField);
        }
        schema.extend_from_slice(field.kind.as_bytes());
        schema.push(b' ');
        schema.extend_from_slice(field.name.as_bytes());
        values.extend_from_slice(&pack_value(field)?);
    }

    let schema_hash = keccak256(&schema);
    let value_hash = keccak256(&values);

    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(&schema_hash);
    packed[32..].copy_from_slice(&value_hash);
    Ok(packed)
}

/// The digest an externally-owned account signs under v1 typed signing.
pub fn typed_signature_digest(fields: &[TypedField]) -> Result<Digest, AuthError> {
    Ok(keccak256(&typed_message_bytes(fields)?))
}

// =============================================================================
// v4 (EIP-712) typed signing
// =============================================================================

/// Left-pad a u64 into a 32-byte big-endian word.
fn encode_uint256(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-pad a hex address into a 32-byte word.
fn encode_address(address: &str) -> Result<[u8; 32], AuthError> {
    let body = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(body)
        .map_err(|_| AuthError::InvalidVerifyingContract(address.to_string()))?;
    if bytes.len() != 20 {
        return Err(AuthError::InvalidVerifyingContract(address.to_string()));
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// `hashStruct(EIP712Domain)`. Chain id participates here, so a signature
/// produced for one chain cannot verify under another.
pub fn domain_separator(domain: &TypedDataDomain) -> Result<Digest, AuthError> {
    Ok(keccak256_concat(&[
        &keccak256(EIP712_DOMAIN_TYPE.as_bytes()),
        &keccak256(domain.name.as_bytes()),
        &keccak256(domain.version.as_bytes()),
        &encode_uint256(domain.chain_id),
        &encode_address(&domain.verifying_contract)?,
    ]))
}

/// `hashStruct` of the primary challenge struct.
pub fn challenge_struct_hash(message: &ChallengeMessage) -> Digest {
    keccak256_concat(&[
        &keccak256(CHALLENGE_TYPE.as_bytes()),
        &keccak256(message.banner.as_bytes()),
        &keccak256(message.message.as_bytes()),
        &keccak256(message.token.as_bytes()),
    ])
}

/// The digest an externally-owned account signs under EIP-712 v4.
pub fn typed_data_v4_digest(
    domain: &TypedDataDomain,
    message: &ChallengeMessage,
) -> Result<Digest, AuthError> {
    Ok(keccak256_concat(&[
        &[0x19, 0x01],
        &domain_separator(domain)?,
        &challenge_struct_hash(message),
    ]))
}
