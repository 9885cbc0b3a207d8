//! # ECDSA Recovery (secp256k1)
//!
//! Pure signature-recovery logic for externally-owned accounts.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be strictly less than half
//!   the curve order
//! - **Scalar Range Validation**: R and S must be in `[1, n-1]`
//! - **Constant-Time Operations**: scalar comparisons use the `subtle` crate
//! - Uses the `k256` crate for curve operations

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use super::entities::{Address, Digest, EcdsaSignature};
use super::errors::AuthError;
use super::hashing::keccak256;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order (for the malleability check).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Recover the signer's address from a signature over `digest`.
///
/// Validates scalar ranges and the EIP-2 low-S rule before touching the
/// curve, so malleable or obviously synthetic signatures never reach point
/// recovery.
pub fn recover_address(digest: &Digest, signature: &EcdsaSignature) -> Result<Address, AuthError> {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return Err(AuthError::InvalidSignatureFormat);
    }

    if !is_low_s(&signature.s) {
        return Err(AuthError::MalleableSignature);
    }

    let recovery_id = parse_recovery_id(signature.v)?;

    // sig_bytes is zeroized after parsing
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let sig = match Signature::from_slice(&sig_bytes) {
        Ok(s) => {
            sig_bytes.zeroize();
            s
        }
        Err(_) => {
            sig_bytes.zeroize();
            return Err(AuthError::InvalidSignatureFormat);
        }
    };

    let recovered_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| AuthError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Derive an Ethereum address from a public key: last 20 bytes of
/// keccak256 over the uncompressed point without its 0x04 prefix.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Check that S is in the lower half of the curve order (EIP-2).
///
/// Constant-time: the comparison runs in fixed time regardless of input, so
/// timing reveals nothing about the signature being checked.
fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((s[i] < SECP256K1_HALF_ORDER[i]) as u8);
        let byte_greater = Choice::from((s[i] > SECP256K1_HALF_ORDER[i]) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    // Strict inequality: s == n/2 is rejected
    less.into()
}

/// Check that a scalar is in `[1, n-1]`, in constant time.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((scalar[i] < SECP256K1_ORDER[i]) as u8);
        let byte_greater = Choice::from((scalar[i] > SECP256K1_ORDER[i]) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    (!is_zero & less).into()
}

/// Parse a recovery ID from an Ethereum v value (0, 1, 27, or 28).
fn parse_recovery_id(v: u8) -> Result<RecoveryId, AuthError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(AuthError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| AuthError::InvalidRecoveryId(v))
}

// =============================================================================
// TEST HELPERS
// =============================================================================
