//! # Challenge Shaping
//!
//! Outward payload construction per signing method. Token derivation and
//! store bookkeeping live with the service; these helpers only fix the exact
//! shapes clients sign, which the verifier later reconstructs bit-for-bit
//! from the same configuration.

use std::collections::BTreeMap;

use super::entities::{
    ChallengeMessage, TypedDataDocument, TypedDataDomain, TypedField, TypedMember,
};

/// The ordered `[banner, message]` field list of the v1 typed schemes.
///
/// Order is part of the signed content; `message` carries the token.
pub fn challenge_fields(banner: &str, token: &str) -> Vec<TypedField> {
    vec![
        TypedField::string("banner", banner),
        TypedField::string("message", token),
    ]
}

/// The EIP-712 domain shared by builder and verifier.
///
/// `name` is the configured banner and `version` is fixed; the chain id comes
/// from the caller's declared chain context.
pub fn challenge_domain(banner: &str, chain_id: u64, verifying_contract: &str) -> TypedDataDomain {
    TypedDataDomain {
        name: banner.to_string(),
        version: "1".to_string(),
        chain_id,
        verifying_contract: verifying_contract.to_string(),
    }
}

/// The full `eth_signTypedData_v4` signing request for one challenge.
pub fn challenge_document(
    banner: &str,
    prefix: &str,
    token: &str,
    chain_id: u64,
    verifying_contract: &str,
) -> TypedDataDocument {
    let mut types = BTreeMap::new();
    types.insert(
        "EIP712Domain".to_string(),
        vec![
            member("name", "string"),
            member("version", "string"),
            member("chainId", "uint256"),
            member("verifyingContract", "address"),
        ],
    );
    types.insert(
        "Eauth".to_string(),
        vec![
            member("banner", "string"),
            member("message", "string"),
            member("token", "string"),
        ],
    );

    TypedDataDocument {
        types,
        primary_type: "Eauth".to_string(),
        domain: challenge_domain(banner, chain_id, verifying_contract),
        message: ChallengeMessage {
            banner: banner.to_string(),
            message: prefix.to_string(),
            token: token.to_string(),
        },
    }
}

fn member(name: &str, kind: &str) -> TypedMember {
    TypedMember {
        name: name.to_string(),
        kind: kind.to_string(),
    }
}
