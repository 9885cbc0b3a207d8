//! Full protocol runs for the key-pair account schemes.

use std::sync::Arc;
use std::time::Duration;

use eauth::domain::challenge::challenge_fields;
use eauth::domain::hashing::personal_message_digest;
use eauth::domain::typed_data::{typed_data_v4_digest, typed_signature_digest};
use eauth::{
    AuthenticationApi, ChallengePayload, ChallengeSecret, ChallengeStore, EauthConfig,
    EauthService, SigningMethod, VerificationOutcome,
};

use crate::helpers::{address_hex, generate_key, sign_digest_hex, ScriptedWalletGateway};

fn service(method: SigningMethod) -> EauthService<ScriptedWalletGateway> {
    let config = EauthConfig {
        method,
        ..Default::default()
    };
    EauthService::new(config, ScriptedWalletGateway::unreachable()).unwrap()
}

fn text_token(payload: ChallengePayload) -> String {
    match payload {
        ChallengePayload::Text(token) => token,
        other => panic!("expected a raw token payload, got {other:?}"),
    }
}

#[tokio::test]
async fn full_personal_sign_run() {
    let key = generate_key();
    let address = address_hex(&key);
    let svc = service(SigningMethod::PersonalSign);

    // The returned message is a 64-hex-character token
    let token = text_token(svc.issue_account_challenge(&address, None).unwrap());
    assert_eq!(token.len(), 64);
    assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));

    // Signing the token's bytes with the matching key authenticates
    let signature = sign_digest_hex(&key, &personal_message_digest(token.as_bytes()));
    assert_eq!(
        svc.verify(&token, &signature, None).await,
        VerificationOutcome::Verified(address)
    );

    // Resubmitting the same pair is a replay
    assert_eq!(
        svc.verify(&token, &signature, None).await,
        VerificationOutcome::Rejected
    );
}

#[tokio::test]
async fn typed_data_run() {
    let key = generate_key();
    let address = address_hex(&key);
    let svc = service(SigningMethod::TypedData);

    let payload = svc.issue_account_challenge(&address, None).unwrap();
    let ChallengePayload::Fields(fields) = &payload else {
        panic!("typed data issues a field list");
    };
    assert_eq!(fields[0].value, "Eauth");
    let token = payload.token().to_string();

    let digest = typed_signature_digest(&challenge_fields("Eauth", &token)).unwrap();
    let signature = sign_digest_hex(&key, &digest);

    assert_eq!(
        svc.verify(&token, &signature, None).await,
        VerificationOutcome::Verified(address)
    );
}

#[tokio::test]
async fn typed_data_v4_run_binds_chain() {
    let key = generate_key();
    let address = address_hex(&key);
    let svc = service(SigningMethod::TypedDataV4);

    let payload = svc.issue_account_challenge(&address, Some(10)).unwrap();
    let ChallengePayload::Document(doc) = payload else {
        panic!("v4 issues a typed-data document");
    };
    assert_eq!(doc.domain.chain_id, 10);
    let token = doc.message.token.clone();

    let digest = typed_data_v4_digest(&doc.domain, &doc.message).unwrap();
    let signature = sign_digest_hex(&key, &digest);

    // Signatures for one chain must not verify under another
    assert_eq!(
        svc.verify(&token, &signature, Some(1)).await,
        VerificationOutcome::Rejected
    );
    assert_eq!(
        svc.verify(&token, &signature, Some(10)).await,
        VerificationOutcome::Verified(address)
    );
}

#[tokio::test]
async fn wrong_key_rejected() {
    let key = generate_key();
    let intruder = generate_key();
    let address = address_hex(&key);
    let svc = service(SigningMethod::PersonalSign);

    let token = text_token(svc.issue_account_challenge(&address, None).unwrap());
    let forged = sign_digest_hex(&intruder, &personal_message_digest(token.as_bytes()));

    assert_eq!(
        svc.verify(&token, &forged, None).await,
        VerificationOutcome::Rejected
    );
}

#[tokio::test]
async fn expired_challenge_rejected() {
    let key = generate_key();
    let address = address_hex(&key);

    let store = Arc::new(ChallengeStore::new(Duration::from_millis(10)));
    let svc = EauthService::from_parts(
        EauthConfig {
            method: SigningMethod::PersonalSign,
            ..Default::default()
        },
        store,
        ChallengeSecret::generate(),
        ScriptedWalletGateway::unreachable(),
    )
    .unwrap();

    let token = text_token(svc.issue_account_challenge(&address, None).unwrap());
    let signature = sign_digest_hex(&key, &personal_message_digest(token.as_bytes()));

    tokio::time::sleep(Duration::from_millis(50)).await;

    // Correct signature, but the challenge aged out
    assert_eq!(
        svc.verify(&token, &signature, None).await,
        VerificationOutcome::Rejected
    );
}

#[tokio::test]
async fn reissue_supersedes_previous_challenge() {
    let key = generate_key();
    let address = address_hex(&key);
    let svc = service(SigningMethod::PersonalSign);

    let first = text_token(svc.issue_account_challenge(&address, None).unwrap());
    let second = text_token(svc.issue_account_challenge(&address, None).unwrap());
    assert_ne!(first, second);

    // Only the newest challenge remains verifiable
    let stale = sign_digest_hex(&key, &personal_message_digest(first.as_bytes()));
    assert_eq!(
        svc.verify(&first, &stale, None).await,
        VerificationOutcome::Rejected
    );

    let fresh = sign_digest_hex(&key, &personal_message_digest(second.as_bytes()));
    assert_eq!(
        svc.verify(&second, &fresh, None).await,
        VerificationOutcome::Verified(address)
    );
}

#[tokio::test]
async fn identity_case_is_folded() {
    let key = generate_key();
    let address = address_hex(&key);
    let shouty = format!("0x{}", address[2..].to_uppercase());
    let svc = service(SigningMethod::PersonalSign);

    let token = text_token(svc.issue_account_challenge(&shouty, None).unwrap());
    let signature = sign_digest_hex(&key, &personal_message_digest(token.as_bytes()));

    // Issued under the uppercase spelling, verified as the lowercase identity
    assert_eq!(
        svc.verify(&token, &signature, None).await,
        VerificationOutcome::Verified(address)
    );
}

#[tokio::test]
async fn concurrent_presentations_admit_one_winner() {
    let key = generate_key();
    let address = address_hex(&key);
    let svc = Arc::new(service(SigningMethod::PersonalSign));

    let token = text_token(svc.issue_account_challenge(&address, None).unwrap());
    let signature = sign_digest_hex(&key, &personal_message_digest(token.as_bytes()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = Arc::clone(&svc);
        let token = token.clone();
        let signature = signature.clone();
        handles.push(tokio::spawn(async move {
            svc.verify(&token, &signature, None).await
        }));
    }

    let mut verified = 0;
    for handle in handles {
        if handle.await.unwrap().is_verified() {
            verified += 1;
        }
    }
    assert_eq!(verified, 1);
}
