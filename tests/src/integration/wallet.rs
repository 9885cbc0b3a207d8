//! Full protocol runs for the contract-wallet schemes.

use eauth::{
    AuthenticationApi, ChallengePayload, EauthConfig, EauthService, SigningMethod,
    VerificationOutcome, MAGIC_VALUE_DATA, MAGIC_VALUE_DIGEST,
};

use crate::helpers::ScriptedWalletGateway;

const CONTRACT: &str = "0x8Ba1f109551bD432803012645Ac136ddd64DBA72";

fn service(
    method: SigningMethod,
    gateway: ScriptedWalletGateway,
) -> EauthService<ScriptedWalletGateway> {
    let config = EauthConfig {
        method,
        rpc_url: Some("http://localhost:8545".to_string()),
        ..Default::default()
    };
    EauthService::new(config, gateway).unwrap()
}

fn token_of(payload: ChallengePayload) -> String {
    payload.token().to_string()
}

#[tokio::test]
async fn wallet_personal_run() {
    let svc = service(
        SigningMethod::WalletPersonal,
        ScriptedWalletGateway::new([MAGIC_VALUE_DATA]),
    );

    let token = token_of(svc.issue_wallet_challenge(CONTRACT).unwrap());
    assert_eq!(token.len(), 64);

    // The wallet accepts; the verified identity is the contract, lowercased
    assert_eq!(
        svc.verify(&token, "0xdeadbeef", None).await,
        VerificationOutcome::Verified(CONTRACT.to_lowercase())
    );

    // Consumed on first success
    assert_eq!(
        svc.verify(&token, "0xdeadbeef", None).await,
        VerificationOutcome::Rejected
    );
}

#[tokio::test]
async fn wallet_typed_data_run() {
    let svc = service(
        SigningMethod::WalletTypedData,
        ScriptedWalletGateway::new([MAGIC_VALUE_DIGEST]),
    );

    let payload = svc.issue_wallet_challenge(CONTRACT).unwrap();
    assert!(matches!(payload, ChallengePayload::Fields(_)));
    let token = token_of(payload);

    assert_eq!(
        svc.verify(&token, "0xdeadbeef", None).await,
        VerificationOutcome::Verified(CONTRACT.to_lowercase())
    );
}

#[tokio::test]
async fn either_magic_value_authenticates() {
    for magic in [MAGIC_VALUE_DATA, MAGIC_VALUE_DIGEST] {
        let svc = service(
            SigningMethod::WalletPersonal,
            ScriptedWalletGateway::new([magic]),
        );
        let token = token_of(svc.issue_wallet_challenge(CONTRACT).unwrap());
        assert!(
            svc.verify(&token, "0xdeadbeef", None).await.is_verified(),
            "magic {magic:02x?} should authenticate"
        );
    }
}

#[tokio::test]
async fn unknown_magic_value_rejects_but_allows_retry() {
    // First answer is a stranger's marker, second is the real one
    let svc = service(
        SigningMethod::WalletPersonal,
        ScriptedWalletGateway::new([[0x11, 0x22, 0x33, 0x44], MAGIC_VALUE_DATA]),
    );

    let token = token_of(svc.issue_wallet_challenge(CONTRACT).unwrap());

    assert_eq!(
        svc.verify(&token, "0xdeadbeef", None).await,
        VerificationOutcome::Rejected
    );
    // The challenge survived the rejection; the retry lands
    assert_eq!(
        svc.verify(&token, "0xdeadbeef", None).await,
        VerificationOutcome::Verified(CONTRACT.to_lowercase())
    );
}

#[tokio::test]
async fn node_failure_is_negative_and_preserves_challenge() {
    let svc = service(
        SigningMethod::WalletPersonal,
        ScriptedWalletGateway::unreachable(),
    );

    let token = token_of(svc.issue_wallet_challenge(CONTRACT).unwrap());

    // A dead node never authenticates and never consumes
    let first = svc.verify(&token, "0xdeadbeef", None).await;
    assert!(matches!(first, VerificationOutcome::Error(_)));

    // Still pending: a later attempt reaches the gateway again rather than
    // missing the store
    let second = svc.verify(&token, "0xdeadbeef", None).await;
    assert!(matches!(second, VerificationOutcome::Error(_)));
}

#[tokio::test]
async fn unissued_message_never_reaches_the_ledger() {
    let svc = service(
        SigningMethod::WalletPersonal,
        ScriptedWalletGateway::new([MAGIC_VALUE_DATA]),
    );

    // No challenge issued for this message: rejected before any remote call
    assert_eq!(
        svc.verify(&"ab".repeat(32), "0xdeadbeef", None).await,
        VerificationOutcome::Rejected
    );
}
