//! # HTTP Middleware Adapter
//!
//! Axum middleware that maps route parameters onto the engine: an address
//! parameter requests a challenge, a message/signature pair requests
//! verification, and the outcome rides the request as an extension for the
//! downstream handler to render.
//!
//! The engine never depends on this adapter; any framework able to hand over
//! the same parameters can drive the ports directly.

use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::entities::{ChallengePayload, VerificationOutcome};
use crate::ports::inbound::AuthenticationApi;
use crate::ports::outbound::WalletGateway;
use crate::service::EauthService;

/// Request header carrying the caller's declared chain id.
pub const CHAIN_ID_HEADER: &str = "chainid";

/// The engine's verdict for one request, attached as a request extension.
///
/// Serializes to the wire shapes handlers return verbatim:
/// `{"message": <payload>}` after issuance,
/// `{"recoveredAddress": "0x…" | false}` after verification.
#[derive(Clone, Debug)]
pub enum AuthOutcome {
    /// A challenge was issued.
    Challenge(ChallengePayload),
    /// A verification ran (successfully or not).
    Recovered(VerificationOutcome),
}

impl Serialize for AuthOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Challenge(payload) => map.serialize_entry("message", payload)?,
            Self::Recovered(VerificationOutcome::Verified(address)) => {
                map.serialize_entry("recoveredAddress", address)?
            }
            // Rejections and collaborator failures are indistinguishable
            Self::Recovered(_) => map.serialize_entry("recoveredAddress", &false)?,
        }
        map.end()
    }
}

/// Middleware driving the engine from route parameters.
///
/// Parameter names come from the service configuration. A request carrying
/// none of them, or a malformed identity, passes through without an
/// extension; handlers decide how to respond to that.
pub async fn eauth_middleware<W: WalletGateway + 'static>(
    State(service): State<Arc<EauthService<W>>>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Response {
    let config = service.config();
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    };

    let address = param(&config.address_param);
    let contract = param(&config.contract_param);
    let message = param(&config.message_param);
    let signature = param(&config.signature_param);

    let chain_id = request
        .headers()
        .get(CHAIN_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let outcome = if let Some(address) = address {
        service
            .issue_account_challenge(&address, chain_id)
            .map(AuthOutcome::Challenge)
    } else if let Some(contract) = contract {
        service
            .issue_wallet_challenge(&contract)
            .map(AuthOutcome::Challenge)
    } else if let (Some(message), Some(signature)) = (message, signature) {
        Some(AuthOutcome::Recovered(
            service.verify(&message, &signature, chain_id).await,
        ))
    } else {
        None
    };

    if let Some(outcome) = outcome {
        request.extensions_mut().insert(outcome);
    }

    next.run(request).await
}
