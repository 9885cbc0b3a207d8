//! # Eauth
//!
//! Stateless, replay-resistant challenge-response authentication for
//! Ethereum accounts: a client proves control of an externally-owned key
//! pair or an ERC-1271 contract wallet without transmitting secrets.
//!
//! ## Protocol
//!
//! 1. A caller requests a challenge for a claimed identity; the engine
//!    derives an unguessable single-use token and records it in a
//!    TTL-bounded store.
//! 2. The identity (or its delegated signer) signs the challenge off-system
//!    under the configured scheme.
//! 3. The engine verifies the returned signature — by direct secp256k1
//!    recovery for key-pair accounts, or by an on-chain
//!    `isValidSignature` call for contract wallets — consumes the pending
//!    challenge, and returns the authenticated identity.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): digests, payload shapes, the challenge
//!   store; no I/O
//! - **Ports Layer** (`ports/`): the inbound API and the outbound ledger
//!   gateway traits
//! - **Adapters Layer** (`adapters/`): JSON-RPC gateway, axum middleware
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//!
//! ## Security Notes
//!
//! - **Replay Prevention**: every challenge is consumed atomically on its
//!   first successful verification
//! - **Malleability Prevention (EIP-2)**: signatures with high S values are
//!   rejected
//! - **Opaque Failures**: collaborator faults are logged, then surfaced
//!   exactly like a forged signature

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::http::{eauth_middleware, AuthOutcome, CHAIN_ID_HEADER};
pub use adapters::rpc::JsonRpcWalletGateway;
pub use domain::config::{ConfigError, EauthConfig, DEFAULT_TTL_SECS};
pub use domain::entities::{
    address_to_hex, is_valid_address, ChallengeMessage, ChallengePayload, EcdsaSignature,
    SigningMethod, TypedDataDocument, TypedDataDomain, TypedField, VerificationOutcome,
};
pub use domain::errors::AuthError;
pub use domain::nonce::ChallengeSecret;
pub use domain::pending::{sweep_task, ChallengeStore, StoreStats};
pub use ports::inbound::AuthenticationApi;
pub use ports::outbound::{
    is_accepted_magic, MagicValue, WalletError, WalletGateway, MAGIC_VALUE_DATA,
    MAGIC_VALUE_DIGEST,
};
pub use service::EauthService;
