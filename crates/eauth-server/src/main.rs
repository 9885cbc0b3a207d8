//! # Eauth Server
//!
//! Demonstration HTTP server for the authentication engine.
//!
//! Routes (parameter names follow the configuration):
//!
//! - `GET  /auth/:Address` — issue a challenge for an account
//! - `GET  /auth/contract/:Contract` — issue a challenge for a contract wallet
//! - `POST /auth/:Message/:Signature` — verify an echoed challenge
//!
//! Handlers return the engine outcome verbatim; requests the engine ignored
//! answer 400.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG` honored, `info` otherwise)
//! 2. Load configuration from `EAUTH_*` environment variables
//! 3. Construct the service (validates configuration)
//! 4. Spawn the challenge-expiry sweep task
//! 5. Serve until SIGINT

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eauth::{
    eauth_middleware, sweep_task, AuthOutcome, EauthConfig, EauthService, JsonRpcWalletGateway,
};

/// Interval between expiry sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let bind = env::var("EAUTH_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let rpc_url = config
        .rpc_url
        .clone()
        .unwrap_or_else(|| "http://localhost:8545".to_string());
    let gateway = JsonRpcWalletGateway::new(rpc_url, config.call_timeout())
        .context("failed to construct the wallet gateway")?;

    let service = Arc::new(EauthService::new(config, gateway)?);
    info!(
        method = %service.config().method,
        ttl_secs = service.config().challenge_ttl_secs,
        "eauth engine ready"
    );

    tokio::spawn(sweep_task(service.store(), SWEEP_INTERVAL));

    let app = router(service);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Build the route set from the configured parameter names.
fn router(service: Arc<EauthService<JsonRpcWalletGateway>>) -> Router {
    let config = service.config();
    let challenge_route = format!("/auth/:{}", config.address_param);
    let contract_route = format!("/auth/contract/:{}", config.contract_param);
    let verify_route = format!(
        "/auth/:{}/:{}",
        config.message_param, config.signature_param
    );

    Router::new()
        .route(&challenge_route, get(respond))
        .route(&contract_route, get(respond))
        .route(&verify_route, post(respond))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&service),
            eauth_middleware::<JsonRpcWalletGateway>,
        ))
}

/// Render whatever the middleware attached, or 400 when it ignored the
/// request (malformed identity, missing parameters).
async fn respond(outcome: Option<Extension<AuthOutcome>>) -> Response {
    match outcome {
        Some(Extension(outcome)) => Json(outcome).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Configuration from `EAUTH_*` environment variables over the defaults.
fn load_config() -> Result<EauthConfig> {
    let mut config = EauthConfig::default();

    if let Ok(method) = env::var("EAUTH_METHOD") {
        config.method = serde_json::from_value(serde_json::Value::String(method.clone()))
            .with_context(|| format!("unknown signing method: {method}"))?;
    }
    if let Ok(banner) = env::var("EAUTH_BANNER") {
        config.banner = banner;
    }
    if let Ok(prefix) = env::var("EAUTH_PREFIX") {
        config.prefix = prefix;
    }
    if let Ok(rpc_url) = env::var("EAUTH_RPC_URL") {
        config.rpc_url = Some(rpc_url);
    }
    if let Ok(ttl) = env::var("EAUTH_TTL_SECS") {
        config.challenge_ttl_secs = ttl.parse().context("EAUTH_TTL_SECS must be an integer")?;
    }
    if let Ok(chain_id) = env::var("EAUTH_CHAIN_ID") {
        config.default_chain_id = chain_id
            .parse()
            .context("EAUTH_CHAIN_ID must be an integer")?;
    }

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
    info!("shutdown signal received");
}
