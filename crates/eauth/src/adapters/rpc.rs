//! # JSON-RPC Wallet Gateway
//!
//! Implements [`WalletGateway`] against a remote ledger node: ABI-encodes the
//! `isValidSignature(bytes,bytes)` call, issues a read-only `eth_call` over
//! JSON-RPC 2.0, and decodes the returned 4-byte marker.
//!
//! Every request is bounded by the client timeout configured at construction;
//! a timed-out or failed call surfaces as a [`WalletError`], which the
//! service treats as a negative verification result.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::hashing::keccak256;
use crate::ports::outbound::{MagicValue, WalletError, WalletGateway};

/// Function signature of the validation entry point.
const IS_VALID_SIGNATURE: &str = "isValidSignature(bytes,bytes)";

/// Wallet gateway backed by a JSON-RPC `eth_call`.
pub struct JsonRpcWalletGateway {
    rpc_url: String,
    client: reqwest::Client,
}

impl JsonRpcWalletGateway {
    /// Create a gateway against `rpc_url` with a per-call `timeout`.
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            client,
        })
    }

    fn classify(error: reqwest::Error) -> WalletError {
        if error.is_timeout() {
            WalletError::Timeout
        } else {
            WalletError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl WalletGateway for JsonRpcWalletGateway {
    async fn is_valid_signature(
        &self,
        contract: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<MagicValue, WalletError> {
        let call_data = encode_is_valid_signature(data, signature);

        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {
                    "to": contract,
                    "data": format!("0x{}", hex::encode(&call_data)),
                },
                "latest"
            ],
            "id": 1
        });

        debug!(contract = %contract, bytes = call_data.len(), "issuing isValidSignature call");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(Self::classify)?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WalletError::MalformedResponse(e.to_string()))?;

        if let Some(error) = body.get("error") {
            warn!(contract = %contract, error = %error, "eth_call reported an error");
            return Err(WalletError::Call(error.to_string()));
        }

        let result = body
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| WalletError::MalformedResponse("missing result field".to_string()))?;

        decode_magic_value(result)
    }
}

/// ABI-encode `isValidSignature(bytes,bytes)` call data.
///
/// Layout: 4-byte selector, two offset words, then each argument as a length
/// word followed by its bytes zero-padded to a 32-byte boundary.
fn encode_is_valid_signature(data: &[u8], signature: &[u8]) -> Vec<u8> {
    let data_tail = 32 + padded_len(data.len());

    let mut out = Vec::with_capacity(4 + 64 + data_tail + 32 + padded_len(signature.len()));
    out.extend_from_slice(&selector());
    append_word(&mut out, 64);
    append_word(&mut out, 64 + data_tail);
    append_bytes(&mut out, data);
    append_bytes(&mut out, signature);
    out
}

/// First four bytes of the keccak-256 of the function signature.
fn selector() -> [u8; 4] {
    let hash = keccak256(IS_VALID_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

fn append_word(out: &mut Vec<u8>, value: usize) {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    out.extend_from_slice(&word);
}

fn append_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    append_word(out, bytes.len());
    out.extend_from_slice(bytes);
    out.resize(out.len() + padded_len(bytes.len()) - bytes.len(), 0);
}

/// Extract the 4-byte marker from an `eth_call` result.
///
/// A `bytes4` return ABI-encodes as a right-padded 32-byte word; only the
/// leading four bytes matter.
fn decode_magic_value(result: &str) -> Result<MagicValue, WalletError> {
    let body = result.strip_prefix("0x").unwrap_or(result);
    let bytes =
        hex::decode(body).map_err(|e| WalletError::MalformedResponse(e.to_string()))?;

    if bytes.len() < 4 {
        return Err(WalletError::MalformedResponse(format!(
            "return value is {} bytes, need at least 4",
            bytes.len()
        )));
    }

    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}
