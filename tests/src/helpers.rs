//! Client-side test helpers: key generation, wallet-style signing, and a
//! scriptable ledger gateway.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, SigningKey};

use eauth::domain::ecdsa::address_from_pubkey;
use eauth::{address_to_hex, MagicValue, WalletError, WalletGateway};

/// Generate a fresh client key pair.
pub fn generate_key() -> SigningKey {
    SigningKey::random(&mut rand::thread_rng())
}

/// The lowercase address controlled by `key`.
pub fn address_hex(key: &SigningKey) -> String {
    address_to_hex(&address_from_pubkey(key.verifying_key()))
}

/// Sign a 32-byte digest the way a wallet does: low-S normalized, 65-byte
/// `r ‖ s ‖ v` hex with v in {27, 28}.
pub fn sign_digest_hex(key: &SigningKey, digest: &[u8; 32]) -> String {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .expect("signing failed");

    // Normalizing S flips the parity of the recovered point
    let (sig, recid) = match sig.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::from_byte(recid.to_byte() ^ 1).expect("recovery id parity flip"),
        ),
        None => (sig, recid),
    };

    let mut raw = [0u8; 65];
    raw[..64].copy_from_slice(&sig.to_bytes());
    raw[64] = recid.to_byte() + 27;
    format!("0x{}", hex::encode(raw))
}

/// Ledger gateway answering from a script of magic values.
///
/// Each call pops the next scripted value; an exhausted script answers like
/// an unreachable node.
pub struct ScriptedWalletGateway {
    script: Mutex<VecDeque<MagicValue>>,
}

impl ScriptedWalletGateway {
    pub fn new(responses: impl IntoIterator<Item = MagicValue>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
        }
    }

    /// A gateway whose node is never reachable.
    pub fn unreachable() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl WalletGateway for ScriptedWalletGateway {
    async fn is_valid_signature(
        &self,
        _contract: &str,
        _data: &[u8],
        _signature: &[u8],
    ) -> Result<MagicValue, WalletError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| WalletError::Transport("connection refused".to_string()))
    }
}
