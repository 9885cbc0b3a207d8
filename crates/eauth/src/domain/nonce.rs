//! # Nonce Token Derivation
//!
//! Challenge tokens are derived with a keyed one-way function so they are
//! unguessable without server cooperation: HMAC-SHA256 over
//! `identity ‖ fresh random salt`, keyed by a process-wide secret.
//!
//! ## Security Notes
//!
//! - The secret is generated from the OS RNG once at startup, never
//!   persisted, and zeroized on drop. A restart invalidates all pending
//!   challenges, which is acceptable.
//! - The salt makes tokens unique per issuance even for the same identity.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Process-wide secret key for token derivation.
pub struct ChallengeSecret([u8; 32]);

impl ChallengeSecret {
    /// Generate a fresh secret from the OS RNG.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Construct from fixed key material. Intended for tests that need
    /// deterministic stores; production callers should use [`generate`].
    ///
    /// [`generate`]: Self::generate
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self(key)
    }

    /// Derive a fresh 64-character hex token for `identity`.
    pub fn derive_token(&self, identity: &str) -> String {
        let salt = Uuid::new_v4();

        let mut mac = HmacSha256::new_from_slice(&self.0)
            .expect("HMAC can take key of any size");
        mac.update(identity.as_bytes());
        mac.update(salt.to_string().as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }
}

impl Drop for ChallengeSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
