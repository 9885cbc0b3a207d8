//! Pending Challenge Store.
//!
//! The only shared mutable state in the engine: a TTL-bounded map from a
//! subject key to its one live challenge value. Externally-owned accounts key
//! by lowercase address and store the token; contract wallets key by the token
//! and store the lowercase contract address.
//!
//! Concurrency: backed by a sharded concurrent map, and every consuming
//! operation is a single atomic remove, so two racing presentations of the
//! same challenge admit exactly one winner. Expiry is checked on every read;
//! the optional [`sweep_task`] only reclaims memory.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One issued, unconsumed challenge.
struct PendingChallenge {
    /// Stored value: the token (account schemes) or the contract address
    /// (wallet schemes).
    value: String,
    /// When the challenge was issued.
    issued_at: Instant,
}

impl PendingChallenge {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() > ttl
    }
}

/// Monotonic store counters.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Challenges issued (including overwrites)
    pub total_issued: AtomicU64,
    /// Challenges consumed by a successful verification
    pub total_consumed: AtomicU64,
    /// Challenges dropped after exceeding their TTL
    pub total_expired: AtomicU64,
    /// Challenges superseded by a newer issuance for the same key
    pub total_superseded: AtomicU64,
}

/// TTL-bounded challenge store.
///
/// The TTL is fixed per deployment at construction; issuing for a key that
/// already holds a live challenge silently supersedes it. An expired entry is
/// indistinguishable from an absent one on every read path.
pub struct ChallengeStore {
    entries: DashMap<String, PendingChallenge>,
    ttl: Duration,
    stats: Arc<StoreStats>,
}

impl ChallengeStore {
    /// Create a store whose challenges live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            stats: Arc::new(StoreStats::default()),
        }
    }

    /// Record a challenge for `key`, overwriting any existing entry.
    pub fn issue(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let superseded = self
            .entries
            .insert(
                key.clone(),
                PendingChallenge {
                    value: value.into(),
                    issued_at: Instant::now(),
                },
            )
            .is_some();

        self.stats.total_issued.fetch_add(1, Ordering::Relaxed);
        if superseded {
            self.stats.total_superseded.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "superseded pending challenge");
        } else {
            debug!(key = %key, "issued challenge");
        }
    }

    /// Current value for `key`, if present and not expired.
    ///
    /// Expired entries are lazily deleted on the way out.
    pub fn peek(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.drop_expired(key);
        }
        None
    }

    /// Atomically return-and-delete the value for `key`, if fresh.
    pub fn consume(&self, key: &str) -> Option<String> {
        let (_, entry) = self.entries.remove(key)?;
        if entry.is_expired(self.ttl) {
            self.stats.total_expired.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "challenge expired before consumption");
            return None;
        }

        self.stats.total_consumed.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "consumed challenge");
        Some(entry.value)
    }

    /// Atomically delete the entry for `key` only if its fresh value equals
    /// `expected`.
    ///
    /// A mismatch leaves the entry untouched so the subject can retry with a
    /// correct signature before expiry. Of any number of racing matching
    /// calls, exactly one returns `true`.
    pub fn consume_matching(&self, key: &str, expected: &str) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, entry| {
                !entry.is_expired(self.ttl) && entry.value == expected
            })
            .is_some();

        if removed {
            self.stats.total_consumed.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "consumed challenge");
        } else {
            // Reclaim the slot if the miss was an expired entry
            self.drop_expired(key);
        }
        removed
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn remove_expired(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            if entry.is_expired(self.ttl) {
                warn!(
                    key = %key,
                    age_secs = entry.issued_at.elapsed().as_secs(),
                    "removing expired challenge"
                );
                self.stats.total_expired.fetch_add(1, Ordering::Relaxed);
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Number of live (possibly expired-but-unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    fn drop_expired(&self, key: &str) {
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(self.ttl))
            .is_some()
        {
            self.stats.total_expired.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Background task that periodically sweeps expired challenges.
///
/// Purely memory hygiene: correctness never depends on it running.
pub async fn sweep_task(store: Arc<ChallengeStore>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed = removed, "swept expired challenges");
        }
    }
}
