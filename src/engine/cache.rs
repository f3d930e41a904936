//! Decision cache with TTL expiration

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use blake3::Hasher;

use super::decision::Decision;
use crate::address::Address;
use crate::types::{Permission, Principal};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache
    pub capacity: usize,

    /// Time-to-live for cached decisions
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Duration::from_secs(60),
        }
    }
}

/// Cache key type (BLAKE3 hash)
type CacheKey = [u8; 32];

/// Cached entry with TTL, stamped with the epoch it was computed under
#[derive(Clone)]
struct CachedEntry {
    decision: Decision,
    cached_at: Instant,
    epoch: u64,
}

impl CachedEntry {
    fn new(decision: Decision, epoch: u64) -> Self {
        Self {
            decision,
            cached_at: Instant::now(),
            epoch,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Statistics about cache performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Number of expired entries encountered
    pub expirations: usize,
    /// Total number of entries in cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory decision cache
///
/// Keys hash the principal's sorted role names, the address, and the
/// permission: two principals holding the same roles share cached outcomes,
/// since the decision depends only on roles, never on identity.
///
/// Every [`clear`](Self::clear) advances an epoch counter. A decision is
/// stored together with the epoch observed before it was computed, and
/// entries from a superseded epoch are never served, so an invalidation
/// racing an in-flight evaluation cannot resurrect a stale decision.
pub struct DecisionCache {
    entries: DashMap<CacheKey, CachedEntry>,
    epoch: AtomicU64,
    config: CacheConfig,
    stats: DashMap<&'static str, usize>,
}

impl DecisionCache {
    /// Create a new decision cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            epoch: AtomicU64::new(0),
            config,
            stats: DashMap::new(),
        }
    }

    /// The current invalidation epoch
    ///
    /// Sample before computing a decision and pass the sampled value to
    /// [`put`](Self::put).
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Get a cached decision
    pub fn get(
        &self,
        principal: &Principal,
        address: &Address,
        permission: Permission,
    ) -> Option<Decision> {
        let key = Self::compute_key(principal, address, permission);
        let current = self.epoch.load(Ordering::Acquire);

        if let Some(entry) = self.entries.get(&key) {
            if entry.epoch != current {
                // computed before the last invalidation, discard
                drop(entry);
                self.entries.remove(&key);
            } else if entry.is_expired(self.config.ttl) {
                drop(entry);
                self.entries.remove(&key);
                self.increment_stat("expirations");
                return None;
            } else {
                self.increment_stat("hits");
                return Some(entry.decision.clone());
            }
        }

        self.increment_stat("misses");
        None
    }

    /// Store a decision in the cache
    ///
    /// `epoch` is the value of [`epoch`](Self::epoch) sampled before the
    /// decision was computed; a decision from a superseded epoch is dropped.
    pub fn put(
        &self,
        principal: &Principal,
        address: &Address,
        permission: Permission,
        decision: Decision,
        epoch: u64,
    ) {
        if epoch != self.epoch.load(Ordering::Acquire) {
            return;
        }

        if self.entries.len() >= self.config.capacity {
            self.evict_oldest();
        }

        let key = Self::compute_key(principal, address, permission);
        self.entries.insert(key, CachedEntry::new(decision, epoch));
    }

    /// Clear the entire cache, advancing the invalidation epoch
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.entries.len(),
        }
    }

    fn compute_key(principal: &Principal, address: &Address, permission: Permission) -> CacheKey {
        let mut names: Vec<&str> = principal.roles.iter().map(String::as_str).collect();
        names.sort_unstable();

        let mut hasher = Hasher::new();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"|");
        hasher.update(address.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(permission.as_str().as_bytes());

        *hasher.finalize().as_bytes()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.cached_at)
            .map(|entry| *entry.key());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}
