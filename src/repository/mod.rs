//! Pattern repository: hierarchical bindings from address patterns to roles
//!
//! The repository is a shared, read-mostly service. Resolution takes a
//! lightweight shared lock and is memoized per concrete address; writes are
//! administrative, take the exclusive lock, and invalidate the whole memo
//! (correctness over precision, mutations are rare relative to lookups).

mod trie;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::address::{Address, AddressPattern};
use crate::error::{Result, SecurityError};
use crate::types::Role;
use trie::PatternTrie;

/// Statistics for the per-address resolution memo
#[derive(Debug, Clone, Default)]
pub struct ResolutionStats {
    /// Number of memo hits
    pub hits: usize,
    /// Number of memo misses
    pub misses: usize,
    /// Number of memoized addresses
    pub entries: usize,
}

impl ResolutionStats {
    /// Calculates the memo hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Hierarchical repository of pattern-to-roles bindings
///
/// Multiple patterns may match one address; [`get_match`](Self::get_match)
/// returns the additive union of every matching binding. An address no
/// pattern matches resolves to the empty set.
pub struct SecurityRepository {
    /// Bound patterns, exclusive-write / shared-read
    bindings: RwLock<PatternTrie>,

    /// Memoized resolutions keyed by concrete address string
    resolution_memo: DashMap<String, Arc<HashSet<Role>>>,

    /// Memo statistics
    stats: DashMap<&'static str, usize>,
}

impl SecurityRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(PatternTrie::new()),
            resolution_memo: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Binds roles to a pattern, merging with any existing binding
    ///
    /// Re-binding an identical role set is a no-op for resolution
    /// (idempotent merge).
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::InvalidAddress`] when the pattern does not
    /// parse.
    pub async fn add_match(&self, pattern: &str, roles: HashSet<Role>) -> Result<()> {
        let parsed = AddressPattern::new(pattern)?;

        let mut bindings = self.bindings.write().await;
        let merged = bindings.bind(&parsed, roles);
        self.invalidate_memo();
        drop(bindings);

        info!(pattern = %parsed, merged, "security binding added");
        Ok(())
    }

    /// Binds roles to a pattern, failing if the exact pattern is already bound
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::BindingConflict`] when the pattern already
    /// has bound roles, or [`SecurityError::InvalidAddress`] when it does
    /// not parse.
    pub async fn add_match_strict(&self, pattern: &str, roles: HashSet<Role>) -> Result<()> {
        let parsed = AddressPattern::new(pattern)?;

        let mut bindings = self.bindings.write().await;
        if bindings.binding(&parsed).is_some() {
            return Err(SecurityError::BindingConflict(parsed.as_str().to_string()));
        }
        bindings.bind(&parsed, roles);
        self.invalidate_memo();
        drop(bindings);

        info!(pattern = %parsed, "security binding added (strict)");
        Ok(())
    }

    /// Removes the binding for a pattern
    ///
    /// Removal of an absent binding is an error here, not a no-op: the
    /// administrative caller is told the pattern was never bound.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::BindingNotFound`] when the pattern has no
    /// binding, or [`SecurityError::InvalidAddress`] when it does not parse.
    pub async fn remove_match(&self, pattern: &str) -> Result<()> {
        let parsed = AddressPattern::new(pattern)?;

        let mut bindings = self.bindings.write().await;
        if bindings.remove(&parsed).is_none() {
            return Err(SecurityError::BindingNotFound(parsed.as_str().to_string()));
        }
        self.invalidate_memo();
        drop(bindings);

        info!(pattern = %parsed, "security binding removed");
        Ok(())
    }

    /// Resolves the effective role set for a concrete address
    ///
    /// Deterministic for fixed bindings: the union of roles across every
    /// matching pattern, memoized per address string.
    pub async fn get_match(&self, address: &Address) -> Arc<HashSet<Role>> {
        if let Some(memoized) = self.resolution_memo.get(address.as_str()) {
            self.increment_stat("hits");
            debug!(address = %address, "resolution memo hit");
            return Arc::clone(&memoized);
        }
        self.increment_stat("misses");

        let bindings = self.bindings.read().await;
        let resolved = Arc::new(bindings.resolve(address));
        // memoize while still holding the shared lock: writers invalidate
        // under the exclusive lock, so a resolution computed against the old
        // bindings can never be inserted after the invalidation that
        // superseded it
        self.resolution_memo
            .insert(address.as_str().to_string(), Arc::clone(&resolved));
        drop(bindings);

        debug!(address = %address, roles = resolved.len(), "resolved effective role set");
        resolved
    }

    /// Roles bound to one exact pattern, without wildcard resolution
    pub async fn binding(&self, pattern: &str) -> Result<Option<HashSet<Role>>> {
        let parsed = AddressPattern::new(pattern)?;
        let bindings = self.bindings.read().await;
        Ok(bindings.binding(&parsed).cloned())
    }

    /// All bindings as (pattern, roles) pairs, for administrative inspection
    pub async fn bindings(&self) -> Vec<(String, HashSet<Role>)> {
        self.bindings.read().await.bindings()
    }

    /// Number of bound patterns
    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// Whether no patterns are bound
    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }

    /// Drops every binding and the resolution memo
    pub async fn clear(&self) {
        let mut bindings = self.bindings.write().await;
        bindings.clear();
        self.invalidate_memo();
        drop(bindings);

        info!("security repository cleared");
    }

    /// Returns memo statistics
    pub fn stats(&self) -> ResolutionStats {
        ResolutionStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            entries: self.resolution_memo.len(),
        }
    }

    fn invalidate_memo(&self) {
        self.resolution_memo.clear();
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

impl Default for SecurityRepository {
    fn default() -> Self {
        Self::new()
    }
}
