//! Authorization engine
//!
//! Answers allow/deny for (principal, address, permission) by resolving the
//! effective role set through the [`SecurityRepository`] and checking the
//! permission flag on each held role. Fails closed: no matching pattern and
//! no assigned role both deny, unless the explicit default-allow switch is
//! set for the no-pattern case.

pub mod cache;
pub mod decision;

pub use cache::{CacheConfig, CacheStats, DecisionCache};
pub use decision::{Decision, DecisionReason};

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::Address;
use crate::error::Result;
use crate::repository::SecurityRepository;
use crate::types::{Permission, Principal, Role};

/// Access policy for addresses no pattern matches
///
/// `Deny` is the fail-closed default. `Allow` opts a broker into fully open
/// behavior for unbound addresses and must be configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultAccess {
    /// Unbound addresses deny every operation
    Deny,
    /// Unbound addresses allow every operation
    Allow,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable decision caching
    pub enable_cache: bool,

    /// Cache configuration
    pub cache_config: CacheConfig,

    /// Policy applied when no pattern matches the address
    pub default_access: DefaultAccess,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_config: CacheConfig::default(),
            default_access: DefaultAccess::Deny,
        }
    }
}

/// The broker authorization engine
///
/// Shared across connections; every method is safe for unrestricted
/// concurrent use. Administrative writes go through the engine so the
/// decision cache is invalidated together with the repository memo.
pub struct AuthorizationEngine {
    /// Pattern-to-roles bindings
    repository: Arc<SecurityRepository>,

    /// Decision cache, present when enabled
    cache: Option<DecisionCache>,

    /// Engine configuration
    config: EngineConfig,
}

impl AuthorizationEngine {
    /// Create an engine over an existing repository
    pub fn new(config: EngineConfig, repository: Arc<SecurityRepository>) -> Self {
        let cache = config
            .enable_cache
            .then(|| DecisionCache::new(config.cache_config.clone()));

        info!(
            cache = config.enable_cache,
            default_access = ?config.default_access,
            "authorization engine initialized"
        );

        Self {
            repository,
            cache,
            config,
        }
    }

    /// Create an engine with default configuration and a fresh repository
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), Arc::new(SecurityRepository::new()))
    }

    /// The underlying repository, for read-only inspection
    ///
    /// Mutations must go through the engine's `add_match`/`remove_match`
    /// passthroughs so the decision cache is invalidated alongside the
    /// repository memo; the reference handed out here cannot be cloned into
    /// an owning handle.
    pub fn repository(&self) -> &SecurityRepository {
        &self.repository
    }

    /// Check whether a principal may perform an operation on an address
    ///
    /// Allow iff at least one role that is both bound to the address and
    /// held by the principal grants the permission. A deny is a normal
    /// outcome; `Err` is reserved for faults.
    pub async fn check(
        &self,
        principal: &Principal,
        address: &Address,
        permission: Permission,
    ) -> Result<Decision> {
        debug!(
            principal = %principal.id,
            address = %address,
            permission = %permission,
            "authorization check"
        );

        // sampled before evaluation: an invalidation landing while the
        // repository is consulted advances the epoch and voids this decision
        // for caching purposes
        let mut cache_epoch = None;
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(principal, address, permission) {
                debug!(decision = cached.allowed, "decision cache hit");
                return Ok(cached);
            }
            cache_epoch = Some(cache.epoch());
        }

        let decision = self.evaluate(principal, address, permission).await;

        debug!(
            principal = %principal.id,
            address = %address,
            permission = %permission,
            allowed = decision.allowed,
            "authorization decision"
        );

        if let Some((cache, epoch)) = self.cache.as_ref().zip(cache_epoch) {
            cache.put(principal, address, permission, decision.clone(), epoch);
        }

        Ok(decision)
    }

    async fn evaluate(
        &self,
        principal: &Principal,
        address: &Address,
        permission: Permission,
    ) -> Decision {
        // a principal without roles is denied regardless of default access
        if principal.roles.is_empty() {
            return Decision::deny(permission, address, DecisionReason::NoRolesAssigned, vec![]);
        }

        let bound = self.repository.get_match(address).await;

        if bound.is_empty() {
            return match self.config.default_access {
                DefaultAccess::Allow => {
                    Decision::allow(permission, address, DecisionReason::DefaultAccess, vec![])
                }
                DefaultAccess::Deny => Decision::deny(
                    permission,
                    address,
                    DecisionReason::NoMatchingBindings,
                    vec![],
                ),
            };
        }

        let held: Vec<&Role> = bound
            .iter()
            .filter(|role| principal.holds(&role.name))
            .collect();
        let matched_roles: Vec<String> = held.iter().map(|role| role.name.clone()).collect();

        match held.iter().find(|role| role.grants(permission)) {
            Some(role) => Decision::allow(
                permission,
                address,
                DecisionReason::Granted {
                    role: role.name.clone(),
                },
                matched_roles,
            ),
            None => Decision::deny(
                permission,
                address,
                DecisionReason::PermissionMissing,
                matched_roles,
            ),
        }
    }

    /// Bind roles to a pattern (merging), invalidating cached decisions
    pub async fn add_match(&self, pattern: &str, roles: HashSet<Role>) -> Result<()> {
        self.repository.add_match(pattern, roles).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Bind roles to a pattern (strict), invalidating cached decisions
    pub async fn add_match_strict(&self, pattern: &str, roles: HashSet<Role>) -> Result<()> {
        self.repository.add_match_strict(pattern, roles).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Remove a pattern binding, invalidating cached decisions
    pub async fn remove_match(&self, pattern: &str) -> Result<()> {
        self.repository.remove_match(pattern).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Drop every cached decision
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            debug!("decision cache invalidated");
        }
    }

    /// Decision cache statistics, when caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }
}
