//! Authorization decision types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::types::Permission;

/// Outcome of one authorization check
///
/// Decisions are ephemeral: they describe a single (principal, address,
/// permission) evaluation and are never persisted. A deny is an expected
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision ID
    pub id: String,

    /// Whether the operation is allowed
    pub allowed: bool,

    /// The permission that was evaluated
    pub permission: Permission,

    /// The concrete address the check targeted
    pub address: String,

    /// Why the decision came out this way
    pub reason: DecisionReason,

    /// Names of the principal's roles that were bound to the address
    pub matched_roles: Vec<String>,

    /// Decision timestamp (milliseconds since epoch)
    pub timestamp: u64,
}

impl Decision {
    /// Create an allow decision
    pub fn allow(
        permission: Permission,
        address: &Address,
        reason: DecisionReason,
        matched_roles: Vec<String>,
    ) -> Self {
        Self::new(true, permission, address, reason, matched_roles)
    }

    /// Create a deny decision
    pub fn deny(
        permission: Permission,
        address: &Address,
        reason: DecisionReason,
        matched_roles: Vec<String>,
    ) -> Self {
        Self::new(false, permission, address, reason, matched_roles)
    }

    fn new(
        allowed: bool,
        permission: Permission,
        address: &Address,
        reason: DecisionReason,
        matched_roles: Vec<String>,
    ) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            allowed,
            permission,
            address: address.as_str().to_string(),
            reason,
            matched_roles,
            timestamp,
        }
    }
}

/// Reason for an authorization decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// A held role bound to the address grants the permission
    Granted {
        /// Name of the granting role
        role: String,
    },

    /// Roles are bound and held, but none grants the permission
    PermissionMissing,

    /// No pattern matches the address
    NoMatchingBindings,

    /// The principal has no assigned roles
    NoRolesAssigned,

    /// The engine-wide default access policy decided
    DefaultAccess,
}
