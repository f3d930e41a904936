//! Core security types: roles, permissions, principals

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Operation kinds controlled by the broker security layer
///
/// The set is closed and there is no permission hierarchy: `Manage` does not
/// imply `Send`, every permission is checked against its own role flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Send a message to an address
    Send,
    /// Consume messages from a queue
    Consume,
    /// Create a durable queue
    CreateDurableQueue,
    /// Delete a durable queue
    DeleteDurableQueue,
    /// Create a non-durable queue
    CreateNonDurableQueue,
    /// Delete a non-durable queue
    DeleteNonDurableQueue,
    /// Perform management operations
    Manage,
    /// Browse a queue without consuming
    Browse,
}

impl Permission {
    /// All permission kinds, in role-flag order
    pub const ALL: [Permission; 8] = [
        Permission::Send,
        Permission::Consume,
        Permission::CreateDurableQueue,
        Permission::DeleteDurableQueue,
        Permission::CreateNonDurableQueue,
        Permission::DeleteNonDurableQueue,
        Permission::Manage,
        Permission::Browse,
    ];

    /// Wire-stable name of this permission
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Send => "SEND",
            Permission::Consume => "CONSUME",
            Permission::CreateDurableQueue => "CREATE_DURABLE_QUEUE",
            Permission::DeleteDurableQueue => "DELETE_DURABLE_QUEUE",
            Permission::CreateNonDurableQueue => "CREATE_NON_DURABLE_QUEUE",
            Permission::DeleteNonDurableQueue => "DELETE_NON_DURABLE_QUEUE",
            Permission::Manage => "MANAGE",
            Permission::Browse => "BROWSE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named bundle of permission flags
///
/// Roles are immutable value objects once bound into a repository; each
/// permission has its own named flag rather than a positional vector, so
/// extending the set cannot silently shift meanings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    /// Role name, unique within one repository
    pub name: String,

    /// May send messages
    pub send: bool,

    /// May consume messages
    pub consume: bool,

    /// May create durable queues
    pub create_durable_queue: bool,

    /// May delete durable queues
    pub delete_durable_queue: bool,

    /// May create non-durable queues
    pub create_non_durable_queue: bool,

    /// May delete non-durable queues
    pub delete_non_durable_queue: bool,

    /// May perform management operations
    pub manage: bool,

    /// May browse queues
    pub browse: bool,
}

impl Role {
    /// Create a role granting nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            send: false,
            consume: false,
            create_durable_queue: false,
            delete_durable_queue: false,
            create_non_durable_queue: false,
            delete_non_durable_queue: false,
            manage: false,
            browse: false,
        }
    }

    /// Create a role granting every permission
    pub fn all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            send: true,
            consume: true,
            create_durable_queue: true,
            delete_durable_queue: true,
            create_non_durable_queue: true,
            delete_non_durable_queue: true,
            manage: true,
            browse: true,
        }
    }

    /// Set the send flag
    pub fn with_send(mut self, allowed: bool) -> Self {
        self.send = allowed;
        self
    }

    /// Set the consume flag
    pub fn with_consume(mut self, allowed: bool) -> Self {
        self.consume = allowed;
        self
    }

    /// Set the create-durable-queue flag
    pub fn with_create_durable_queue(mut self, allowed: bool) -> Self {
        self.create_durable_queue = allowed;
        self
    }

    /// Set the delete-durable-queue flag
    pub fn with_delete_durable_queue(mut self, allowed: bool) -> Self {
        self.delete_durable_queue = allowed;
        self
    }

    /// Set the create-non-durable-queue flag
    pub fn with_create_non_durable_queue(mut self, allowed: bool) -> Self {
        self.create_non_durable_queue = allowed;
        self
    }

    /// Set the delete-non-durable-queue flag
    pub fn with_delete_non_durable_queue(mut self, allowed: bool) -> Self {
        self.delete_non_durable_queue = allowed;
        self
    }

    /// Set the manage flag
    pub fn with_manage(mut self, allowed: bool) -> Self {
        self.manage = allowed;
        self
    }

    /// Set the browse flag
    pub fn with_browse(mut self, allowed: bool) -> Self {
        self.browse = allowed;
        self
    }

    /// Whether this role grants the given permission
    pub fn grants(&self, permission: Permission) -> bool {
        match permission {
            Permission::Send => self.send,
            Permission::Consume => self.consume,
            Permission::CreateDurableQueue => self.create_durable_queue,
            Permission::DeleteDurableQueue => self.delete_durable_queue,
            Permission::CreateNonDurableQueue => self.create_non_durable_queue,
            Permission::DeleteNonDurableQueue => self.delete_non_durable_queue,
            Permission::Manage => self.manage,
            Permission::Browse => self.browse,
        }
    }
}

/// An authenticated identity with its assigned role names
///
/// Role assignment is resolved by the identity collaborator at
/// authentication time and stays fixed for the session; this crate never
/// validates credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (e.g. connection user name)
    pub id: String,

    /// Names of roles assigned to this principal
    #[serde(default)]
    pub roles: HashSet<String>,
}

impl Principal {
    /// Create a principal with no assigned roles
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: HashSet::new(),
        }
    }

    /// Assign a role name to the principal
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Whether the principal holds the named role
    pub fn holds(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
