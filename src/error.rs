//! Error types for the broker security core

use thiserror::Error;

/// Security core errors
///
/// Authorization denial is deliberately absent from this taxonomy: a denied
/// check is a first-class [`Decision`](crate::engine::Decision) outcome, not
/// a fault.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Malformed address or pattern string
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Strict insertion attempted against an already-bound pattern
    #[error("Binding conflict: {0}")]
    BindingConflict(String),

    /// Removal of a binding that does not exist
    #[error("Binding not found: {0}")]
    BindingNotFound(String),

    /// The protocol engine failed to apply a rejected disposition
    #[error("Settlement fault: {0}")]
    SettlementFault(String),

    /// Downstream routing failed after an allowed send
    #[error("Routing fault: {0}")]
    RoutingFault(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::address::AddressError> for SecurityError {
    fn from(err: crate::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

/// Result type for security operations
pub type Result<T> = std::result::Result<T, SecurityError>;
