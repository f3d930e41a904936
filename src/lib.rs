//! # CorvoMQ Security
//!
//! Authorization core for the CorvoMQ message broker.
//!
//! ## Features
//!
//! - **Hierarchical pattern repository** binding address patterns (`orders.#`,
//!   `orders.*.eu`, exact addresses) to role sets, resolved as an additive
//!   union across every matching pattern
//! - **Authorization engine** answering allow/deny for the closed set of
//!   broker operations (send, consume, queue lifecycle, manage, browse),
//!   fail-closed by default with an explicit default-allow switch
//! - **Enforcement adapter** settling denied sends with a rejected delivery
//!   disposition, keeping the link healthy instead of severing it
//! - **Decision caching** with TTL expiration, invalidated on every
//!   administrative binding change
//!
//! ## Example
//!
//! ```
//! use corvomq_security::{
//!     Address, AuthorizationEngine, Permission, Principal, Role,
//! };
//! use std::collections::HashSet;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AuthorizationEngine::with_defaults();
//!
//!     let mut roles = HashSet::new();
//!     roles.insert(Role::new("producers").with_send(true));
//!     engine.add_match("orders.#", roles).await?;
//!
//!     let principal = Principal::new("alice").with_role("producers");
//!     let address = Address::new("orders.widgets")?;
//!
//!     let decision = engine.check(&principal, &address, Permission::Send).await?;
//!     assert!(decision.allowed);
//!
//!     let decision = engine.check(&principal, &address, Permission::Consume).await?;
//!     assert!(!decision.allowed);
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod enforcement;
pub mod engine;
pub mod error;
pub mod repository;
pub mod types;

// Re-export commonly used types
pub use address::{Address, AddressError, AddressPattern};
pub use enforcement::{
    DeliverySettler, DeliveryTag, EnforcementAdapter, MessageRouter, SendContext, SendDisposition,
};
pub use engine::{
    AuthorizationEngine, CacheConfig, CacheStats, Decision, DecisionReason, DefaultAccess,
    EngineConfig,
};
pub use error::{Result, SecurityError};
pub use repository::{ResolutionStats, SecurityRepository};
pub use types::{Permission, Principal, Role};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
