//! Protocol-facing enforcement of authorization decisions
//!
//! The adapter sits between the protocol engine and the routing path. A
//! denied send is settled with a rejected disposition on the in-flight
//! delivery, so the sending peer observes the denial synchronously instead
//! of a timeout or a severed link. The adapter itself holds no per-delivery
//! state: if the connection drops before settlement, nothing is left behind.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::address::Address;
use crate::engine::{AuthorizationEngine, Decision};
use crate::error::{Result, SecurityError};
use crate::types::{Permission, Principal};

/// Handle identifying one in-flight delivery within the protocol engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryTag(pub String);

impl DeliveryTag {
    /// Create a delivery tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl fmt::Display for DeliveryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement primitives exposed by the protocol engine
///
/// Owned by the protocol layer, consumed here. `settle_rejected` is the only
/// primitive the adapter invokes itself; `settle_accepted` belongs to the
/// protocol layer's normal delivery lifecycle after routing.
#[async_trait]
pub trait DeliverySettler: Send + Sync {
    /// Settle a delivery with an accepted disposition
    async fn settle_accepted(&self, delivery: &DeliveryTag) -> Result<()>;

    /// Settle a delivery with a rejected disposition
    async fn settle_rejected(&self, delivery: &DeliveryTag) -> Result<()>;
}

/// Downstream routing/storage path for allowed sends
#[async_trait]
pub trait MessageRouter: Send + Sync {
    /// Forward a payload to the routing path for an address
    async fn route(&self, address: &Address, payload: Vec<u8>) -> Result<()>;
}

/// Context of one guarded send attempt
#[derive(Debug, Clone)]
pub struct SendContext {
    /// The authenticated sender
    pub principal: Principal,

    /// Target address of the delivery
    pub address: Address,

    /// Handle of the in-flight delivery
    pub delivery: DeliveryTag,

    /// Message payload
    pub payload: Vec<u8>,
}

/// Terminal state of a guarded send attempt
///
/// One attempt moves `PENDING -> ROUTED` on allow or `PENDING -> REJECTED`
/// on deny. Denial is deterministic for fixed bindings, so there is no
/// retry path at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendDisposition {
    /// Authorization allowed; the payload entered the routing path
    Routed,
    /// Authorization denied; a rejected disposition was settled
    Rejected,
}

/// Wraps guarded protocol operations with authorization checks
pub struct EnforcementAdapter {
    engine: Arc<AuthorizationEngine>,
    settler: Arc<dyn DeliverySettler>,
    router: Arc<dyn MessageRouter>,
}

impl EnforcementAdapter {
    /// Create an adapter over the engine and the protocol collaborators
    pub fn new(
        engine: Arc<AuthorizationEngine>,
        settler: Arc<dyn DeliverySettler>,
        router: Arc<dyn MessageRouter>,
    ) -> Self {
        Self {
            engine,
            settler,
            router,
        }
    }

    /// Guard one send attempt
    ///
    /// On allow the payload is forwarded into the routing path and the
    /// eventual accepted settlement stays the protocol layer's concern. On
    /// deny the delivery is settled rejected before this call returns, and
    /// the payload never reaches the router.
    ///
    /// # Errors
    ///
    /// [`SecurityError::SettlementFault`] when the protocol engine fails to
    /// apply the rejected disposition, [`SecurityError::RoutingFault`] when
    /// routing an allowed send fails. Denial itself is not an error.
    pub async fn guard_send(&self, ctx: SendContext) -> Result<SendDisposition> {
        let decision = self
            .engine
            .check(&ctx.principal, &ctx.address, Permission::Send)
            .await?;

        if decision.allowed {
            self.router
                .route(&ctx.address, ctx.payload)
                .await
                .map_err(|err| SecurityError::RoutingFault(err.to_string()))?;
            return Ok(SendDisposition::Routed);
        }

        debug!(
            principal = %ctx.principal.id,
            address = %ctx.address,
            delivery = %ctx.delivery,
            "send denied, settling rejected disposition"
        );

        self.settler
            .settle_rejected(&ctx.delivery)
            .await
            .map_err(|err| {
                warn!(
                    delivery = %ctx.delivery,
                    error = %err,
                    "failed to settle rejected disposition"
                );
                SecurityError::SettlementFault(err.to_string())
            })?;

        Ok(SendDisposition::Rejected)
    }

    /// Guard a non-delivery operation (queue management, browse, consume)
    ///
    /// Pure allow/deny; mapping a deny onto the operation's wire outcome is
    /// the protocol layer's concern.
    pub async fn authorize(
        &self,
        principal: &Principal,
        address: &Address,
        permission: Permission,
    ) -> Result<Decision> {
        self.engine.check(principal, address, permission).await
    }
}
