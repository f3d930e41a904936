//! End-to-end enforcement scenarios against a fake protocol engine
//!
//! Drives guarded sends through the full stack (enforcement adapter ->
//! authorization engine -> pattern repository) and asserts the wire-visible
//! outcome: a denied send settles a rejected disposition within the caller's
//! wait timeout and never reaches routing, an allowed send routes and is
//! then accepted by the protocol layer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::timeout;

use corvomq_security::{
    Address, AuthorizationEngine, DeliverySettler, DeliveryTag, EnforcementAdapter, MessageRouter,
    Permission, Principal, Result, Role, SendContext, SendDisposition,
};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Disposition observed by the sending peer
#[derive(Debug, Clone, PartialEq, Eq)]
enum Disposition {
    Accepted(DeliveryTag),
    Rejected(DeliveryTag),
}

/// Fake protocol engine: records settlements and routed messages
#[derive(Default)]
struct FakeProtocolEngine {
    dispositions: Mutex<Vec<Disposition>>,
    routed: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl DeliverySettler for FakeProtocolEngine {
    async fn settle_accepted(&self, delivery: &DeliveryTag) -> Result<()> {
        self.dispositions
            .lock()
            .await
            .push(Disposition::Accepted(delivery.clone()));
        Ok(())
    }

    async fn settle_rejected(&self, delivery: &DeliveryTag) -> Result<()> {
        self.dispositions
            .lock()
            .await
            .push(Disposition::Rejected(delivery.clone()));
        Ok(())
    }
}

#[async_trait]
impl MessageRouter for FakeProtocolEngine {
    async fn route(&self, address: &Address, payload: Vec<u8>) -> Result<()> {
        self.routed
            .lock()
            .await
            .push((address.as_str().to_string(), payload));
        Ok(())
    }
}

struct Harness {
    engine: Arc<AuthorizationEngine>,
    protocol: Arc<FakeProtocolEngine>,
    adapter: EnforcementAdapter,
}

impl Harness {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let engine = Arc::new(AuthorizationEngine::with_defaults());
        let protocol = Arc::new(FakeProtocolEngine::default());
        let settler: Arc<dyn DeliverySettler> = protocol.clone();
        let router: Arc<dyn MessageRouter> = protocol.clone();
        let adapter = EnforcementAdapter::new(Arc::clone(&engine), settler, router);

        Self {
            engine,
            protocol,
            adapter,
        }
    }

    async fn bind(&self, pattern: &str, role: Role) {
        let mut roles = HashSet::new();
        roles.insert(role);
        self.engine.add_match(pattern, roles).await.unwrap();
    }

    /// One guarded send, with the protocol layer accepting after routing
    async fn send(&self, principal: Principal, address: &str, tag: &str) -> SendDisposition {
        let delivery = DeliveryTag::new(tag);
        let ctx = SendContext {
            principal,
            address: Address::new(address).unwrap(),
            delivery: delivery.clone(),
            payload: b"Test-Message".to_vec(),
        };

        // the sender must observe an outcome within its wait timeout
        let disposition = timeout(SEND_TIMEOUT, self.adapter.guard_send(ctx))
            .await
            .expect("send outcome not observed within timeout")
            .unwrap();

        if disposition == SendDisposition::Routed {
            // accepted settlement is the protocol layer's concern
            self.protocol.settle_accepted(&delivery).await.unwrap();
        }
        disposition
    }
}

#[tokio::test]
async fn denied_send_is_rejected_and_never_routed() {
    let harness = Harness::new();
    harness
        .bind("orders.#", Role::all("none").with_send(false))
        .await;

    let principal = Principal::new("foo").with_role("none");
    let disposition = harness.send(principal, "orders.widgets", "msg1").await;

    assert_eq!(disposition, SendDisposition::Rejected);
    assert_eq!(
        harness.protocol.dispositions.lock().await.as_slice(),
        &[Disposition::Rejected(DeliveryTag::new("msg1"))]
    );
    assert!(harness.protocol.routed.lock().await.is_empty());
}

#[tokio::test]
async fn allowed_send_is_routed_and_accepted() {
    let harness = Harness::new();
    harness
        .bind("orders.#", Role::all("none").with_send(true))
        .await;

    let principal = Principal::new("foo").with_role("none");
    let disposition = harness.send(principal, "orders.widgets", "msg1").await;

    assert_eq!(disposition, SendDisposition::Routed);
    assert_eq!(
        harness.protocol.dispositions.lock().await.as_slice(),
        &[Disposition::Accepted(DeliveryTag::new("msg1"))]
    );

    let routed = harness.protocol.routed.lock().await;
    assert_eq!(routed.len(), 1);
    assert_eq!(routed[0].0, "orders.widgets");
    assert_eq!(routed[0].1, b"Test-Message".to_vec());
}

#[tokio::test]
async fn principal_without_roles_is_denied_everywhere() {
    let harness = Harness::new();
    harness.bind("orders.#", Role::all("admins")).await;

    let principal = Principal::new("anonymous");
    for address in ["orders.widgets", "invoices.q1", "a.b.c.d"] {
        let decision = harness
            .adapter
            .authorize(
                &principal,
                &Address::new(address).unwrap(),
                Permission::Consume,
            )
            .await
            .unwrap();
        assert!(!decision.allowed, "consume on {} must be denied", address);
    }

    // a denied sender observes the rejection on the wire too
    let disposition = harness
        .send(Principal::new("anonymous"), "orders.widgets", "msg1")
        .await;
    assert_eq!(disposition, SendDisposition::Rejected);
}

#[tokio::test]
async fn overlapping_patterns_grant_the_union() {
    let harness = Harness::new();
    harness
        .bind("a.#", Role::new("managers").with_manage(true))
        .await;
    harness
        .bind("a.b.#", Role::new("senders").with_send(true))
        .await;

    let target = Address::new("a.b.c").unwrap();

    let both = Principal::new("p1")
        .with_role("managers")
        .with_role("senders");
    assert!(harness
        .adapter
        .authorize(&both, &target, Permission::Manage)
        .await
        .unwrap()
        .allowed);
    assert_eq!(
        harness.send(both, "a.b.c", "msg1").await,
        SendDisposition::Routed
    );

    let only_manager = Principal::new("p2").with_role("managers");
    assert!(harness
        .adapter
        .authorize(&only_manager, &target, Permission::Manage)
        .await
        .unwrap()
        .allowed);
    assert_eq!(
        harness.send(only_manager, "a.b.c", "msg2").await,
        SendDisposition::Rejected
    );
}

#[tokio::test]
async fn one_denial_does_not_affect_other_senders() {
    let harness = Harness::new();
    harness
        .bind("orders.#", Role::all("none").with_send(false))
        .await;
    harness
        .bind("orders.#", Role::new("producers").with_send(true))
        .await;

    let denied = Principal::new("foo").with_role("none");
    let allowed = Principal::new("bar").with_role("producers");

    assert_eq!(
        harness.send(denied, "orders.widgets", "msg1").await,
        SendDisposition::Rejected
    );
    assert_eq!(
        harness.send(allowed, "orders.widgets", "msg2").await,
        SendDisposition::Routed
    );

    let routed = harness.protocol.routed.lock().await;
    assert_eq!(routed.len(), 1);
}

#[tokio::test]
async fn binding_removal_restores_rejection() {
    let harness = Harness::new();
    harness
        .bind("orders.#", Role::new("producers").with_send(true))
        .await;

    let principal = Principal::new("alice").with_role("producers");
    assert_eq!(
        harness.send(principal.clone(), "orders.widgets", "msg1").await,
        SendDisposition::Routed
    );

    harness.engine.remove_match("orders.#").await.unwrap();

    assert_eq!(
        harness.send(principal, "orders.widgets", "msg2").await,
        SendDisposition::Rejected
    );
}
