//! Per-tenant runtime state with drain-aware teardown.
//!
//! Tenant state (issuer, verification keys, database handle) is loaded once
//! per tenant and shared read-only across concurrent requests. A guard
//! refcounts in-flight requests; eviction waits for the count to reach zero,
//! bounded by a 5-second timeout after which teardown proceeds anyway and
//! stragglers may observe a torn-down resource.

use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::TenantId;
use tokio::sync::{Notify, RwLock};

/// Bound on how long eviction waits for in-flight requests.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A tenant's local verification key.
#[derive(Debug, Clone)]
pub struct LocalKey {
    /// Key ID, when published.
    pub kid: Option<String>,
    /// PEM-encoded RSA public key.
    pub public_key_pem: String,
}

/// Read-only per-tenant runtime state.
#[derive(Clone)]
pub struct TenantState {
    /// The tenant this state belongs to.
    pub tenant_id: TenantId,
    /// Issuer URL of this tenant's OIDC endpoint.
    pub issuer: String,
    /// Locally known verification keys.
    pub local_keys: Vec<LocalKey>,
    /// Tenant-scoped database handle.
    pub pool: PgPool,
}

struct Tracked {
    state: Arc<TenantState>,
    active: Arc<ActiveRequests>,
}

struct ActiveRequests {
    count: AtomicUsize,
    drained: Notify,
}

/// Guard representing one in-flight request against a tenant.
///
/// Dereferences to the tenant state; dropping it releases the refcount and
/// wakes any pending eviction once the count reaches zero.
pub struct TenantGuard {
    state: Arc<TenantState>,
    active: Arc<ActiveRequests>,
}

impl std::ops::Deref for TenantGuard {
    type Target = TenantState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        if self.active.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.active.drained.notify_waiters();
        }
    }
}

/// Shared registry of loaded tenant states.
#[derive(Clone)]
pub struct TenantStateMap {
    inner: Arc<RwLock<HashMap<TenantId, Tracked>>>,
}

impl TenantStateMap {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert (or replace) a tenant's state.
    pub async fn insert(&self, state: TenantState) {
        let tenant_id = state.tenant_id.clone();
        let tracked = Tracked {
            state: Arc::new(state),
            active: Arc::new(ActiveRequests {
                count: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        };
        self.inner.write().await.insert(tenant_id, tracked);
    }

    /// Acquire a guard for a request against a tenant.
    pub async fn acquire(&self, tenant_id: &TenantId) -> Option<TenantGuard> {
        let map = self.inner.read().await;
        let tracked = map.get(tenant_id)?;
        tracked.active.count.fetch_add(1, Ordering::AcqRel);
        Some(TenantGuard {
            state: Arc::clone(&tracked.state),
            active: Arc::clone(&tracked.active),
        })
    }

    /// Evict a tenant's state, waiting for in-flight requests to drain.
    ///
    /// New acquisitions stop immediately; the call then waits up to
    /// [`DRAIN_TIMEOUT`] for active guards to drop. On timeout the eviction
    /// proceeds anyway; remaining requests hold their own `Arc` and finish
    /// against the stale state.
    ///
    /// Returns `true` if the tenant was loaded.
    pub async fn evict(&self, tenant_id: &TenantId) -> bool {
        let Some(tracked) = self.inner.write().await.remove(tenant_id) else {
            return false;
        };

        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            loop {
                // Register interest before re-checking to avoid a lost wakeup.
                let notified = tracked.active.drained.notified();
                if tracked.active.count.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                tenant_id = %tenant_id,
                in_flight = tracked.active.count.load(Ordering::Acquire),
                "Tenant evicted before all requests drained"
            );
        }
        true
    }

    /// Number of loaded tenants.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for TenantStateMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str) -> TenantState {
        TenantState {
            tenant_id: id.parse().unwrap(),
            issuer: format!("https://{id}.tessera.app/oidc"),
            local_keys: vec![],
            pool: sqlx::postgres::PgPoolOptions::new()
                .connect_lazy("postgres://localhost/tessera_test")
                .expect("lazy pool"),
        }
    }

    #[tokio::test]
    async fn acquire_returns_shared_state() {
        let map = TenantStateMap::new();
        map.insert(state("t1")).await;

        let guard = map.acquire(&"t1".parse().unwrap()).await.unwrap();
        assert_eq!(guard.issuer, "https://t1.tessera.app/oidc");
        assert!(map.acquire(&"t2".parse().unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn evict_without_requests_returns_immediately() {
        let map = TenantStateMap::new();
        map.insert(state("t1")).await;

        assert!(map.evict(&"t1".parse().unwrap()).await);
        assert!(map.is_empty().await);
        assert!(!map.evict(&"t1".parse().unwrap()).await);
    }

    #[tokio::test]
    async fn evict_waits_for_guard_drop() {
        let map = TenantStateMap::new();
        map.insert(state("t1")).await;
        let tenant: TenantId = "t1".parse().unwrap();

        let guard = map.acquire(&tenant).await.unwrap();

        let map2 = map.clone();
        let tenant2 = tenant.clone();
        let evict = tokio::spawn(async move { map2.evict(&tenant2).await });

        // Give the eviction a moment to start waiting, then release.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!evict.is_finished());
        drop(guard);

        assert!(evict.await.unwrap());
        assert!(map.acquire(&tenant).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn evict_times_out_with_stuck_request() {
        let map = TenantStateMap::new();
        map.insert(state("t1")).await;
        let tenant: TenantId = "t1".parse().unwrap();

        let _stuck = map.acquire(&tenant).await.unwrap();

        // With paused time the 5s drain timeout elapses instantly.
        assert!(map.evict(&tenant).await);
        assert!(map.is_empty().await);
    }
}
