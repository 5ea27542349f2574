//! Custom-domain lookup cache.
//!
//! Hostname → tenant-ID cache in front of the `custom_domains` table. Only
//! positive lookups are cached; a miss always re-queries the source of
//! truth. Every domain mutation must call [`DomainCache::invalidate`] for
//! the affected hostname.

use moka::future::Cache;
use sqlx::PgPool;
use std::time::Duration;
use tessera_db::models::CustomDomain;
use tessera_db::DbError;

/// Maximum number of cached hostname bindings.
const MAX_CACHE_ENTRIES: u64 = 10_000;

/// Time-to-live for cached bindings (seconds).
const CACHE_TTL_SECONDS: u64 = 300;

/// Cache key prefix; the full key is `custom-domain:<hostname>`.
const CACHE_KEY_PREFIX: &str = "custom-domain:";

/// Concurrent cache of active custom-domain bindings.
#[derive(Clone)]
pub struct DomainCache {
    cache: Cache<String, String>,
}

impl DomainCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(Duration::from_secs(CACHE_TTL_SECONDS))
            .build();
        Self { cache }
    }

    fn key(hostname: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{}", hostname.to_lowercase())
    }

    /// Look up the tenant bound to a hostname, cache-first.
    ///
    /// On a miss the persistent store is queried for an *active* domain and
    /// the cache is populated only on a hit.
    pub async fn resolve(
        &self,
        pool: &PgPool,
        hostname: &str,
    ) -> Result<Option<String>, DbError> {
        let key = Self::key(hostname);
        if let Some(tenant_id) = self.cache.get(&key).await {
            return Ok(Some(tenant_id));
        }

        let Some(domain) = CustomDomain::find_active_by_domain(pool, &hostname.to_lowercase())
            .await?
        else {
            return Ok(None);
        };

        self.cache.insert(key, domain.tenant_id.clone()).await;
        Ok(Some(domain.tenant_id))
    }

    /// Prime the cache with a known binding.
    pub async fn insert(&self, hostname: &str, tenant_id: &str) {
        self.cache
            .insert(Self::key(hostname), tenant_id.to_string())
            .await;
    }

    /// Drop the cached binding for a hostname. Called on every domain
    /// create, update, or delete.
    pub async fn invalidate(&self, hostname: &str) {
        self.cache.invalidate(&Self::key(hostname)).await;
    }
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        // Never connected in these tests; only the cache paths run.
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn cached_binding_is_returned_without_touching_storage() {
        let cache = DomainCache::new();
        cache.insert("Auth.Acme.COM", "t1").await;

        let resolved = cache.resolve(&lazy_pool(), "auth.acme.com").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn invalidation_drops_the_binding() {
        let cache = DomainCache::new();
        cache.insert("auth.acme.com", "t1").await;
        cache.invalidate("auth.acme.com").await;

        // With the entry gone the lookup falls through to the (unreachable)
        // store and reports the failure instead of a stale hit.
        let result = cache.resolve(&lazy_pool(), "auth.acme.com").await;
        assert!(result.is_err() || result.unwrap().is_none());
    }

    #[test]
    fn cache_key_shape() {
        assert_eq!(DomainCache::key("Auth.Acme.com"), "custom-domain:auth.acme.com");
    }
}
