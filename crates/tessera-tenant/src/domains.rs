//! Custom-domain management.
//!
//! Thin service over the `custom_domains` table that pairs every mutation
//! with the matching cache invalidation, and gates the feature on deployment
//! configuration.

use sqlx::PgPool;
use tessera_db::models::{CustomDomain, DomainStatus};

use crate::domain_cache::DomainCache;
use crate::error::TenantError;

/// Create, update and delete custom domains with cache invalidation.
#[derive(Clone)]
pub struct CustomDomainService {
    pool: PgPool,
    cache: DomainCache,
    enabled: bool,
}

impl CustomDomainService {
    /// Create the service. `enabled` reflects whether the deployment mode
    /// supports custom domains at all.
    #[must_use]
    pub fn new(pool: PgPool, cache: DomainCache, enabled: bool) -> Self {
        Self {
            pool,
            cache,
            enabled,
        }
    }

    fn ensure_enabled(&self) -> Result<(), TenantError> {
        if self.enabled {
            Ok(())
        } else {
            Err(TenantError::DomainNotConfigured)
        }
    }

    /// Register a new domain for a tenant.
    pub async fn create(
        &self,
        tenant_id: &str,
        domain: &str,
    ) -> Result<CustomDomain, TenantError> {
        self.ensure_enabled()?;
        let created = CustomDomain::insert(&self.pool, tenant_id, domain).await?;
        self.cache.invalidate(domain).await;
        Ok(created)
    }

    /// Update a domain's provisioning status.
    pub async fn update_status(
        &self,
        tenant_id: &str,
        domain: &str,
        status: DomainStatus,
    ) -> Result<CustomDomain, TenantError> {
        self.ensure_enabled()?;
        let updated = CustomDomain::update_status(&self.pool, tenant_id, domain, status).await?;
        self.cache.invalidate(domain).await;
        Ok(updated)
    }

    /// Remove a domain binding.
    pub async fn delete(&self, tenant_id: &str, domain: &str) -> Result<(), TenantError> {
        self.ensure_enabled()?;
        let removed = CustomDomain::delete(&self.pool, tenant_id, domain).await?;
        self.cache.invalidate(domain).await;
        if removed {
            Ok(())
        } else {
            Err(TenantError::Db(tessera_db::DbError::NotFound(format!(
                "domain {domain}"
            ))))
        }
    }

    /// List a tenant's domains.
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<CustomDomain>, TenantError> {
        self.ensure_enabled()?;
        Ok(CustomDomain::list_by_tenant(&self.pool, tenant_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn disabled_feature_reports_domain_not_configured() {
        let service = CustomDomainService::new(lazy_pool(), DomainCache::new(), false);
        let err = service.create("t1", "auth.acme.com").await.unwrap_err();
        assert!(matches!(err, TenantError::DomainNotConfigured));
    }
}
