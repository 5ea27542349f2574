//! Custom domain model.
//!
//! A tenant may bind one or more custom hostnames; only `Active` domains
//! participate in tenant resolution. Every mutation must be followed by a
//! domain-cache invalidation for the affected hostname (the cache layer in
//! `tessera-tenant` exposes the hook).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;

use crate::DbError;

/// Provisioning state of a custom domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "domain_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// DNS/TLS provisioning not yet complete.
    Pending,
    /// Serving traffic; eligible for tenant resolution.
    Active,
    /// Provisioning failed.
    Error,
}

/// A custom hostname bound to a tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomDomain {
    /// Row identifier.
    pub id: Uuid,

    /// Owning tenant.
    pub tenant_id: String,

    /// Fully qualified hostname, stored lowercase.
    pub domain: String,

    /// Provisioning state.
    pub status: DomainStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CustomDomain {
    /// Find the tenant bound to an *active* domain.
    pub async fn find_active_by_domain(
        pool: &PgPool,
        domain: &str,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, domain, status, created_at
            FROM custom_domains
            WHERE domain = $1 AND status = 'active'
            ",
        )
        .bind(domain)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Register a domain for a tenant in `Pending` state.
    pub async fn insert(pool: &PgPool, tenant_id: &str, domain: &str) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO custom_domains (tenant_id, domain, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, tenant_id, domain, status, created_at
            ",
        )
        .bind(tenant_id)
        .bind(domain.to_lowercase())
        .fetch_one(pool)
        .await
        .map_err(DbError::from)
    }

    /// Update the provisioning state of a domain.
    pub async fn update_status(
        pool: &PgPool,
        tenant_id: &str,
        domain: &str,
        status: DomainStatus,
    ) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE custom_domains
            SET status = $3
            WHERE tenant_id = $1 AND domain = $2
            RETURNING id, tenant_id, domain, status, created_at
            ",
        )
        .bind(tenant_id)
        .bind(domain)
        .bind(status)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound(format!("domain {domain}")))
    }

    /// Remove a domain binding. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, tenant_id: &str, domain: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM custom_domains
            WHERE tenant_id = $1 AND domain = $2
            ",
        )
        .bind(tenant_id)
        .bind(domain)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// List all domains bound to a tenant.
    pub async fn list_by_tenant(pool: &PgPool, tenant_id: &str) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, domain, status, created_at
            FROM custom_domains
            WHERE tenant_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_uses_lowercase() {
        let json = serde_json::to_string(&DomainStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        let back: DomainStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, DomainStatus::Pending);
    }
}
