//! Tenant model.
//!
//! Tenants are isolated customer units; all other shapes are partitioned by
//! `tenant_id`. The `admin` and `default` tenants are system tenants and are
//! protected from deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use tessera_core::{ADMIN_TENANT_ID, DEFAULT_TENANT_ID};

use crate::DbError;

/// Deployment classification for a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Type, Serialize, Deserialize)]
#[sqlx(type_name = "tenant_tag", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantTag {
    /// Development workspace; relaxed limits.
    #[default]
    Development,
    /// Production workspace.
    Production,
}

impl std::fmt::Display for TenantTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantTag::Development => write!(f, "development"),
            TenantTag::Production => write!(f, "production"),
        }
    }
}

/// A tenant in the Tessera platform.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tenant {
    /// Subdomain-safe tenant identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Deployment tag.
    pub tag: TenantTag,

    /// Per-tenant database credentials (opaque to the core).
    #[serde(default, skip_serializing)]
    pub db_credentials: Option<serde_json::Value>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Suspended tenants reject all requests at resolution time.
    pub is_suspended: bool,
}

impl Tenant {
    /// Returns `true` if this tenant must never be deleted.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.id == ADMIN_TENANT_ID || self.id == DEFAULT_TENANT_ID
    }

    /// Create a new tenant.
    pub async fn create(
        pool: &PgPool,
        id: &str,
        name: &str,
        tag: TenantTag,
        db_credentials: Option<serde_json::Value>,
    ) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO tenants (id, name, tag, db_credentials)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, tag, db_credentials, created_at, is_suspended
            ",
        )
        .bind(id)
        .bind(name)
        .bind(tag)
        .bind(db_credentials)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)
    }

    /// Find a tenant by its ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, name, tag, db_credentials, created_at, is_suspended
            FROM tenants
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// List all tenants, oldest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, name, tag, db_credentials, created_at, is_suspended
            FROM tenants
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }

    /// Rename a tenant.
    pub async fn rename(pool: &PgPool, id: &str, name: &str) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE tenants
            SET name = $2
            WHERE id = $1
            RETURNING id, name, tag, db_credentials, created_at, is_suspended
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound(format!("tenant {id}")))
    }

    /// Update the deployment tag.
    pub async fn update_tag(pool: &PgPool, id: &str, tag: TenantTag) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE tenants
            SET tag = $2
            WHERE id = $1
            RETURNING id, name, tag, db_credentials, created_at, is_suspended
            ",
        )
        .bind(id)
        .bind(tag)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound(format!("tenant {id}")))
    }

    /// Suspend or unsuspend a tenant.
    pub async fn set_suspended(
        pool: &PgPool,
        id: &str,
        suspended: bool,
    ) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE tenants
            SET is_suspended = $2
            WHERE id = $1
            RETURNING id, name, tag, db_credentials, created_at, is_suspended
            ",
        )
        .bind(id)
        .bind(suspended)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound(format!("tenant {id}")))
    }

    /// Delete a tenant row. Callers are responsible for refusing to delete
    /// system tenants before reaching this point.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM tenants
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: format!("Tenant {id}"),
            tag: TenantTag::Development,
            db_credentials: None,
            created_at: Utc::now(),
            is_suspended: false,
        }
    }

    #[test]
    fn system_tenants_are_protected() {
        assert!(tenant("admin").is_protected());
        assert!(tenant("default").is_protected());
        assert!(!tenant("acme").is_protected());
    }

    #[test]
    fn tag_display() {
        assert_eq!(TenantTag::Development.to_string(), "development");
        assert_eq!(TenantTag::Production.to_string(), "production");
    }

    #[test]
    fn credentials_are_not_serialized() {
        let mut t = tenant("acme");
        t.db_credentials = Some(serde_json::json!({"password": "secret"}));
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("secret"));
    }
}
