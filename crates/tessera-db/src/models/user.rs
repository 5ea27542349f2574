//! User model.
//!
//! Only the slice of the user entity the authorization core needs: identity,
//! email for member listings, and tenant-level role for admin provisioning
//! and Me-API scope resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A user within a tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: Uuid,

    /// Tenant partition.
    pub tenant_id: String,

    /// Primary email.
    pub email: String,

    /// Display name.
    pub name: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Find a user by ID within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: &str,
        id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, email, name, created_at
            FROM users
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Find a user by email within a tenant.
    pub async fn find_by_email(
        pool: &PgPool,
        tenant_id: &str,
        email: &str,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, email, name, created_at
            FROM users
            WHERE tenant_id = $1 AND lower(email) = lower($2)
            ",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// All users of a tenant holding an admin-like tenant role.
    ///
    /// Used at tenant creation to provision admin-tenant admins as Admin
    /// members of the new tenant's organization.
    pub async fn find_admin_users(pool: &PgPool, tenant_id: &str) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT u.id, u.tenant_id, u.email, u.name, u.created_at
            FROM users u
            JOIN user_roles r ON r.tenant_id = u.tenant_id AND r.user_id = u.id
            WHERE u.tenant_id = $1 AND r.role IN ('admin', 'owner')
            ORDER BY u.created_at ASC
            ",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }

    /// Tenant-level role names held by a user.
    pub async fn role_names(
        pool: &PgPool,
        tenant_id: &str,
        user_id: Uuid,
    ) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT role FROM user_roles
            WHERE tenant_id = $1 AND user_id = $2
            ORDER BY role ASC
            ",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(|(role,)| role).collect())
    }

    /// Whether a user exists in a tenant.
    pub async fn exists(pool: &PgPool, tenant_id: &str, id: Uuid) -> Result<bool, DbError> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(SELECT 1 FROM users WHERE tenant_id = $1 AND id = $2)
            ",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.0)
    }
}
