//! Organization model.
//!
//! Organizations live exclusively in the admin tenant's store and act as
//! access-control proxies for managed tenants: organization `t-<tenantId>`
//! holds the memberships, roles and invitations that govern who may manage
//! tenant `<tenantId>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::DbError;

/// An organization in the admin tenant's store.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier (`t-<tenantId>` for tenant mirrors).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Idempotent get-or-create.
    ///
    /// Inserts the organization if absent, otherwise returns the existing
    /// row unchanged (the stored name wins over the supplied one).
    pub async fn get_or_create(
        pool: &PgPool,
        id: &str,
        name: &str,
    ) -> Result<Self, DbError> {
        if let Some(existing) = Self::find_by_id(pool, id).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, Self>(
            r"
            INSERT INTO organizations (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, name, description, created_at
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)?;

        match inserted {
            Some(org) => Ok(org),
            // Lost the insert race; the winner's row must exist now.
            None => Self::find_by_id(pool, id)
                .await?
                .ok_or_else(|| DbError::CreateFailed(format!("organization {id}"))),
        }
    }

    /// Find an organization by ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, name, description, created_at
            FROM organizations
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Delete an organization (cascades memberships, roles, invitations).
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM organizations
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Lock the organization row for the duration of the transaction.
    ///
    /// Membership and role mutations take this lock first so the last-admin
    /// check and the write happen atomically per organization.
    pub async fn lock_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: &str,
    ) -> Result<(), DbError> {
        let row: Option<(String,)> = sqlx::query_as(
            r"
            SELECT id FROM organizations
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?;

        row.map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("organization {id}")))
    }
}
