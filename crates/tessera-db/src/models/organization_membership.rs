//! Organization membership and role assignment models.
//!
//! Membership existence means "is a member of the mirrored tenant"; the role
//! assignment carries `admin` or `collaborator`. Mutations that can violate
//! the at-least-one-admin invariant run inside a transaction holding the
//! organization row lock (`Organization::lock_for_update`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction, Type};
use uuid::Uuid;

use crate::DbError;

/// Role held by an organization member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "organization_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    /// Full control over the mirrored tenant, including membership.
    Admin,
    /// Day-to-day access without member management.
    Collaborator,
}

impl std::fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationRole::Admin => write!(f, "admin"),
            OrganizationRole::Collaborator => write!(f, "collaborator"),
        }
    }
}

/// A membership row linking a user to an organization.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrganizationMembership {
    /// The organization.
    pub organization_id: String,

    /// The member.
    pub user_id: Uuid,

    /// Role held by the member.
    pub role: OrganizationRole,

    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// A member joined with user data and role name, for listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberRow {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: OrganizationRole,
    pub created_at: DateTime<Utc>,
}

impl OrganizationMembership {
    /// Insert a membership with its role.
    ///
    /// Fails with `DbError::UniqueViolation` if the user is already a member.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: &str,
        user_id: Uuid,
        role: OrganizationRole,
    ) -> Result<Self, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO organization_memberships (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING organization_id, user_id, role, created_at
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from)
    }

    /// Remove a membership. Returns `true` if a row was removed.
    pub async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: &str,
        user_id: Uuid,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM organization_memberships
            WHERE organization_id = $1 AND user_id = $2
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Change a member's role. Returns the updated row, or `None` if the
    /// user is not a member.
    pub async fn update_role(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: &str,
        user_id: Uuid,
        role: OrganizationRole,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE organization_memberships
            SET role = $3
            WHERE organization_id = $1 AND user_id = $2
            RETURNING organization_id, user_id, role, created_at
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)
    }

    /// Find a single membership.
    pub async fn find(
        pool: &PgPool,
        organization_id: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT organization_id, user_id, role, created_at
            FROM organization_memberships
            WHERE organization_id = $1 AND user_id = $2
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Find a membership inside a transaction (sees the locked state).
    pub async fn find_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT organization_id, user_id, role, created_at
            FROM organization_memberships
            WHERE organization_id = $1 AND user_id = $2
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)
    }

    /// Count the organization's admins, inside the locking transaction.
    pub async fn count_admins(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: &str,
    ) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM organization_memberships
            WHERE organization_id = $1 AND role = 'admin'
            ",
        )
        .bind(organization_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from)?;

        Ok(row.0)
    }

    /// List members joined with user data, paginated, with an optional
    /// case-insensitive search over email and name.
    pub async fn list_members(
        pool: &PgPool,
        organization_id: &str,
        limit: i64,
        offset: i64,
        search: Option<&str>,
    ) -> Result<Vec<MemberRow>, DbError> {
        match search {
            Some(term) => sqlx::query_as::<_, MemberRow>(
                r"
                SELECT m.user_id, u.email, u.name, m.role, m.created_at
                FROM organization_memberships m
                JOIN users u ON u.id = m.user_id
                WHERE m.organization_id = $1
                  AND (u.email ILIKE $4 OR u.name ILIKE $4)
                ORDER BY m.created_at ASC
                LIMIT $2 OFFSET $3
                ",
            )
            .bind(organization_id)
            .bind(limit)
            .bind(offset)
            .bind(format!("%{term}%"))
            .fetch_all(pool)
            .await
            .map_err(DbError::from),
            None => sqlx::query_as::<_, MemberRow>(
                r"
                SELECT m.user_id, u.email, u.name, m.role, m.created_at
                FROM organization_memberships m
                JOIN users u ON u.id = m.user_id
                WHERE m.organization_id = $1
                ORDER BY m.created_at ASC
                LIMIT $2 OFFSET $3
                ",
            )
            .bind(organization_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(DbError::from),
        }
    }

    /// Total member count for pagination headers.
    pub async fn count_members(pool: &PgPool, organization_id: &str) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM organization_memberships
            WHERE organization_id = $1
            ",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display() {
        assert_eq!(OrganizationRole::Admin.to_string(), "admin");
        assert_eq!(OrganizationRole::Collaborator.to_string(), "collaborator");
    }

    #[test]
    fn role_serde_round_trip() {
        let json = serde_json::to_string(&OrganizationRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: OrganizationRole = serde_json::from_str("\"collaborator\"").unwrap();
        assert_eq!(role, OrganizationRole::Collaborator);
    }
}
