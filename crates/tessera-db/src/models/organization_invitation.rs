//! Organization invitation model.
//!
//! Invitations are created `Pending` with a fixed 7-day expiry and move
//! one-way into `Accepted`, `Expired` or `Revoked`. Terminal states never
//! transition again; the guarded UPDATE statements enforce this at the row
//! level rather than in application code.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use uuid::Uuid;

use crate::DbError;

/// Invitation lifetime.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

/// An invitation to join an organization.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrganizationInvitation {
    /// Invitation identifier.
    pub id: Uuid,

    /// Target organization.
    pub organization_id: String,

    /// Invitee email address, stored lowercase.
    pub invitee: String,

    /// User who issued the invitation.
    pub inviter_id: Uuid,

    /// Lifecycle state.
    pub status: InvitationStatus,

    /// Roles granted on acceptance.
    pub roles: Vec<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Expiry timestamp (creation + 7 days).
    pub expires_at: DateTime<Utc>,
}

impl OrganizationInvitation {
    /// Create a `Pending` invitation with the fixed TTL.
    ///
    /// A partial unique index on `(organization_id, invitee) WHERE status =
    /// 'pending'` makes a duplicate active invitation surface as
    /// `DbError::UniqueViolation`.
    pub async fn create(
        pool: &PgPool,
        organization_id: &str,
        invitee: &str,
        inviter_id: Uuid,
        roles: &[String],
    ) -> Result<Self, DbError> {
        let expires_at = Utc::now() + Duration::days(INVITATION_TTL_DAYS);

        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO organization_invitations
                (organization_id, invitee, inviter_id, status, roles, expires_at)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING id, organization_id, invitee, inviter_id, status, roles,
                      created_at, expires_at
            ",
        )
        .bind(organization_id)
        .bind(invitee.to_lowercase())
        .bind(inviter_id)
        .bind(roles.to_vec())
        .bind(expires_at)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)
    }

    /// Find an invitation by ID within an organization.
    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: &str,
        id: Uuid,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, organization_id, invitee, inviter_id, status, roles,
                   created_at, expires_at
            FROM organization_invitations
            WHERE id = $1 AND organization_id = $2
            ",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// List invitations for an organization, newest first, paginated.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, organization_id, invitee, inviter_id, status, roles,
                   created_at, expires_at
            FROM organization_invitations
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }

    /// Count invitations for pagination.
    pub async fn count_by_organization(
        pool: &PgPool,
        organization_id: &str,
    ) -> Result<i64, DbError> {
        let row: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM organization_invitations
            WHERE organization_id = $1
            ",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.0)
    }

    /// Move a `Pending` invitation into a terminal state.
    ///
    /// Returns `None` when the invitation does not exist or is already
    /// terminal; the `status = 'pending'` guard makes the transition
    /// one-directional under concurrency.
    pub async fn transition(
        pool: &PgPool,
        organization_id: &str,
        id: Uuid,
        to: InvitationStatus,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            UPDATE organization_invitations
            SET status = $3
            WHERE id = $1 AND organization_id = $2 AND status = 'pending'
            RETURNING id, organization_id, invitee, inviter_id, status, roles,
                      created_at, expires_at
            ",
        )
        .bind(id)
        .bind(organization_id)
        .bind(to)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Mark overdue `Pending` invitations as `Expired`.
    ///
    /// Returns the number of rows transitioned; intended for a periodic
    /// sweep, not a per-request path.
    pub async fn expire_overdue(pool: &PgPool) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            UPDATE organization_invitations
            SET status = 'expired'
            WHERE status = 'pending' AND expires_at < NOW()
            ",
        )
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!InvitationStatus::Pending.is_terminal());
        assert!(InvitationStatus::Accepted.is_terminal());
        assert!(InvitationStatus::Expired.is_terminal());
        assert!(InvitationStatus::Revoked.is_terminal());
    }

    #[test]
    fn ttl_is_seven_days() {
        assert_eq!(INVITATION_TTL_DAYS, 7);
    }
}
