//! JWT blacklist model.
//!
//! Access tokens are self-verifying JWTs and cannot be recalled once issued;
//! revocation works by recording the token's `jti` here and rejecting it at
//! verification time. Rows are unique on `(tenant_id, jti)` and are swept
//! once the token would have expired anyway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A revoked JWT record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JwtBlacklistEntry {
    /// Row identifier.
    pub id: Uuid,

    /// Tenant partition.
    pub tenant_id: String,

    /// JWT ID claim of the revoked token.
    pub jti: String,

    /// User the token belonged to, when known.
    pub user_id: Option<Uuid>,

    /// Session the token belonged to, when revoked via session revocation.
    pub session_uid: Option<String>,

    /// Original token expiry; rows past this are swept.
    pub expires_at: DateTime<Utc>,

    /// When the revocation happened.
    pub revoked_at: DateTime<Utc>,
}

/// Input for a new blacklist entry.
#[derive(Debug, Clone)]
pub struct CreateBlacklistEntry {
    pub tenant_id: String,
    pub jti: String,
    pub user_id: Option<Uuid>,
    pub session_uid: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl JwtBlacklistEntry {
    /// Idempotent insert: revoking an already-revoked token is a no-op.
    ///
    /// Returns `None` when the `(tenant_id, jti)` pair already existed.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateBlacklistEntry,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            INSERT INTO jwt_blacklist (tenant_id, jti, user_id, session_uid, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, jti) DO NOTHING
            RETURNING id, tenant_id, jti, user_id, session_uid, expires_at, revoked_at
            ",
        )
        .bind(&input.tenant_id)
        .bind(&input.jti)
        .bind(input.user_id)
        .bind(&input.session_uid)
        .bind(input.expires_at)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Check whether a `jti` is blacklisted and the underlying token has not
    /// yet expired on its own.
    pub async fn is_blacklisted(
        pool: &PgPool,
        tenant_id: &str,
        jti: &str,
    ) -> Result<bool, DbError> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM jwt_blacklist
                WHERE tenant_id = $1 AND jti = $2 AND expires_at > NOW()
            )
            ",
        )
        .bind(tenant_id)
        .bind(jti)
        .fetch_one(pool)
        .await
        .map_err(DbError::from)?;

        Ok(row.0)
    }

    /// Delete rows whose token has expired. Returns the number removed.
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM jwt_blacklist
            WHERE expires_at < NOW()
            ",
        )
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected())
    }

    /// All blacklist rows recorded for one session.
    pub async fn find_by_session(
        pool: &PgPool,
        tenant_id: &str,
        session_uid: &str,
    ) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, jti, user_id, session_uid, expires_at, revoked_at
            FROM jwt_blacklist
            WHERE tenant_id = $1 AND session_uid = $2
            ORDER BY revoked_at DESC
            ",
        )
        .bind(tenant_id)
        .bind(session_uid)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_entry_carries_session_linkage() {
        let input = CreateBlacklistEntry {
            tenant_id: "t1".to_string(),
            jti: "jti-1".to_string(),
            user_id: Some(Uuid::new_v4()),
            session_uid: Some("sess-1".to_string()),
            expires_at: Utc::now() + chrono::Duration::minutes(10),
        };
        assert_eq!(input.session_uid.as_deref(), Some("sess-1"));
        assert!(input.expires_at > Utc::now());
    }
}
