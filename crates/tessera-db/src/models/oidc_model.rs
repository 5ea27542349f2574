//! Generic persisted OIDC protocol artifact.
//!
//! The external OIDC provider owns these rows (`Session`, `AccessToken`,
//! `RefreshToken`, `Grant`, …); the core reads and deletes them for session
//! enumeration and revocation, keyed by `(tenant_id, model_name, id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::DbError;

/// Grace period during which a consumed `RefreshToken` is still returned as
/// valid, absorbing concurrent-exchange races in distributed callers.
pub const REFRESH_TOKEN_REUSE_LEEWAY_SECS: f64 = 3.0;

/// A persisted protocol artifact owned by the OIDC provider.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OidcModelInstance {
    /// Tenant partition.
    pub tenant_id: String,

    /// Artifact kind (`Session`, `AccessToken`, `RefreshToken`, …).
    pub model_name: String,

    /// Artifact identifier within its kind.
    pub id: String,

    /// Opaque provider payload. The core reads `jti`, `sessionUid`,
    /// `accountId` and `uid` out of it.
    pub payload: serde_json::Value,

    /// Expiry, when the artifact kind has one.
    pub expires_at: Option<DateTime<Utc>>,

    /// Set once a one-shot artifact (refresh token) has been exchanged.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl OidcModelInstance {
    /// Insert or replace an artifact.
    pub async fn upsert(
        pool: &PgPool,
        tenant_id: &str,
        model_name: &str,
        id: &str,
        payload: &serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"
            INSERT INTO oidc_model_instances
                (tenant_id, model_name, id, payload, expires_at, consumed_at)
            VALUES ($1, $2, $3, $4, $5, NULL)
            ON CONFLICT (tenant_id, model_name, id)
            DO UPDATE SET payload = $4, expires_at = $5, consumed_at = NULL
            ",
        )
        .bind(tenant_id)
        .bind(model_name)
        .bind(id)
        .bind(payload)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Find a live artifact.
    ///
    /// For `RefreshToken` a consumed row is still returned within the
    /// 3-second reuse leeway; for every other kind any consumption makes the
    /// row invisible. Expired rows are never returned.
    pub async fn find_live(
        pool: &PgPool,
        tenant_id: &str,
        model_name: &str,
        id: &str,
    ) -> Result<Option<Self>, DbError> {
        let leeway = if model_name == "RefreshToken" {
            REFRESH_TOKEN_REUSE_LEEWAY_SECS
        } else {
            0.0
        };

        sqlx::query_as::<_, Self>(
            r"
            SELECT tenant_id, model_name, id, payload, expires_at, consumed_at
            FROM oidc_model_instances
            WHERE tenant_id = $1 AND model_name = $2 AND id = $3
              AND (expires_at IS NULL OR expires_at > NOW())
              AND (consumed_at IS NULL
                   OR consumed_at > NOW() - ($4 * interval '1 second'))
            ",
        )
        .bind(tenant_id)
        .bind(model_name)
        .bind(id)
        .bind(leeway)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }

    /// Mark an artifact consumed. Returns `false` if it was already consumed
    /// or absent.
    pub async fn consume(
        pool: &PgPool,
        tenant_id: &str,
        model_name: &str,
        id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            UPDATE oidc_model_instances
            SET consumed_at = NOW()
            WHERE tenant_id = $1 AND model_name = $2 AND id = $3
              AND consumed_at IS NULL
            ",
        )
        .bind(tenant_id)
        .bind(model_name)
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// All non-consumed access and refresh tokens tied to a session.
    pub async fn find_session_tokens(
        pool: &PgPool,
        tenant_id: &str,
        session_uid: &str,
    ) -> Result<Vec<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT tenant_id, model_name, id, payload, expires_at, consumed_at
            FROM oidc_model_instances
            WHERE tenant_id = $1
              AND model_name IN ('AccessToken', 'RefreshToken')
              AND consumed_at IS NULL
              AND payload->>'sessionUid' = $2
            ",
        )
        .bind(tenant_id)
        .bind(session_uid)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)
    }

    /// Delete one artifact. Returns `true` if a row was removed.
    pub async fn delete_instance(
        pool: &PgPool,
        tenant_id: &str,
        model_name: &str,
        id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM oidc_model_instances
            WHERE tenant_id = $1 AND model_name = $2 AND id = $3
            ",
        )
        .bind(tenant_id)
        .bind(model_name)
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a session by its `uid`. Returns `true` if a row was removed.
    pub async fn delete_session(
        pool: &PgPool,
        tenant_id: &str,
        session_uid: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM oidc_model_instances
            WHERE tenant_id = $1 AND model_name = 'Session'
              AND payload->>'uid' = $2
            ",
        )
        .bind(tenant_id)
        .bind(session_uid)
        .execute(pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    /// Session `uid`s of every live session belonging to a user.
    pub async fn session_uids_for_user(
        pool: &PgPool,
        tenant_id: &str,
        account_id: &str,
    ) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT payload->>'uid'
            FROM oidc_model_instances
            WHERE tenant_id = $1 AND model_name = 'Session'
              AND payload->>'accountId' = $2
              AND payload->>'uid' IS NOT NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            ",
        )
        .bind(tenant_id)
        .bind(account_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(|(uid,)| uid).collect())
    }

    /// The `jti` recorded in the payload, when present.
    #[must_use]
    pub fn jti(&self) -> Option<&str> {
        self.payload.get("jti").and_then(|v| v.as_str())
    }

    /// The `accountId` recorded in the payload, when present.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.payload.get("accountId").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(payload: serde_json::Value) -> OidcModelInstance {
        OidcModelInstance {
            tenant_id: "t1".to_string(),
            model_name: "AccessToken".to_string(),
            id: "at-1".to_string(),
            payload,
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            consumed_at: None,
        }
    }

    #[test]
    fn payload_accessors() {
        let inst = instance(serde_json::json!({
            "jti": "token-1",
            "accountId": "user-1",
            "sessionUid": "sess-1",
        }));
        assert_eq!(inst.jti(), Some("token-1"));
        assert_eq!(inst.account_id(), Some("user-1"));
    }

    #[test]
    fn missing_payload_fields_are_none() {
        let inst = instance(serde_json::json!({}));
        assert_eq!(inst.jti(), None);
        assert_eq!(inst.account_id(), None);
    }

    #[test]
    fn reuse_leeway_is_three_seconds() {
        assert_eq!(REFRESH_TOKEN_REUSE_LEEWAY_SECS, 3.0);
    }
}
