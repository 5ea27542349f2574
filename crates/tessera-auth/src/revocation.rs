//! JWT and session revocation store.
//!
//! Cache-aside blacklist in front of the `jwt_blacklist` table. A cache miss
//! always re-checks Postgres: a "not blacklisted" verdict is only ever
//! served from a cached *confirmed* lookup, so a revoked token can never be
//! resurrected by cache churn. Verdicts carry their own TTL: 15 minutes when
//! blacklisted, 5 minutes when clean, bounding staleness without unbounded
//! cache growth.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use moka::future::Cache;
use moka::Expiry;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use tessera_db::models::{CreateBlacklistEntry, JwtBlacklistEntry, OidcModelInstance};
use tessera_db::DbError;

/// Maximum number of cached verdicts.
const MAX_CACHE_ENTRIES: u64 = 100_000;

/// Verdict TTL when the token is blacklisted.
const BLACKLISTED_TTL: Duration = Duration::from_secs(15 * 60);

/// Verdict TTL when the token is clean.
const CLEAN_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached blacklist verdict with its own lifetime.
#[derive(Debug, Clone, Copy)]
struct Verdict {
    blacklisted: bool,
    ttl: Duration,
}

struct VerdictExpiry;

impl Expiry<String, Verdict> for VerdictExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Verdict,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Tracks blacklisted JWT IDs and revokes sessions.
#[derive(Clone)]
pub struct RevocationStore {
    pool: PgPool,
    cache: Cache<String, Verdict>,
}

impl RevocationStore {
    /// Create a store over the tenant-partitioned blacklist table.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .expire_after(VerdictExpiry)
            .build();
        Self { pool, cache }
    }

    fn cache_key(tenant_id: &str, jti: &str) -> String {
        format!("{tenant_id}:{jti}")
    }

    /// Blacklist a token.
    ///
    /// Idempotent: a conflicting `(tenant_id, jti)` insert is a no-op. The
    /// cache is primed as blacklisted for as long as the token would have
    /// lived anyway.
    pub async fn add_to_blacklist(
        &self,
        tenant_id: &str,
        jti: &str,
        user_id: Option<Uuid>,
        session_uid: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let input = CreateBlacklistEntry {
            tenant_id: tenant_id.to_string(),
            jti: jti.to_string(),
            user_id,
            session_uid: session_uid.map(str::to_string),
            expires_at,
        };
        JwtBlacklistEntry::insert(&self.pool, &input).await?;

        let until_expiry = (expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::from_secs(1));
        self.cache
            .insert(
                Self::cache_key(tenant_id, jti),
                Verdict {
                    blacklisted: true,
                    ttl: until_expiry.max(Duration::from_secs(1)),
                },
            )
            .await;

        tracing::info!(tenant_id, jti, "Token blacklisted");
        Ok(())
    }

    /// Whether a `jti` is blacklisted, cache-first.
    pub async fn is_blacklisted(&self, tenant_id: &str, jti: &str) -> Result<bool, DbError> {
        let key = Self::cache_key(tenant_id, jti);
        if let Some(verdict) = self.cache.get(&key).await {
            return Ok(verdict.blacklisted);
        }

        let blacklisted = JwtBlacklistEntry::is_blacklisted(&self.pool, tenant_id, jti).await?;

        let ttl = if blacklisted { BLACKLISTED_TTL } else { CLEAN_TTL };
        self.cache.insert(key, Verdict { blacklisted, ttl }).await;

        Ok(blacklisted)
    }

    /// Revoke one session: blacklist its live tokens, delete them, and
    /// delete the session itself.
    ///
    /// Fails with `DbError::NotFound` when no session row was deleted.
    pub async fn revoke_session(
        &self,
        tenant_id: &str,
        session_uid: &str,
        user_id: Option<Uuid>,
    ) -> Result<(), DbError> {
        let tokens =
            OidcModelInstance::find_session_tokens(&self.pool, tenant_id, session_uid).await?;

        for token in &tokens {
            if let Some(jti) = token.jti() {
                let expires_at = token
                    .expires_at
                    .unwrap_or_else(|| Utc::now() + ChronoDuration::minutes(15));
                self.add_to_blacklist(tenant_id, jti, user_id, Some(session_uid), expires_at)
                    .await?;
            }
            OidcModelInstance::delete_instance(
                &self.pool,
                tenant_id,
                &token.model_name,
                &token.id,
            )
            .await?;
        }

        let deleted = OidcModelInstance::delete_session(&self.pool, tenant_id, session_uid).await?;
        if !deleted {
            return Err(DbError::NotFound(format!("session {session_uid}")));
        }

        tracing::info!(
            tenant_id,
            session_uid,
            revoked_tokens = tokens.len(),
            "Session revoked"
        );
        Ok(())
    }

    /// Revoke every session of a user except one.
    ///
    /// Target session UIDs are collected first, then revoked one by one; a
    /// failure on one session is logged and does not stop the rest.
    pub async fn revoke_other_sessions(
        &self,
        tenant_id: &str,
        account_id: &str,
        except_session_uid: &str,
    ) -> Result<(), DbError> {
        let uids =
            OidcModelInstance::session_uids_for_user(&self.pool, tenant_id, account_id).await?;
        let user_id = account_id.parse::<Uuid>().ok();

        for uid in uids.iter().filter(|uid| uid.as_str() != except_session_uid) {
            if let Err(err) = self.revoke_session(tenant_id, uid, user_id).await {
                tracing::warn!(
                    tenant_id,
                    session_uid = %uid,
                    error = %err,
                    "Failed to revoke session; continuing with remaining sessions"
                );
            }
        }
        Ok(())
    }

    /// Delete blacklist rows past their token expiry. Intended for a
    /// periodic schedule, not the request path.
    pub async fn sweep_expired(&self) -> Result<u64, DbError> {
        let removed = JwtBlacklistEntry::delete_expired(&self.pool).await?;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired blacklist rows");
        }
        Ok(removed)
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

    #[test]
    fn cache_key_partitions_by_tenant() {
        assert_ne!(
            RevocationStore::cache_key("t1", "jti-1"),
            RevocationStore::cache_key("t2", "jti-1")
        );
    }

    #[test]
    fn verdict_ttls_match_policy() {
        assert_eq!(BLACKLISTED_TTL, Duration::from_secs(900));
        assert_eq!(CLEAN_TTL, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn cached_blacklisted_verdict_is_served_without_storage() {
        let store = RevocationStore::new(lazy_pool());
        store
            .cache
            .insert(
                RevocationStore::cache_key("t1", "jti-1"),
                Verdict {
                    blacklisted: true,
                    ttl: BLACKLISTED_TTL,
                },
            )
            .await;

        assert!(store.is_blacklisted("t1", "jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn expiry_policy_uses_per_verdict_ttl() {
        let expiry = VerdictExpiry;
        let verdict = Verdict {
            blacklisted: false,
            ttl: CLEAN_TTL,
        };
        assert_eq!(
            expiry.expire_after_create(&"k".to_string(), &verdict, Instant::now()),
            Some(CLEAN_TTL)
        );
    }
}
