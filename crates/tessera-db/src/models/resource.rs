//! API resource, scope grant, and consent models.
//!
//! Custom resource indicators are registered per tenant. Scope grants tie a
//! principal (user, application, or organization) to the scopes it holds on
//! a resource; third-party applications additionally record the scopes a
//! user consented to per application/resource pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A custom API resource registered in a tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiResource {
    /// Row identifier.
    pub id: Uuid,

    /// Tenant partition.
    pub tenant_id: String,

    /// OAuth resource indicator (audience value).
    pub indicator: String,

    /// Display name.
    pub name: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ApiResource {
    /// Find a registered resource by its indicator.
    pub async fn find_by_indicator(
        pool: &PgPool,
        tenant_id: &str,
        indicator: &str,
    ) -> Result<Option<Self>, DbError> {
        sqlx::query_as::<_, Self>(
            r"
            SELECT id, tenant_id, indicator, name, created_at
            FROM api_resources
            WHERE tenant_id = $1 AND indicator = $2
            ",
        )
        .bind(tenant_id)
        .bind(indicator)
        .fetch_optional(pool)
        .await
        .map_err(DbError::from)
    }
}

/// The kind of principal a scope grant applies to.
pub mod principal_type {
    pub const USER: &str = "user";
    pub const APPLICATION: &str = "application";
    pub const ORGANIZATION: &str = "organization";
}

/// A scope held by a principal on a resource.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResourceScopeGrant {
    /// Tenant partition.
    pub tenant_id: String,

    /// Resource indicator the scope applies to.
    pub indicator: String,

    /// `user`, `application`, or `organization`.
    pub principal_type: String,

    /// Principal identifier (user ID, client ID, or organization ID).
    pub principal_id: String,

    /// Scope name.
    pub scope: String,
}

impl ResourceScopeGrant {
    /// Scopes one principal holds on one resource.
    pub async fn scopes_for(
        pool: &PgPool,
        tenant_id: &str,
        indicator: &str,
        principal_type: &str,
        principal_id: &str,
    ) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT scope FROM resource_scope_grants
            WHERE tenant_id = $1 AND indicator = $2
              AND principal_type = $3 AND principal_id = $4
            ORDER BY scope ASC
            ",
        )
        .bind(tenant_id)
        .bind(indicator)
        .bind(principal_type)
        .bind(principal_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(|(scope,)| scope).collect())
    }
}

/// Scopes a user consented to for a third-party application on a resource.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApplicationConsent {
    /// Tenant partition.
    pub tenant_id: String,

    /// Consenting user.
    pub user_id: Uuid,

    /// Third-party application (client ID).
    pub application_id: String,

    /// Resource indicator the consent applies to.
    pub indicator: String,

    /// Consented scope name.
    pub scope: String,
}

impl ApplicationConsent {
    /// Consented scopes for a user/application/resource triple.
    pub async fn consented_scopes(
        pool: &PgPool,
        tenant_id: &str,
        user_id: Uuid,
        application_id: &str,
        indicator: &str,
    ) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT scope FROM application_consents
            WHERE tenant_id = $1 AND user_id = $2
              AND application_id = $3 AND indicator = $4
            ORDER BY scope ASC
            ",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(application_id)
        .bind(indicator)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(|(scope,)| scope).collect())
    }
}
