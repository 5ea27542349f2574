//! Tenant lifecycle handlers.
//!
//! Creation generates the tenant ID, eagerly mirrors the tenant as an
//! admin-tenant organization, and provisions existing admin users as Admin
//! members. System tenants are protected from deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tessera_authz::MemberOperation;
use tessera_core::TenantId;
use tessera_db::models::{Organization, Tenant};

use crate::error::ApiError;
use crate::handlers::parse_tenant;
use crate::models::CreateTenantRequest;
use crate::router::MembersApiState;

/// `GET /tenants`
pub async fn list_tenants(
    State(state): State<MembersApiState>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    Ok(Json(Tenant::list_all(&state.pool).await?))
}

/// `POST /tenants`
pub async fn create_tenant(
    State(state): State<MembersApiState>,
    Json(body): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("tenant name must not be empty".to_string()));
    }

    let tenant_id = TenantId::generate();
    let tenant = Tenant::create(&state.pool, tenant_id.as_str(), name, body.tag, None).await?;

    state
        .access
        .ensure_organization(&tenant_id, Some(name))
        .await?;
    state
        .access
        .provision_admin_users_to_new_tenant(&tenant_id)
        .await?;

    tracing::info!(tenant_id = %tenant_id, "Tenant created");
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// `DELETE /tenants/:tenantId`
pub async fn delete_tenant(
    State(state): State<MembersApiState>,
    Path(tenant_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;

    if tenant_id.is_system() {
        return Err(ApiError::SystemTenantProtected {
            operation: MemberOperation::Remove,
            tenant_id: tenant_id.to_string(),
        });
    }

    let removed = Tenant::delete(&state.pool, tenant_id.as_str()).await?;
    if !removed {
        return Err(ApiError::Authz(tessera_authz::AuthzError::NotFound(format!(
            "tenant {tenant_id}"
        ))));
    }

    // The mirror organization has no life of its own.
    let org_id = tessera_core::OrganizationId::for_tenant(&tenant_id);
    Organization::delete(state.access.admin_pool(), org_id.as_str()).await?;

    tracing::info!(tenant_id = %tenant_id, "Tenant deleted");
    Ok(StatusCode::NO_CONTENT)
}
