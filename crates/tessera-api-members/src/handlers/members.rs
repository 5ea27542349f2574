//! Member-management handlers.
//!
//! Every handler runs the three-tier authorization decision before touching
//! the access-control service.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tessera_auth::Principal;
use tessera_authz::{MemberOperation, Page};
use tessera_db::models::MemberRow;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::parse_tenant;
use crate::models::{AddMemberRequest, ListQuery, Paged, UpdateRoleRequest};
use crate::router::MembersApiState;

fn page_from(query: &ListQuery) -> Page {
    Page {
        number: query.page.unwrap_or(1),
        size: query.page_size.unwrap_or(Page::DEFAULT_SIZE),
    }
}

/// `GET /tenants/:tenantId/members`
pub async fn list_members(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paged<MemberRow>>, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::Read)
        .await?;

    let (data, total) = state
        .access
        .list_members(&tenant_id, page_from(&query), query.q.as_deref())
        .await?;
    Ok(Json(Paged { data, total }))
}

/// `POST /tenants/:tenantId/members`
pub async fn add_member(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path(tenant_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::Invite)
        .await?;

    state
        .access
        .add_member(&tenant_id, body.user_id, body.role)
        .await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /tenants/:tenantId/members/:userId`
pub async fn remove_member(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path((tenant_id, user_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::Remove)
        .await?;

    state.access.remove_member(&tenant_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /tenants/:tenantId/members/:userId/role`
pub async fn update_member_role(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path((tenant_id, user_id)): Path<(String, Uuid)>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<StatusCode, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::UpdateRole)
        .await?;

    state
        .access
        .update_role(&tenant_id, user_id, body.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
