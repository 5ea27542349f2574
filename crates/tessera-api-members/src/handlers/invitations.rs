//! Invitation handlers.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tessera_auth::Principal;
use tessera_authz::{MemberOperation, Page};
use tessera_db::models::{InvitationStatus, OrganizationInvitation};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::parse_tenant;
use crate::models::{CreateInvitationsRequest, ListQuery, Paged};
use crate::router::MembersApiState;

/// `GET /tenants/:tenantId/invitations`
pub async fn list_invitations(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paged<OrganizationInvitation>>, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::ReadInvitations)
        .await?;

    let page = Page {
        number: query.page.unwrap_or(1),
        size: query.page_size.unwrap_or(Page::DEFAULT_SIZE),
    };
    let (data, total) = state.access.list_invitations(&tenant_id, page).await?;
    Ok(Json(Paged { data, total }))
}

/// `POST /tenants/:tenantId/invitations`
pub async fn create_invitations(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path(tenant_id): Path<String>,
    Json(body): Json<CreateInvitationsRequest>,
) -> Result<(StatusCode, Json<Vec<OrganizationInvitation>>), ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::CreateInvitations)
        .await?;

    if body.invitees.is_empty() {
        return Err(ApiError::Validation("invitees must not be empty".to_string()));
    }
    if let Some(bad) = body.invitees.iter().find(|email| !email.contains('@')) {
        return Err(ApiError::Validation(format!(
            "'{bad}' is not an email address"
        )));
    }

    let inviter_id = principal
        .id
        .parse::<Uuid>()
        .map_err(|_| ApiError::Validation("inviter must be a user".to_string()))?;

    let created = state
        .access
        .create_invitations(&tenant_id, &body.invitees, body.role, inviter_id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /tenants/:tenantId/invitations/:invitationId`: finalize the
/// invitation into a terminal state.
pub async fn update_invitation_status(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path((tenant_id, invitation_id)): Path<(String, Uuid)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<OrganizationInvitation>, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::CreateInvitations)
        .await?;

    let status: InvitationStatus = body
        .get("status")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(|| ApiError::Validation("status is required".to_string()))?;
    if status == InvitationStatus::Pending {
        return Err(ApiError::Validation(
            "an invitation cannot return to pending".to_string(),
        ));
    }

    let updated = state
        .access
        .transition_invitation(&tenant_id, invitation_id, status)
        .await?;
    Ok(Json(updated))
}

/// `DELETE /tenants/:tenantId/invitations/:invitationId`
pub async fn revoke_invitation(
    State(state): State<MembersApiState>,
    Extension(principal): Extension<Principal>,
    Path((tenant_id, invitation_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let tenant_id = parse_tenant(&tenant_id)?;
    state
        .member_auth
        .authorize(&principal, &tenant_id, MemberOperation::CreateInvitations)
        .await?;

    state
        .access
        .revoke_invitation(&tenant_id, invitation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
