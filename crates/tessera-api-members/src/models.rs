//! Request and response shapes for the member-management surface.

use serde::{Deserialize, Serialize};
use tessera_db::models::{OrganizationRole, TenantTag};
use uuid::Uuid;

/// Body of `POST /tenants`.
#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    /// Human-readable tenant name.
    pub name: String,
    /// Deployment tag; defaults to development.
    #[serde(default)]
    pub tag: TenantTag,
}

/// Body of `POST /tenants/:tenantId/members`.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add.
    pub user_id: Uuid,
    /// Role to grant; defaults to collaborator.
    #[serde(default = "default_role")]
    pub role: OrganizationRole,
}

/// Body of `PUT /tenants/:tenantId/members/:userId/role`.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role.
    pub role: OrganizationRole,
}

/// Body of `POST /tenants/:tenantId/invitations`.
#[derive(Debug, Deserialize)]
pub struct CreateInvitationsRequest {
    /// Invitee email addresses.
    pub invitees: Vec<String>,
    /// Role bound to each invitation; defaults to collaborator.
    #[serde(default = "default_role")]
    pub role: OrganizationRole,
}

fn default_role() -> OrganizationRole {
    OrganizationRole::Collaborator
}

/// Pagination and search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size.
    pub page_size: Option<i64>,
    /// Search term (member listings only).
    pub q: Option<String>,
}

/// A paginated response envelope.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    /// The page of items.
    pub data: Vec<T>,
    /// Total item count.
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_member_defaults_to_collaborator() {
        let body: AddMemberRequest = serde_json::from_str(
            r#"{"user_id": "550e8400-e29b-41d4-a716-446655440000"}"#,
        )
        .unwrap();
        assert_eq!(body.role, OrganizationRole::Collaborator);
    }

    #[test]
    fn create_invitations_parses_roles() {
        let body: CreateInvitationsRequest = serde_json::from_str(
            r#"{"invitees": ["a@acme.com"], "role": "admin"}"#,
        )
        .unwrap();
        assert_eq!(body.role, OrganizationRole::Admin);
        assert_eq!(body.invitees.len(), 1);
    }
}
