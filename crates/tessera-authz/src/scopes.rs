//! Scope-to-permission mapping and member-management operations.
//!
//! Organization scopes (what a membership grants inside the admin tenant)
//! translate deterministically to per-tenant permission names. Unknown
//! scopes pass through unchanged rather than being dropped, so custom
//! scopes added to the organization template are never silently lost.

use serde::Serialize;

/// Coarse tenant-management scopes carried by cloud-level tokens.
pub mod coarse {
    /// Read access to any tenant.
    pub const READ_TENANT: &str = "read:tenant";
    /// Write access to any tenant.
    pub const WRITE_TENANT: &str = "write:tenant";
    /// Destructive access to any tenant.
    pub const DELETE_TENANT: &str = "delete:tenant";
}

/// Map an organization scope to the tenant permission it grants.
#[must_use]
pub fn tenant_permission_for_scope(scope: &str) -> String {
    match scope {
        "read:member" => "read:tenant_members".to_string(),
        "invite:member" => "invite:tenant_members".to_string(),
        "remove:member" => "remove:tenant_members".to_string(),
        "update:member:role" => "update:tenant_member_roles".to_string(),
        "manage:tenant" => "manage:tenant".to_string(),
        // Unknown scopes pass through unchanged.
        other => other.to_string(),
    }
}

/// A member-management operation subject to the three-tier decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberOperation {
    Read,
    Invite,
    Remove,
    UpdateRole,
    ReadInvitations,
    CreateInvitations,
}

impl MemberOperation {
    /// Organization scopes that must *all* be present for tier-2 access.
    #[must_use]
    pub fn required_membership_scopes(self) -> &'static [&'static str] {
        match self {
            MemberOperation::Read | MemberOperation::ReadInvitations => &["read:member"],
            MemberOperation::Invite | MemberOperation::CreateInvitations => &["invite:member"],
            MemberOperation::Remove => &["remove:member"],
            MemberOperation::UpdateRole => &["update:member:role"],
        }
    }

    /// The coarse tenant-management scope granting tier-1 access.
    #[must_use]
    pub fn coarse_scope(self) -> &'static str {
        match self {
            MemberOperation::Read | MemberOperation::ReadInvitations => coarse::READ_TENANT,
            MemberOperation::Invite
            | MemberOperation::CreateInvitations
            | MemberOperation::UpdateRole => coarse::WRITE_TENANT,
            MemberOperation::Remove => coarse::DELETE_TENANT,
        }
    }

    /// Destructive operations are denied on system tenants regardless of
    /// any scope the caller holds.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(self, MemberOperation::Remove | MemberOperation::UpdateRole)
    }

    /// Wire name for diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemberOperation::Read => "read",
            MemberOperation::Invite => "invite",
            MemberOperation::Remove => "remove",
            MemberOperation::UpdateRole => "update-role",
            MemberOperation::ReadInvitations => "read-invitations",
            MemberOperation::CreateInvitations => "create-invitations",
        }
    }
}

impl std::fmt::Display for MemberOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_scopes_map_to_tenant_permissions() {
        assert_eq!(tenant_permission_for_scope("read:member"), "read:tenant_members");
        assert_eq!(
            tenant_permission_for_scope("update:member:role"),
            "update:tenant_member_roles"
        );
        assert_eq!(tenant_permission_for_scope("manage:tenant"), "manage:tenant");
    }

    #[test]
    fn unknown_scopes_pass_through() {
        assert_eq!(tenant_permission_for_scope("custom:thing"), "custom:thing");
    }

    #[test]
    fn operations_map_to_coarse_scopes() {
        assert_eq!(MemberOperation::Read.coarse_scope(), "read:tenant");
        assert_eq!(MemberOperation::Invite.coarse_scope(), "write:tenant");
        assert_eq!(MemberOperation::UpdateRole.coarse_scope(), "write:tenant");
        assert_eq!(MemberOperation::Remove.coarse_scope(), "delete:tenant");
    }

    #[test]
    fn only_remove_and_update_role_are_destructive() {
        assert!(MemberOperation::Remove.is_destructive());
        assert!(MemberOperation::UpdateRole.is_destructive());
        assert!(!MemberOperation::Read.is_destructive());
        assert!(!MemberOperation::CreateInvitations.is_destructive());
    }

    #[test]
    fn membership_scopes_per_operation() {
        assert_eq!(
            MemberOperation::CreateInvitations.required_membership_scopes(),
            &["invite:member"]
        );
        assert_eq!(
            MemberOperation::UpdateRole.required_membership_scopes(),
            &["update:member:role"]
        );
    }
}
