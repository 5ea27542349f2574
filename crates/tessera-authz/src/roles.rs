//! Organization roles and the scopes they grant.

use tessera_db::models::OrganizationRole;

/// Organization scopes granted by a role.
///
/// These are the scopes carried by admin-issued organization tokens; the
/// mapping to per-tenant permissions lives in [`crate::scopes`].
#[must_use]
pub fn scopes_for_role(role: OrganizationRole) -> &'static [&'static str] {
    match role {
        OrganizationRole::Admin => &[
            "read:data",
            "write:data",
            "delete:data",
            "read:member",
            "invite:member",
            "remove:member",
            "update:member:role",
            "manage:tenant",
        ],
        OrganizationRole::Collaborator => &["read:data", "write:data", "delete:data", "read:member"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_member_management_scopes() {
        let scopes = scopes_for_role(OrganizationRole::Admin);
        assert!(scopes.contains(&"invite:member"));
        assert!(scopes.contains(&"remove:member"));
        assert!(scopes.contains(&"manage:tenant"));
    }

    #[test]
    fn collaborator_cannot_manage_members() {
        let scopes = scopes_for_role(OrganizationRole::Collaborator);
        assert!(scopes.contains(&"read:member"));
        assert!(!scopes.contains(&"remove:member"));
        assert!(!scopes.contains(&"manage:tenant"));
    }
}
