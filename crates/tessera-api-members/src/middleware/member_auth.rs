//! Three-tier authorization for member-management operations.
//!
//! 1. System-tenant protection: destructive operations against the admin or
//!    default tenant are denied no matter what the caller holds.
//! 2. Blanket scope: the wildcard scope, or the coarse tenant-management
//!    scope mapped to the operation, grants access to any tenant.
//! 3. Membership scope: otherwise the caller's per-tenant organization
//!    scopes must contain every scope the operation requires.

use tessera_auth::Principal;
use tessera_authz::{MemberOperation, OrganizationAccessControl};
use tessera_core::TenantId;
use uuid::Uuid;

use crate::error::ApiError;

/// The member-operation authorization decision.
#[derive(Clone)]
pub struct TenantMemberAuth {
    access: OrganizationAccessControl,
}

impl TenantMemberAuth {
    /// Create the decision layer over the access-control service.
    #[must_use]
    pub fn new(access: OrganizationAccessControl) -> Self {
        Self { access }
    }

    /// Authorize one operation against one tenant.
    pub async fn authorize(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
        operation: MemberOperation,
    ) -> Result<(), ApiError> {
        // Tier 3 first: no scope overrides system-tenant protection.
        if operation.is_destructive() && tenant_id.is_system() {
            tracing::warn!(
                tenant_id = %tenant_id,
                operation = operation.as_str(),
                principal = %principal.id,
                "Destructive operation on system tenant denied"
            );
            return Err(ApiError::SystemTenantProtected {
                operation,
                tenant_id: tenant_id.to_string(),
            });
        }

        // Tier 1: blanket management scopes grant any tenant.
        if principal.has_all_scope() || principal.has_scope(operation.coarse_scope()) {
            return Ok(());
        }

        // Tier 2: per-tenant membership scopes, users only.
        let required = operation.required_membership_scopes();
        let held = match principal.id.parse::<Uuid>() {
            Ok(user_id) => self.access.get_scopes(tenant_id, user_id).await?,
            // Machine principals have no membership; nothing is held.
            Err(_) => Vec::new(),
        };

        let missing = required
            .iter()
            .any(|scope| !held.iter().any(|h| h.as_str() == *scope));
        if missing {
            return Err(ApiError::InsufficientScope {
                operation,
                tenant_id: tenant_id.to_string(),
                required_scopes: required.iter().map(|s| (*s).to_string()).collect(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tessera_auth::PrincipalKind;

    fn auth() -> TenantMemberAuth {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool");
        TenantMemberAuth::new(OrganizationAccessControl::new(pool))
    }

    fn principal(scopes: &[&str]) -> Principal {
        Principal {
            kind: PrincipalKind::User,
            id: Uuid::new_v4().to_string(),
            client_id: None,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect::<HashSet<_>>(),
        }
    }

    #[tokio::test]
    async fn wildcard_scope_grants_any_tenant() {
        let result = auth()
            .authorize(
                &principal(&["all"]),
                &"t1".parse().unwrap(),
                MemberOperation::Read,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn coarse_scope_maps_per_operation() {
        let a = auth();
        let tenant: TenantId = "t1".parse().unwrap();

        assert!(a
            .authorize(&principal(&["read:tenant"]), &tenant, MemberOperation::Read)
            .await
            .is_ok());
        assert!(a
            .authorize(
                &principal(&["write:tenant"]),
                &tenant,
                MemberOperation::Invite
            )
            .await
            .is_ok());
        assert!(a
            .authorize(
                &principal(&["delete:tenant"]),
                &tenant,
                MemberOperation::Remove
            )
            .await
            .is_ok());
        // A read-only coarse scope does not grant removal; tier 2 then
        // reports the missing membership scopes.
        let err = a
            .authorize(
                &principal(&["read:tenant"]),
                &tenant,
                MemberOperation::Remove,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InsufficientScope { .. }));
    }

    #[tokio::test]
    async fn system_tenant_protection_beats_wildcard() {
        let a = auth();
        for tenant in ["admin", "default"] {
            let err = a
                .authorize(
                    &principal(&["all"]),
                    &tenant.parse().unwrap(),
                    MemberOperation::Remove,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::SystemTenantProtected { .. }));
        }
    }

    #[tokio::test]
    async fn system_tenant_reads_are_still_allowed() {
        let result = auth()
            .authorize(
                &principal(&["all"]),
                &"admin".parse().unwrap(),
                MemberOperation::Read,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn machine_principal_without_blanket_scope_is_forbidden() {
        let machine = Principal {
            kind: PrincipalKind::Application,
            id: "m2m-app".to_string(),
            client_id: Some("m2m-app".to_string()),
            scopes: HashSet::new(),
        };
        let err = auth()
            .authorize(&machine, &"t1".parse().unwrap(), MemberOperation::Read)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InsufficientScope { .. }));
    }
}
