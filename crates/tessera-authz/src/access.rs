//! Organization access control over the admin tenant's store.
//!
//! Every query here runs against an explicit admin-tenant pool handle, even
//! when the surrounding request belongs to another tenant; there is no
//! ambient tenant context to switch. Mutations that can violate the
//! at-least-one-admin invariant lock the organization row first, so the
//! check and the write are atomic per organization.

use sqlx::PgPool;
use tessera_core::{OrganizationId, TenantId};
use tessera_db::models::{MemberRow, Organization, OrganizationMembership, OrganizationRole, User};

use crate::error::AuthzError;
use crate::roles::scopes_for_role;
use crate::scopes::tenant_permission_for_scope;

/// Pagination input for listing endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// 1-based page number.
    pub number: i64,
    /// Page size.
    pub size: i64,
}

impl Page {
    /// Default page size.
    pub const DEFAULT_SIZE: i64 = 20;

    /// First page with the default size.
    #[must_use]
    pub fn first() -> Self {
        Self {
            number: 1,
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Row offset of this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.number.max(1) - 1) * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}

/// The at-least-one-admin invariant, applied to a member holding `current`
/// whose membership is being removed (`new_role: None`) or changed.
///
/// Callers must read `admin_count` under the organization row lock so the
/// check and the write are atomic.
fn ensure_admin_remains(
    organization_id: &OrganizationId,
    current: OrganizationRole,
    new_role: Option<OrganizationRole>,
    admin_count: i64,
) -> Result<(), AuthzError> {
    let losing_admin =
        current == OrganizationRole::Admin && new_role != Some(OrganizationRole::Admin);
    if losing_admin && admin_count <= 1 {
        return Err(AuthzError::LastAdmin(organization_id.to_string()));
    }
    Ok(())
}

/// Manages tenant access through admin-tenant organizations.
#[derive(Clone)]
pub struct OrganizationAccessControl {
    admin_pool: PgPool,
}

impl OrganizationAccessControl {
    /// Create the service over the admin tenant's store.
    #[must_use]
    pub fn new(admin_pool: PgPool) -> Self {
        Self { admin_pool }
    }

    /// The admin tenant's pool, for collaborators that need the same
    /// explicit handle (resource scope resolution).
    #[must_use]
    pub fn admin_pool(&self) -> &PgPool {
        &self.admin_pool
    }

    /// Idempotent get-or-create of a tenant's mirror organization.
    ///
    /// The admin tenant's own organization is named "Admin tenant"; every
    /// other tenant's is "Tenant {name-or-id}".
    pub async fn ensure_organization(
        &self,
        tenant_id: &TenantId,
        tenant_name: Option<&str>,
    ) -> Result<OrganizationId, AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);
        let name = if tenant_id.is_admin() {
            "Admin tenant".to_string()
        } else {
            format!("Tenant {}", tenant_name.unwrap_or(tenant_id.as_str()))
        };

        Organization::get_or_create(&self.admin_pool, org_id.as_str(), &name)
            .await
            .map_err(|err| {
                tracing::error!(organization_id = %org_id, error = %err, "Organization creation failed");
                AuthzError::CreateFailed(format!("organization {org_id}"))
            })?;

        Ok(org_id)
    }

    /// Add a user as a member of a tenant's organization.
    ///
    /// Fails with a uniqueness violation if the user is already a member.
    pub async fn add_member(
        &self,
        tenant_id: &TenantId,
        user_id: uuid::Uuid,
        role: OrganizationRole,
    ) -> Result<(), AuthzError> {
        let org_id = self.ensure_organization(tenant_id, None).await?;

        let mut tx = self
            .admin_pool
            .begin()
            .await
            .map_err(tessera_db::DbError::from)?;
        Organization::lock_for_update(&mut tx, org_id.as_str()).await?;
        OrganizationMembership::insert(&mut tx, org_id.as_str(), user_id, role).await?;
        tx.commit().await.map_err(tessera_db::DbError::from)?;

        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, role = %role, "Member added");
        Ok(())
    }

    /// Remove a member from a tenant's organization.
    ///
    /// Rejects removal of the organization's last admin; the admin count is
    /// read under the organization row lock.
    pub async fn remove_member(
        &self,
        tenant_id: &TenantId,
        user_id: uuid::Uuid,
    ) -> Result<(), AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);

        let mut tx = self
            .admin_pool
            .begin()
            .await
            .map_err(tessera_db::DbError::from)?;
        Organization::lock_for_update(&mut tx, org_id.as_str()).await?;

        let membership = OrganizationMembership::find_in_tx(&mut tx, org_id.as_str(), user_id)
            .await?
            .ok_or_else(|| AuthzError::NotFound(format!("member {user_id}")))?;

        let admin_count = OrganizationMembership::count_admins(&mut tx, org_id.as_str()).await?;
        ensure_admin_remains(&org_id, membership.role, None, admin_count)?;

        OrganizationMembership::delete(&mut tx, org_id.as_str(), user_id).await?;
        tx.commit().await.map_err(tessera_db::DbError::from)?;

        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, "Member removed");
        Ok(())
    }

    /// Change a member's role.
    ///
    /// Downgrading the last admin is rejected under the same lock as
    /// removal.
    pub async fn update_role(
        &self,
        tenant_id: &TenantId,
        user_id: uuid::Uuid,
        new_role: OrganizationRole,
    ) -> Result<(), AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);

        let mut tx = self
            .admin_pool
            .begin()
            .await
            .map_err(tessera_db::DbError::from)?;
        Organization::lock_for_update(&mut tx, org_id.as_str()).await?;

        let membership = OrganizationMembership::find_in_tx(&mut tx, org_id.as_str(), user_id)
            .await?
            .ok_or_else(|| AuthzError::NotFound(format!("member {user_id}")))?;

        let admin_count = OrganizationMembership::count_admins(&mut tx, org_id.as_str()).await?;
        ensure_admin_remains(&org_id, membership.role, Some(new_role), admin_count)?;

        OrganizationMembership::update_role(&mut tx, org_id.as_str(), user_id, new_role).await?;
        tx.commit().await.map_err(tessera_db::DbError::from)?;

        tracing::info!(
            tenant_id = %tenant_id,
            user_id = %user_id,
            role = %new_role,
            "Member role updated"
        );
        Ok(())
    }

    /// Organization scopes a user holds for a tenant; empty if not a member.
    pub async fn get_scopes(
        &self,
        tenant_id: &TenantId,
        user_id: uuid::Uuid,
    ) -> Result<Vec<String>, AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);
        let membership =
            OrganizationMembership::find(&self.admin_pool, org_id.as_str(), user_id).await?;

        Ok(membership
            .map(|m| {
                scopes_for_role(m.role)
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Tenant permissions derived from the user's organization scopes.
    pub async fn get_permissions(
        &self,
        tenant_id: &TenantId,
        user_id: uuid::Uuid,
    ) -> Result<Vec<String>, AuthzError> {
        let scopes = self.get_scopes(tenant_id, user_id).await?;
        Ok(scopes
            .iter()
            .map(|s| tenant_permission_for_scope(s))
            .collect())
    }

    /// Paginated member listing joined with user data and role names.
    pub async fn list_members(
        &self,
        tenant_id: &TenantId,
        page: Page,
        search: Option<&str>,
    ) -> Result<(Vec<MemberRow>, i64), AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);
        let members = OrganizationMembership::list_members(
            &self.admin_pool,
            org_id.as_str(),
            page.size,
            page.offset(),
            search,
        )
        .await?;
        let total =
            OrganizationMembership::count_members(&self.admin_pool, org_id.as_str()).await?;
        Ok((members, total))
    }

    /// Provision every admin-tenant admin user as an Admin member of a new
    /// tenant's organization.
    ///
    /// Individual failures are logged and skipped; the batch never aborts.
    /// Returns the number of members provisioned.
    pub async fn provision_admin_users_to_new_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<usize, AuthzError> {
        self.ensure_organization(tenant_id, None).await?;

        let admins =
            User::find_admin_users(&self.admin_pool, tessera_core::ADMIN_TENANT_ID).await?;

        let mut provisioned = 0;
        for user in &admins {
            match self
                .add_member(tenant_id, user.id, OrganizationRole::Admin)
                .await
            {
                Ok(()) => provisioned += 1,
                Err(err) if err.is_unique_violation() => {
                    tracing::debug!(
                        tenant_id = %tenant_id,
                        user_id = %user.id,
                        "Admin user already a member; skipping"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        user_id = %user.id,
                        error = %err,
                        "Failed to provision admin user; continuing"
                    );
                }
            }
        }

        tracing::info!(
            tenant_id = %tenant_id,
            provisioned,
            candidates = admins.len(),
            "Admin users provisioned to new tenant"
        );
        Ok(provisioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets() {
        assert_eq!(Page::first().offset(), 0);
        assert_eq!(Page { number: 3, size: 20 }.offset(), 40);
        // Page numbers below 1 clamp to the first page.
        assert_eq!(Page { number: 0, size: 20 }.offset(), 0);
    }

    fn org() -> OrganizationId {
        OrganizationId::for_tenant(&"t1".parse().unwrap())
    }

    #[test]
    fn removing_the_last_admin_is_rejected() {
        let err = ensure_admin_remains(&org(), OrganizationRole::Admin, None, 1).unwrap_err();
        assert!(matches!(err, AuthzError::LastAdmin(_)));
    }

    #[test]
    fn removing_an_admin_with_a_second_admin_succeeds() {
        assert!(ensure_admin_remains(&org(), OrganizationRole::Admin, None, 2).is_ok());
    }

    #[test]
    fn removing_a_collaborator_never_trips_the_invariant() {
        assert!(ensure_admin_remains(&org(), OrganizationRole::Collaborator, None, 1).is_ok());
    }

    #[test]
    fn downgrading_the_last_admin_is_rejected() {
        let err = ensure_admin_remains(
            &org(),
            OrganizationRole::Admin,
            Some(OrganizationRole::Collaborator),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AuthzError::LastAdmin(_)));
    }

    #[test]
    fn keeping_the_admin_role_is_always_allowed() {
        assert!(ensure_admin_remains(
            &org(),
            OrganizationRole::Admin,
            Some(OrganizationRole::Admin),
            1
        )
        .is_ok());
    }
}
