//! Invitation lifecycle operations.
//!
//! Invitations live in the admin tenant's store alongside the organizations
//! they belong to. Creation binds the requested role and the fixed 7-day
//! expiry; state transitions are one-directional out of `Pending`.

use tessera_core::{OrganizationId, TenantId};
use tessera_db::models::{InvitationStatus, OrganizationInvitation, OrganizationRole};
use uuid::Uuid;

use crate::access::{OrganizationAccessControl, Page};
use crate::error::AuthzError;

impl OrganizationAccessControl {
    /// Create a `Pending` invitation for an email address.
    ///
    /// A duplicate active invitation to the same email surfaces as a
    /// uniqueness violation.
    pub async fn create_invitation(
        &self,
        tenant_id: &TenantId,
        invitee: &str,
        role: OrganizationRole,
        inviter_id: Uuid,
    ) -> Result<OrganizationInvitation, AuthzError> {
        let org_id = self.ensure_organization(tenant_id, None).await?;

        let invitation = OrganizationInvitation::create(
            self.admin_pool(),
            org_id.as_str(),
            invitee,
            inviter_id,
            &[role.to_string()],
        )
        .await?;

        tracing::info!(
            tenant_id = %tenant_id,
            invitation_id = %invitation.id,
            "Invitation created"
        );
        Ok(invitation)
    }

    /// Create invitations for a batch of email addresses.
    ///
    /// Per-item isolation: a duplicate active invitation (or any other
    /// per-item failure) is logged and skipped, unless the batch contains
    /// exactly one address, in which case the failure propagates.
    pub async fn create_invitations(
        &self,
        tenant_id: &TenantId,
        invitees: &[String],
        role: OrganizationRole,
        inviter_id: Uuid,
    ) -> Result<Vec<OrganizationInvitation>, AuthzError> {
        if let [only] = invitees {
            return Ok(vec![
                self.create_invitation(tenant_id, only, role, inviter_id)
                    .await?,
            ]);
        }

        let mut created = Vec::with_capacity(invitees.len());
        for invitee in invitees {
            match self
                .create_invitation(tenant_id, invitee, role, inviter_id)
                .await
            {
                Ok(invitation) => created.push(invitation),
                Err(err) if err.is_unique_violation() => {
                    tracing::debug!(
                        tenant_id = %tenant_id,
                        invitee = %invitee,
                        "Active invitation already exists; skipping"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        invitee = %invitee,
                        error = %err,
                        "Failed to create invitation; continuing"
                    );
                }
            }
        }
        Ok(created)
    }

    /// Paginated invitation listing.
    pub async fn list_invitations(
        &self,
        tenant_id: &TenantId,
        page: Page,
    ) -> Result<(Vec<OrganizationInvitation>, i64), AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);
        let invitations = OrganizationInvitation::list_by_organization(
            self.admin_pool(),
            org_id.as_str(),
            page.size,
            page.offset(),
        )
        .await?;
        let total =
            OrganizationInvitation::count_by_organization(self.admin_pool(), org_id.as_str())
                .await?;
        Ok((invitations, total))
    }

    /// Move a `Pending` invitation into a terminal state.
    ///
    /// Fails with `entity.not_found` for an unknown invitation and with
    /// `entity.db_constraint_violated` when the invitation is already in a
    /// terminal state.
    pub async fn transition_invitation(
        &self,
        tenant_id: &TenantId,
        invitation_id: Uuid,
        to: InvitationStatus,
    ) -> Result<OrganizationInvitation, AuthzError> {
        let org_id = OrganizationId::for_tenant(tenant_id);

        if let Some(updated) =
            OrganizationInvitation::transition(self.admin_pool(), org_id.as_str(), invitation_id, to)
                .await?
        {
            return Ok(updated);
        }

        // Distinguish "absent" from "already finalized".
        match OrganizationInvitation::find_by_id(self.admin_pool(), org_id.as_str(), invitation_id)
            .await?
        {
            Some(_) => Err(AuthzError::InvitationFinalized(invitation_id.to_string())),
            None => Err(AuthzError::NotFound(format!("invitation {invitation_id}"))),
        }
    }

    /// Revoke a `Pending` invitation.
    pub async fn revoke_invitation(
        &self,
        tenant_id: &TenantId,
        invitation_id: Uuid,
    ) -> Result<OrganizationInvitation, AuthzError> {
        self.transition_invitation(tenant_id, invitation_id, InvitationStatus::Revoked)
            .await
    }
}
