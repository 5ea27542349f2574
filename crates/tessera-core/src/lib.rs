//! Core types shared across the Tessera identity platform.
//!
//! Provides strongly typed identifiers (tenant, organization, user,
//! invitation) and the machine-readable error codes surfaced by the
//! authorization core.

pub mod error;
pub mod ids;

pub use error::ErrorCode;
pub use ids::{
    InvitationId, OrganizationId, ParseIdError, TenantId, UserId, ADMIN_TENANT_ID,
    DEFAULT_TENANT_ID,
};
