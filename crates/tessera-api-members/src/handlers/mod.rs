//! Route handlers for the member-management surface.

pub mod invitations;
pub mod members;
pub mod tenants;

use tessera_core::TenantId;

use crate::error::ApiError;

/// Parse a tenant path parameter.
pub(crate) fn parse_tenant(raw: &str) -> Result<TenantId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("'{raw}' is not a valid tenant id")))
}
