//! Organization-based tenant access control.
//!
//! The admin tenant mirrors every managed tenant with one organization;
//! membership of that organization is what grants a user access to the
//! tenant. This crate manages memberships, roles and invitations (with the
//! last-admin protection), derives per-tenant permissions from organization
//! scopes, and resolves OAuth resource indicators to scope sets.

pub mod access;
pub mod error;
pub mod invitations;
pub mod resource;
pub mod roles;
pub mod scopes;

pub use access::{OrganizationAccessControl, Page};
pub use error::AuthzError;
pub use resource::{
    ReservedResource, ResolvedResource, ResourceIndicator, ResourceScopeResolver, ScopeQuery,
    ME_API_INDICATOR,
};
pub use roles::scopes_for_role;
pub use scopes::{tenant_permission_for_scope, MemberOperation};
