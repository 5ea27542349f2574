//! Data models for the Tessera authorization core.

pub mod custom_domain;
pub mod jwt_blacklist;
pub mod oidc_model;
pub mod organization;
pub mod organization_invitation;
pub mod organization_membership;
pub mod resource;
pub mod tenant;
pub mod user;

pub use custom_domain::{CustomDomain, DomainStatus};
pub use jwt_blacklist::{CreateBlacklistEntry, JwtBlacklistEntry};
pub use oidc_model::{OidcModelInstance, REFRESH_TOKEN_REUSE_LEEWAY_SECS};
pub use organization::Organization;
pub use organization_invitation::{InvitationStatus, OrganizationInvitation};
pub use organization_membership::{MemberRow, OrganizationMembership, OrganizationRole};
pub use resource::{ApiResource, ApplicationConsent, ResourceScopeGrant};
pub use tenant::{Tenant, TenantTag};
pub use user::User;
