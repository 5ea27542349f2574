//! Member-management HTTP surface.
//!
//! Routes for tenants, members and invitations, guarded by bearer-token
//! authentication and the three-tier member authorization decision:
//! blanket management scopes, per-tenant membership scopes, and
//! system-tenant protection.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;

pub use error::ApiError;
pub use middleware::member_auth::TenantMemberAuth;
pub use router::{members_router, MembersApiState};
