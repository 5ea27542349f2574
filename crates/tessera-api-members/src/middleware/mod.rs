//! Request middleware: bearer authentication and member authorization.

pub mod bearer;
pub mod member_auth;

pub use bearer::{authenticate, require_management_scope};
pub use member_auth::TenantMemberAuth;
