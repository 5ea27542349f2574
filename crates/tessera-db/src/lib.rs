//! Postgres persistence for the Tessera authorization core.
//!
//! Each model is a `sqlx::FromRow` struct with inherent async query methods.
//! Cross-tenant management shapes (organizations, memberships, invitations)
//! live in the admin tenant's store; token and session shapes are partitioned
//! by `tenant_id`.

pub mod error;
pub mod models;

pub use error::DbError;
