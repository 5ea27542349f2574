//! Tenant resolution and per-tenant state.
//!
//! Given a request URL, [`TenantResolver`] decides which tenant owns the
//! request (by admin endpoint, custom domain, URL path, or wildcard
//! subdomain) and whether it arrived on a custom domain. Resolved tenants
//! are served from a shared [`TenantStateMap`] that refcounts in-flight
//! requests so teardown can drain before releasing tenant resources.

pub mod config;
pub mod domain_cache;
pub mod domains;
pub mod error;
pub mod resolver;
pub mod state;

pub use config::{Endpoint, ResolverConfig, TenancyMode};
pub use domain_cache::DomainCache;
pub use domains::CustomDomainService;
pub use error::TenantError;
pub use resolver::{ResolvedTenant, TenantResolver};
pub use state::{LocalKey, TenantGuard, TenantState, TenantStateMap};
