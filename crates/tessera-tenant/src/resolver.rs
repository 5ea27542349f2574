//! Request-time tenant resolution.
//!
//! Resolution order: admin endpoint, development override, single-tenant
//! mode, custom domain, then path- or domain-based extraction. A request
//! that matches nothing resolves to `None`, which callers must treat as a
//! 404-class condition rather than defaulting.

use http::Uri;
use sqlx::PgPool;
use tessera_core::TenantId;

use crate::config::{ResolverConfig, TenancyMode};
use crate::domain_cache::DomainCache;
use crate::error::TenantError;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    /// The owning tenant.
    pub tenant_id: TenantId,
    /// Whether the request arrived on a custom domain.
    pub is_custom_domain: bool,
}

impl ResolvedTenant {
    fn endpoint(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            is_custom_domain: false,
        }
    }

    fn custom_domain(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            is_custom_domain: true,
        }
    }
}

/// Resolves the owning tenant of a request URL.
#[derive(Clone)]
pub struct TenantResolver {
    config: ResolverConfig,
    domain_cache: DomainCache,
    pool: PgPool,
}

impl TenantResolver {
    /// Create a resolver over the shared domain cache and domain store.
    #[must_use]
    pub fn new(config: ResolverConfig, domain_cache: DomainCache, pool: PgPool) -> Self {
        Self {
            config,
            domain_cache,
            pool,
        }
    }

    /// The shared domain cache, for wiring invalidation hooks.
    #[must_use]
    pub fn domain_cache(&self) -> &DomainCache {
        &self.domain_cache
    }

    /// Resolve the owning tenant of a request URL.
    ///
    /// Returns `Ok(None)` when no tenant matches; storage failures during
    /// custom-domain lookup propagate as errors rather than resolving to a
    /// wrong tenant.
    pub async fn resolve(&self, url: &Uri) -> Result<Option<ResolvedTenant>, TenantError> {
        // 1. Admin endpoint.
        if self.config.admin_endpoint.matches_host(url) {
            return Ok(Some(ResolvedTenant::endpoint(TenantId::admin())));
        }

        // 2. Development override, never reachable in production.
        if let Some(tenant_id) = self.config.effective_dev_override() {
            return Ok(Some(ResolvedTenant::endpoint(tenant_id.clone())));
        }

        // 3. Multi-tenancy disabled.
        if matches!(self.config.mode, TenancyMode::SingleTenant) {
            return Ok(Some(ResolvedTenant::endpoint(TenantId::default_tenant())));
        }

        // 4. Custom domain, before endpoint-shaped matching.
        if self.config.custom_domains_enabled {
            if let Some(host) = url.host() {
                if let Some(tenant_id) = self.domain_cache.resolve(&self.pool, host).await? {
                    match tenant_id.parse::<TenantId>() {
                        Ok(id) => return Ok(Some(ResolvedTenant::custom_domain(id))),
                        Err(_) => {
                            tracing::warn!(
                                domain = %host,
                                tenant_id = %tenant_id,
                                "Custom domain bound to malformed tenant id; ignoring"
                            );
                        }
                    }
                }
            }
        }

        // 5/6. Endpoint-shaped extraction.
        let resolved = match &self.config.mode {
            TenancyMode::SingleTenant => None,
            TenancyMode::PathBased { base_endpoints } => base_endpoints
                .iter()
                .find_map(|ep| ep.first_segment_after_prefix(url))
                .and_then(|segment| segment.parse::<TenantId>().ok()),
            TenancyMode::DomainBased { domain_suffix } => {
                self.match_wildcard_host(url, domain_suffix)
            }
        };

        Ok(resolved.map(ResolvedTenant::endpoint))
    }

    /// Match `<tenant>.<suffix>` against the request host.
    ///
    /// The captured segment must be a single DNS label with a valid tenant
    /// shape, and rebuilding that tenant's endpoint host must reproduce the
    /// request host exactly. A decoy like `evil.t1.tessera.app` captures
    /// `evil.t1`, fails the single-label check, and is rejected.
    fn match_wildcard_host(&self, url: &Uri, domain_suffix: &str) -> Option<TenantId> {
        let host = url.host()?.to_lowercase();
        let captured = host.strip_suffix(&format!(".{}", domain_suffix.to_lowercase()))?;

        if captured.is_empty() || captured.contains('.') {
            return None;
        }
        let tenant_id: TenantId = captured.parse().ok()?;

        let expected_host = format!("{tenant_id}.{}", domain_suffix.to_lowercase());
        if expected_host != host {
            return None;
        }

        Some(tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoint;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool")
    }

    fn config(mode: TenancyMode) -> ResolverConfig {
        ResolverConfig {
            admin_endpoint: Endpoint::parse("https://admin.tessera.app").unwrap(),
            mode,
            dev_tenant_override: None,
            is_production: true,
            is_integration_test: false,
            custom_domains_enabled: true,
        }
    }

    fn resolver(config: ResolverConfig) -> TenantResolver {
        TenantResolver::new(config, DomainCache::new(), lazy_pool())
    }

    #[tokio::test]
    async fn admin_endpoint_resolves_to_admin_tenant() {
        let r = resolver(config(TenancyMode::PathBased {
            base_endpoints: vec![Endpoint::parse("https://auth.tessera.app").unwrap()],
        }));
        let url: Uri = "https://admin.tessera.app/api/tenants".parse().unwrap();

        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert!(resolved.tenant_id.is_admin());
        assert!(!resolved.is_custom_domain);
    }

    #[tokio::test]
    async fn dev_override_applies_outside_production() {
        let mut cfg = config(TenancyMode::PathBased {
            base_endpoints: vec![],
        });
        cfg.is_production = false;
        cfg.dev_tenant_override = Some("devtenant".parse().unwrap());
        let r = resolver(cfg);

        let url: Uri = "https://whatever.example.com/x".parse().unwrap();
        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert_eq!(resolved.tenant_id.as_str(), "devtenant");
    }

    #[tokio::test]
    async fn dev_override_is_ignored_in_production() {
        let mut cfg = config(TenancyMode::SingleTenant);
        cfg.dev_tenant_override = Some("devtenant".parse().unwrap());
        let r = resolver(cfg);

        let url: Uri = "https://whatever.example.com/x".parse().unwrap();
        let resolved = r.resolve(&url).await.unwrap().unwrap();
        // Falls through to single-tenant mode instead of the override.
        assert_eq!(resolved.tenant_id, TenantId::default_tenant());
    }

    #[tokio::test]
    async fn single_tenant_mode_returns_default() {
        let r = resolver(config(TenancyMode::SingleTenant));
        let url: Uri = "https://anything.example.com/api".parse().unwrap();

        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert_eq!(resolved.tenant_id, TenantId::default_tenant());
        assert!(!resolved.is_custom_domain);
    }

    #[tokio::test]
    async fn cached_custom_domain_wins_over_path() {
        let r = resolver(config(TenancyMode::PathBased {
            base_endpoints: vec![Endpoint::parse("https://id.acme.com").unwrap()],
        }));
        r.domain_cache().insert("id.acme.com", "t42").await;

        let url: Uri = "https://id.acme.com/t1/oidc/auth".parse().unwrap();
        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert_eq!(resolved.tenant_id.as_str(), "t42");
        assert!(resolved.is_custom_domain);
    }

    #[tokio::test]
    async fn path_based_extraction() {
        let mut cfg = config(TenancyMode::PathBased {
            base_endpoints: vec![Endpoint::parse("https://auth.tessera.app").unwrap()],
        });
        cfg.custom_domains_enabled = false;
        let r = resolver(cfg);

        let url: Uri = "https://auth.tessera.app/t1/oidc/token".parse().unwrap();
        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert_eq!(resolved.tenant_id.as_str(), "t1");
        assert!(!resolved.is_custom_domain);
    }

    #[tokio::test]
    async fn domain_based_extraction() {
        let mut cfg = config(TenancyMode::DomainBased {
            domain_suffix: "tessera.app".to_string(),
        });
        cfg.custom_domains_enabled = false;
        let r = resolver(cfg);

        let url: Uri = "https://t1.tessera.app/api/users".parse().unwrap();
        let resolved = r.resolve(&url).await.unwrap().unwrap();
        assert_eq!(resolved.tenant_id.as_str(), "t1");
    }

    #[tokio::test]
    async fn decoy_subdomain_is_rejected() {
        let mut cfg = config(TenancyMode::DomainBased {
            domain_suffix: "tessera.app".to_string(),
        });
        cfg.custom_domains_enabled = false;
        let r = resolver(cfg);

        let url: Uri = "https://evil.t1.tessera.app/api/users".parse().unwrap();
        assert_eq!(r.resolve(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unrelated_host_resolves_to_none() {
        let mut cfg = config(TenancyMode::DomainBased {
            domain_suffix: "tessera.app".to_string(),
        });
        cfg.custom_domains_enabled = false;
        let r = resolver(cfg);

        let url: Uri = "https://elsewhere.example.net/api".parse().unwrap();
        assert_eq!(r.resolve(&url).await.unwrap(), None);
    }

    #[tokio::test]
    async fn no_path_segment_resolves_to_none() {
        let mut cfg = config(TenancyMode::PathBased {
            base_endpoints: vec![Endpoint::parse("https://auth.tessera.app").unwrap()],
        });
        cfg.custom_domains_enabled = false;
        let r = resolver(cfg);

        let url: Uri = "https://auth.tessera.app/".parse().unwrap();
        assert_eq!(r.resolve(&url).await.unwrap(), None);
    }
}
