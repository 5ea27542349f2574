//! Resolver configuration.
//!
//! All deployment knobs are explicit constructor inputs; there is no ambient
//! global configuration lookup anywhere in the crate.

use http::Uri;
use tessera_core::TenantId;

/// A configured endpoint origin, e.g. `https://auth.example.com`.
///
/// Comparison is scheme-insensitive but host- and port-exact; an optional
/// path prefix participates in path-based tenant extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
    path_prefix: String,
}

impl Endpoint {
    /// Parse an endpoint from an origin string.
    ///
    /// Returns `None` when the string has no host.
    #[must_use]
    pub fn parse(origin: &str) -> Option<Self> {
        let uri: Uri = origin.parse().ok()?;
        let host = uri.host()?.to_lowercase();
        let path = uri.path().trim_end_matches('/').to_string();
        Some(Self {
            host,
            port: uri.port_u16(),
            path_prefix: path,
        })
    }

    /// The endpoint host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether a request URI targets this endpoint's host and port.
    #[must_use]
    pub fn matches_host(&self, uri: &Uri) -> bool {
        uri.host()
            .is_some_and(|h| h.eq_ignore_ascii_case(&self.host))
            && uri.port_u16() == self.port
    }

    /// The path segment immediately following this endpoint's path prefix,
    /// when the URI targets this endpoint.
    #[must_use]
    pub fn first_segment_after_prefix<'a>(&self, uri: &'a Uri) -> Option<&'a str> {
        if !self.matches_host(uri) {
            return None;
        }
        let rest = uri.path().strip_prefix(self.path_prefix.as_str())?;
        // "/idpx/t1" must not match a "/idp" prefix.
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let segment = rest.split('/').next().unwrap_or("");
        (!segment.is_empty()).then_some(segment)
    }
}

/// How tenants are told apart in a multi-tenant deployment.
#[derive(Debug, Clone)]
pub enum TenancyMode {
    /// Multi-tenancy disabled; everything belongs to the default tenant.
    SingleTenant,
    /// Tenant ID is the first path segment after a configured base endpoint.
    PathBased {
        /// Base endpoints tenants are served under.
        base_endpoints: Vec<Endpoint>,
    },
    /// Tenant ID is the captured label of a wildcard host pattern.
    DomainBased {
        /// Suffix the wildcard covers, e.g. `tessera.app` for `*.tessera.app`.
        domain_suffix: String,
    },
}

/// Configuration for [`crate::TenantResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The admin console/API endpoint; matching requests resolve to the
    /// admin tenant.
    pub admin_endpoint: Endpoint,

    /// Tenancy mode for non-admin requests.
    pub mode: TenancyMode,

    /// Development/integration-test tenant override. Ignored in production.
    pub dev_tenant_override: Option<TenantId>,

    /// Whether the process is flagged production.
    pub is_production: bool,

    /// Whether the process is running under integration tests.
    pub is_integration_test: bool,

    /// Whether the custom-domain feature is available in this deployment.
    pub custom_domains_enabled: bool,
}

impl ResolverConfig {
    /// The development override, if it is allowed to take effect.
    ///
    /// The bypass is unreachable when the process is flagged production and
    /// is not under integration tests.
    #[must_use]
    pub fn effective_dev_override(&self) -> Option<&TenantId> {
        if self.is_production && !self.is_integration_test {
            return None;
        }
        self.dev_tenant_override.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parse_and_host_match() {
        let ep = Endpoint::parse("https://auth.example.com").unwrap();
        assert_eq!(ep.host(), "auth.example.com");
        let uri: Uri = "https://auth.example.com/t1/api/users".parse().unwrap();
        assert!(ep.matches_host(&uri));
        let other: Uri = "https://other.example.com/t1".parse().unwrap();
        assert!(!ep.matches_host(&other));
    }

    #[test]
    fn endpoint_port_must_match() {
        let ep = Endpoint::parse("http://localhost:3001").unwrap();
        let same: Uri = "http://localhost:3001/t1".parse().unwrap();
        let different: Uri = "http://localhost:3002/t1".parse().unwrap();
        assert!(ep.matches_host(&same));
        assert!(!ep.matches_host(&different));
    }

    #[test]
    fn first_segment_after_prefix() {
        let ep = Endpoint::parse("https://auth.example.com").unwrap();
        let uri: Uri = "https://auth.example.com/t1/oidc/token".parse().unwrap();
        assert_eq!(ep.first_segment_after_prefix(&uri), Some("t1"));

        let bare: Uri = "https://auth.example.com/".parse().unwrap();
        assert_eq!(ep.first_segment_after_prefix(&bare), None);
    }

    #[test]
    fn first_segment_honors_path_prefix() {
        let ep = Endpoint::parse("https://example.com/idp").unwrap();
        let uri: Uri = "https://example.com/idp/t2/api".parse().unwrap();
        assert_eq!(ep.first_segment_after_prefix(&uri), Some("t2"));

        let outside: Uri = "https://example.com/other/t2".parse().unwrap();
        assert_eq!(ep.first_segment_after_prefix(&outside), None);
    }

    #[test]
    fn dev_override_unreachable_in_production() {
        let config = ResolverConfig {
            admin_endpoint: Endpoint::parse("https://admin.tessera.app").unwrap(),
            mode: TenancyMode::SingleTenant,
            dev_tenant_override: Some("devtenant".parse().unwrap()),
            is_production: true,
            is_integration_test: false,
            custom_domains_enabled: false,
        };
        assert!(config.effective_dev_override().is_none());

        let test_mode = ResolverConfig {
            is_integration_test: true,
            ..config.clone()
        };
        assert!(test_mode.effective_dev_override().is_some());

        let dev_mode = ResolverConfig {
            is_production: false,
            ..config
        };
        assert!(dev_mode.effective_dev_override().is_some());
    }
}
