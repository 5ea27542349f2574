//! Server configuration from environment variables.
//!
//! Required values fail fast at startup; everything is carried in an
//! explicit `Config` value passed into constructors.

use tessera_core::TenantId;
use tessera_tenant::{Endpoint, ResolverConfig, TenancyMode};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port.
    pub port: u16,
    /// Management-store connection string.
    pub database_url: String,
    /// Admin console/API endpoint.
    pub admin_endpoint: Endpoint,
    /// Admin tenant issuer URL.
    pub admin_issuer: String,
    /// Admin tenant JWKS URL.
    pub admin_jwks_url: String,
    /// Expected audience of management tokens.
    pub management_audience: String,
    /// Base domain of per-tenant endpoints (e.g. `tessera.app`).
    pub api_domain_suffix: String,
    /// Tenancy mode.
    pub mode: TenancyMode,
    /// Whether the process is flagged production.
    pub is_production: bool,
    /// Whether the process runs under integration tests.
    pub is_integration_test: bool,
    /// Development tenant override.
    pub dev_tenant_override: Option<TenantId>,
    /// Development user override.
    pub dev_user_id: Option<String>,
    /// Whether custom domains are available.
    pub custom_domains_enabled: bool,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = optional("PORT")
            .map(|v| {
                v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                    name: "PORT",
                    value: v.clone(),
                })
            })
            .transpose()?
            .unwrap_or(3001);

        let database_url = required("DATABASE_URL")?;

        let admin_endpoint_raw = required("ADMIN_ENDPOINT")?;
        let admin_endpoint =
            Endpoint::parse(&admin_endpoint_raw).ok_or(ConfigError::Invalid {
                name: "ADMIN_ENDPOINT",
                value: admin_endpoint_raw,
            })?;

        let api_domain_suffix = required("API_DOMAIN_SUFFIX")?;

        let mode = match optional("TENANCY_MODE").as_deref().unwrap_or("path") {
            "single" => TenancyMode::SingleTenant,
            "path" => {
                let raw = required("BASE_ENDPOINTS")?;
                let base_endpoints = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|origin| {
                        Endpoint::parse(origin).ok_or(ConfigError::Invalid {
                            name: "BASE_ENDPOINTS",
                            value: origin.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                TenancyMode::PathBased { base_endpoints }
            }
            "domain" => TenancyMode::DomainBased {
                domain_suffix: api_domain_suffix.clone(),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "TENANCY_MODE",
                    value: other.to_string(),
                })
            }
        };

        let dev_tenant_override = optional("DEV_TENANT_ID")
            .map(|v| {
                v.parse::<TenantId>().map_err(|_| ConfigError::Invalid {
                    name: "DEV_TENANT_ID",
                    value: v.clone(),
                })
            })
            .transpose()?;

        Ok(Self {
            port,
            database_url,
            admin_endpoint,
            admin_issuer: required("ADMIN_ISSUER")?,
            admin_jwks_url: required("ADMIN_JWKS_URL")?,
            management_audience: required("MANAGEMENT_AUDIENCE")?,
            api_domain_suffix,
            mode,
            is_production: optional("TESSERA_ENV").as_deref() == Some("production"),
            is_integration_test: optional("INTEGRATION_TEST").as_deref() == Some("true"),
            dev_tenant_override,
            dev_user_id: optional("DEV_USER_ID"),
            custom_domains_enabled: optional("CUSTOM_DOMAINS_ENABLED").as_deref() != Some("false"),
        })
    }

    /// The resolver configuration slice of this config.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            admin_endpoint: self.admin_endpoint.clone(),
            mode: self.mode.clone(),
            dev_tenant_override: self.dev_tenant_override.clone(),
            is_production: self.is_production,
            is_integration_test: self.is_integration_test,
            custom_domains_enabled: self.custom_domains_enabled,
        }
    }
}
