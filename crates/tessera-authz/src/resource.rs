//! OAuth resource-indicator classification and scope resolution.
//!
//! A requested `resource` value is classified exactly once into a closed
//! variant set; everything downstream pattern-matches on the variant instead
//! of re-deriving the classification from the string. A Management-API
//! indicator with an implausible tenant ID resolves to "no resource" rather
//! than an error, so callers return a uniform not-found.

use sqlx::PgPool;
use tessera_core::{OrganizationId, TenantId};
use tessera_db::models::resource::principal_type;
use tessera_db::models::{ApiResource, ApplicationConsent, ResourceScopeGrant};
use uuid::Uuid;

use crate::access::OrganizationAccessControl;
use crate::error::AuthzError;

/// The Me/Profile API indicator, always rooted at the admin tenant.
pub const ME_API_INDICATOR: &str = "https://admin.tessera.app/me";

/// Tenant IDs that can never be the subject of a Management-API indicator.
const TENANT_ID_DENYLIST: [&str; 5] = ["profile", "cloud", "api", "www", "console"];

/// Fixed well-known resources valid in every tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedResource {
    /// Organization-template resource backing organization tokens.
    Organizations,
}

impl ReservedResource {
    /// The indicator string of this reserved resource.
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            ReservedResource::Organizations => "urn:tessera:resource:organizations",
        }
    }

    fn classify(resource: &str) -> Option<Self> {
        (resource == ReservedResource::Organizations.indicator())
            .then_some(ReservedResource::Organizations)
    }
}

/// Closed classification of a requested resource indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceIndicator {
    /// A fixed well-known resource.
    Reserved(ReservedResource),
    /// A tenant's Management API (`https://{tenantId}.<suffix>/api`).
    ManagementApi(TenantId),
    /// The profile/Me API, resolved against the admin tenant.
    MeApi,
    /// A custom resource registered per tenant.
    Custom(String),
}

/// A resolved resource with the scopes the principal holds on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// The indicator as requested.
    pub indicator: String,
    /// Scope names the principal holds.
    pub scopes: Vec<String>,
}

/// The principal a resource is being resolved for.
#[derive(Debug, Clone, Default)]
pub struct ScopeQuery<'a> {
    /// The user, for user-held grants and Management/Me API access.
    pub user_id: Option<Uuid>,
    /// The client presenting the token.
    pub application_id: Option<&'a str>,
    /// Organization context carried by an organization token.
    pub organization_id: Option<&'a str>,
    /// Whether the application is third-party (consent-gated).
    pub third_party: bool,
}

/// Resolves resource indicators to scope sets.
#[derive(Clone)]
pub struct ResourceScopeResolver {
    access: OrganizationAccessControl,
    api_domain_suffix: String,
}

impl ResourceScopeResolver {
    /// Create a resolver.
    ///
    /// `api_domain_suffix` is the base domain of per-tenant Management APIs
    /// (e.g. `tessera.app` matches `https://{tenantId}.tessera.app/api`).
    /// Cross-tenant reads go through the access-control service's explicit
    /// admin-tenant handle; no shared connection is ever re-pointed.
    #[must_use]
    pub fn new(access: OrganizationAccessControl, api_domain_suffix: impl Into<String>) -> Self {
        Self {
            access,
            api_domain_suffix: api_domain_suffix.into(),
        }
    }

    /// Classify a resource indicator. Returns `None` for a Management-API
    /// shape whose embedded tenant ID is implausible or denylisted.
    #[must_use]
    pub fn classify(&self, resource: &str) -> Option<ResourceIndicator> {
        if resource == ME_API_INDICATOR {
            return Some(ResourceIndicator::MeApi);
        }
        if let Some(reserved) = ReservedResource::classify(resource) {
            return Some(ResourceIndicator::Reserved(reserved));
        }
        if let Some(candidate) = self.management_api_tenant(resource) {
            return match candidate {
                Ok(tenant_id) => Some(ResourceIndicator::ManagementApi(tenant_id)),
                // Management-API shaped but implausible: no resource.
                Err(()) => None,
            };
        }
        Some(ResourceIndicator::Custom(resource.to_string()))
    }

    /// Extract the tenant ID from a Management-API shaped indicator.
    ///
    /// Returns `None` when the indicator is not Management-API shaped at
    /// all, and `Some(Err(()))` when it is but the tenant ID fails the
    /// shape check or the reserved-word denylist.
    fn management_api_tenant(&self, resource: &str) -> Option<Result<TenantId, ()>> {
        let rest = resource.strip_prefix("https://")?;
        let host = rest.strip_suffix("/api")?;
        let label = host.strip_suffix(&format!(".{}", self.api_domain_suffix))?;

        if label.contains('.')
            || !TenantId::is_valid_shape(label)
            || TENANT_ID_DENYLIST.contains(&label)
        {
            return Some(Err(()));
        }
        Some(label.parse::<TenantId>().map_err(|_| ()))
    }

    /// Resolve the scopes a principal holds for a requested resource.
    ///
    /// Returns `Ok(None)` when the indicator is invalid or unregistered.
    pub async fn resolve_scopes(
        &self,
        tenant_pool: &PgPool,
        tenant_id: &TenantId,
        query: &ScopeQuery<'_>,
        resource: &str,
    ) -> Result<Option<ResolvedResource>, AuthzError> {
        let Some(indicator) = self.classify(resource) else {
            return Ok(None);
        };

        let scopes = match &indicator {
            ResourceIndicator::Reserved(reserved) => {
                self.principal_grants(tenant_pool, tenant_id, query, reserved.indicator())
                    .await?
            }
            ResourceIndicator::ManagementApi(target_tenant) => {
                // Membership-derived permissions, always read from the admin
                // tenant's store regardless of the current tenant.
                match query.user_id {
                    Some(user_id) => self.access.get_permissions(target_tenant, user_id).await?,
                    None => Vec::new(),
                }
            }
            ResourceIndicator::MeApi => {
                // Cross-tenant read through the dedicated admin-tenant
                // handle; concurrent requests in other tenants are
                // unaffected.
                match query.user_id {
                    Some(user_id) => {
                        ResourceScopeGrant::scopes_for(
                            self.access.admin_pool(),
                            tessera_core::ADMIN_TENANT_ID,
                            ME_API_INDICATOR,
                            principal_type::USER,
                            &user_id.to_string(),
                        )
                        .await?
                    }
                    None => Vec::new(),
                }
            }
            ResourceIndicator::Custom(custom) => {
                let registered =
                    ApiResource::find_by_indicator(tenant_pool, tenant_id.as_str(), custom)
                        .await?;
                if registered.is_none() {
                    return Ok(None);
                }

                let mut scopes = self
                    .principal_grants(tenant_pool, tenant_id, query, custom)
                    .await?;

                // Third-party apps only keep what the user consented to.
                if query.third_party {
                    if let (Some(user_id), Some(app_id)) = (query.user_id, query.application_id) {
                        let consented = ApplicationConsent::consented_scopes(
                            tenant_pool,
                            tenant_id.as_str(),
                            user_id,
                            app_id,
                            custom,
                        )
                        .await?;
                        scopes.retain(|s| consented.contains(s));
                    } else {
                        scopes.clear();
                    }
                }
                scopes
            }
        };

        Ok(Some(ResolvedResource {
            indicator: resource.to_string(),
            scopes,
        }))
    }

    /// Union of the principal's user, application, and organization grants
    /// on an indicator, deduplicated.
    async fn principal_grants(
        &self,
        tenant_pool: &PgPool,
        tenant_id: &TenantId,
        query: &ScopeQuery<'_>,
        indicator: &str,
    ) -> Result<Vec<String>, AuthzError> {
        let mut scopes = Vec::new();

        if let Some(user_id) = query.user_id {
            scopes.extend(
                ResourceScopeGrant::scopes_for(
                    tenant_pool,
                    tenant_id.as_str(),
                    indicator,
                    principal_type::USER,
                    &user_id.to_string(),
                )
                .await?,
            );
        }
        if let Some(app_id) = query.application_id {
            scopes.extend(
                ResourceScopeGrant::scopes_for(
                    tenant_pool,
                    tenant_id.as_str(),
                    indicator,
                    principal_type::APPLICATION,
                    app_id,
                )
                .await?,
            );
        }
        if let Some(org_id) = query.organization_id {
            scopes.extend(
                ResourceScopeGrant::scopes_for(
                    tenant_pool,
                    tenant_id.as_str(),
                    indicator,
                    principal_type::ORGANIZATION,
                    org_id,
                )
                .await?,
            );
        }

        scopes.sort();
        scopes.dedup();
        Ok(scopes)
    }
}

/// The organization URN audience of organization-scoped tokens.
#[must_use]
pub fn organization_urn(organization_id: &OrganizationId) -> String {
    format!("urn:tessera:organization:{organization_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ResourceScopeResolver {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool");
        ResourceScopeResolver::new(OrganizationAccessControl::new(pool), "tessera.app")
    }

    #[tokio::test]
    async fn me_api_indicator_classifies() {
        assert_eq!(
            resolver().classify("https://admin.tessera.app/me"),
            Some(ResourceIndicator::MeApi)
        );
    }

    #[tokio::test]
    async fn reserved_resource_classifies() {
        assert_eq!(
            resolver().classify("urn:tessera:resource:organizations"),
            Some(ResourceIndicator::Reserved(ReservedResource::Organizations))
        );
    }

    #[tokio::test]
    async fn management_api_classifies_with_tenant() {
        let classified = resolver().classify("https://t1.tessera.app/api");
        assert_eq!(
            classified,
            Some(ResourceIndicator::ManagementApi("t1".parse().unwrap()))
        );
    }

    #[tokio::test]
    async fn denylisted_labels_resolve_to_no_resource() {
        let r = resolver();
        for label in ["profile", "cloud", "api", "www", "console"] {
            assert_eq!(
                r.classify(&format!("https://{label}.tessera.app/api")),
                None,
                "label {label} must not classify"
            );
        }
    }

    #[tokio::test]
    async fn implausible_tenant_shapes_resolve_to_no_resource() {
        let r = resolver();
        assert_eq!(r.classify("https://Not-Valid.tessera.app/api"), None);
        assert_eq!(
            r.classify(&format!("https://{}.tessera.app/api", "x".repeat(30))),
            None
        );
        assert_eq!(r.classify("https://a.b.tessera.app/api"), None);
    }

    #[tokio::test]
    async fn unrelated_indicators_classify_as_custom() {
        let classified = resolver().classify("https://payments.acme.com/v1");
        assert_eq!(
            classified,
            Some(ResourceIndicator::Custom(
                "https://payments.acme.com/v1".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn management_api_without_api_path_is_custom() {
        // Wrong path: not Management-API shaped, falls through to custom.
        let classified = resolver().classify("https://t1.tessera.app/other");
        assert!(matches!(classified, Some(ResourceIndicator::Custom(_))));
    }

    #[test]
    fn organization_urn_shape() {
        let org = OrganizationId::for_tenant(&"t1".parse().unwrap());
        assert_eq!(organization_urn(&org), "urn:tessera:organization:t-t1");
    }
}
