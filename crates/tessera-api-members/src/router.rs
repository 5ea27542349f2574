//! Router and shared state for the member-management surface.

use axum::middleware;
use axum::routing::{delete, get, put};
use axum::Router;
use sqlx::PgPool;
use tessera_auth::{RevocationStore, TokenVerifier, VerificationContext};
use tessera_authz::OrganizationAccessControl;

use crate::handlers::{invitations, members, tenants};
use crate::middleware::bearer::{authenticate, require_management_scope};
use crate::middleware::member_auth::TenantMemberAuth;

/// Shared state of the member-management surface.
#[derive(Clone)]
pub struct MembersApiState {
    /// Token verifier for inbound bearer tokens.
    pub verifier: TokenVerifier,
    /// Revocation store consulted during verification.
    pub revocation: RevocationStore,
    /// The admin tenant's verification context; management tokens are
    /// always verified against it.
    pub admin_context: VerificationContext,
    /// Expected audience of management tokens.
    pub audience: String,
    /// Organization access control over the admin tenant's store.
    pub access: OrganizationAccessControl,
    /// Three-tier member authorization.
    pub member_auth: TenantMemberAuth,
    /// Management store for tenant rows.
    pub pool: PgPool,
}

impl MembersApiState {
    /// Assemble the state from its parts.
    #[must_use]
    pub fn new(
        verifier: TokenVerifier,
        revocation: RevocationStore,
        admin_context: VerificationContext,
        audience: impl Into<String>,
        access: OrganizationAccessControl,
        pool: PgPool,
    ) -> Self {
        let member_auth = TenantMemberAuth::new(access.clone());
        Self {
            verifier,
            revocation,
            admin_context,
            audience: audience.into(),
            access,
            member_auth,
            pool,
        }
    }
}

/// Build the member-management router.
///
/// Tenant lifecycle routes additionally require the wildcard management
/// scope; member and invitation routes run the three-tier decision inside
/// their handlers.
pub fn members_router(state: MembersApiState) -> Router {
    let tenant_lifecycle = Router::new()
        .route(
            "/tenants",
            get(tenants::list_tenants).post(tenants::create_tenant),
        )
        .route("/tenants/:tenant_id", delete(tenants::delete_tenant))
        .route_layer(middleware::from_fn(require_management_scope));

    let member_management = Router::new()
        .route(
            "/tenants/:tenant_id/members",
            get(members::list_members).post(members::add_member),
        )
        .route(
            "/tenants/:tenant_id/members/:user_id",
            delete(members::remove_member),
        )
        .route(
            "/tenants/:tenant_id/members/:user_id/role",
            put(members::update_member_role),
        )
        .route(
            "/tenants/:tenant_id/invitations",
            get(invitations::list_invitations).post(invitations::create_invitations),
        )
        .route(
            "/tenants/:tenant_id/invitations/:invitation_id",
            delete(invitations::revoke_invitation).patch(invitations::update_invitation_status),
        );

    tenant_lifecycle
        .merge(member_management)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tessera_auth::{DevUserOverride, JwksClient, VerifierOptions};
    use tessera_core::TenantId;
    use tower::ServiceExt;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tessera_test")
            .expect("lazy pool")
    }

    fn state(options: VerifierOptions) -> MembersApiState {
        let pool = lazy_pool();
        let verifier = TokenVerifier::new(
            "https://admin.tessera.app/oidc",
            JwksClient::new("http://127.0.0.1:1/unused").unwrap(),
            options,
        );
        let admin_context = VerificationContext {
            tenant_id: TenantId::admin(),
            issuer: "https://admin.tessera.app/oidc".to_string(),
            local_keys: vec![],
        };
        MembersApiState::new(
            verifier,
            RevocationStore::new(pool.clone()),
            admin_context,
            "https://admin.tessera.app/api",
            OrganizationAccessControl::new(pool.clone()),
            pool,
        )
    }

    fn dev_options() -> VerifierOptions {
        VerifierOptions {
            is_production: false,
            is_integration_test: false,
            dev_user: Some(DevUserOverride {
                user_id: uuid::Uuid::new_v4().to_string(),
            }),
        }
    }

    fn production_options() -> VerifierOptions {
        VerifierOptions {
            is_production: true,
            is_integration_test: false,
            dev_user: None,
        }
    }

    #[tokio::test]
    async fn unauthenticated_request_is_401() {
        let app = members_router(state(production_options()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tenants/t1/members")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn destructive_operation_on_system_tenant_is_403() {
        let app = members_router(state(dev_options()));
        let user = uuid::Uuid::new_v4();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/tenants/admin/members/{user}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deleting_a_system_tenant_is_403() {
        let app = members_router(state(dev_options()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/tenants/default")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_invitee_email_is_400() {
        let app = members_router(state(dev_options()));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tenants/t1/invitations")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"invitees": ["not-an-email"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_tenant_id_is_400() {
        let app = members_router(state(dev_options()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tenants/NOT%20VALID/members")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
