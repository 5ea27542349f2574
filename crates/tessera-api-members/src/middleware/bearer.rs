//! Bearer-token authentication middleware.
//!
//! Verifies the `Authorization` header against the admin tenant's
//! verification context and attaches the resolved [`Principal`] to the
//! request. A second layer asserts the wildcard scope for endpoints that
//! require full tenant access.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tessera_auth::Principal;

use crate::error::ApiError;
use crate::router::MembersApiState;

/// Verify the bearer token and attach the principal to the request.
pub async fn authenticate(
    State(state): State<MembersApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = state
        .verifier
        .verify(
            &state.admin_context,
            authorization,
            &state.audience,
            Some(&state.revocation),
        )
        .await?;

    tracing::debug!(principal = %principal.id, "Request authenticated");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Require the wildcard scope for full-tenant-access endpoints.
pub async fn require_management_scope(
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or(ApiError::Auth(tessera_auth::AuthError::MissingAuthorization))?;

    if !principal.has_all_scope() {
        return Err(ApiError::ManagementScopeRequired);
    }
    Ok(next.run(request).await)
}
