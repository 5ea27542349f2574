//! Request-level tenant resolution.
//!
//! Reconstructs the request URL from the `Host` header and hands it to the
//! resolver; a request no tenant owns is a 404, never a silent default.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{uri::Uri, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tessera_tenant::TenantResolver;

/// Resolve the owning tenant and attach it to the request.
pub async fn resolve_tenant(
    State(resolver): State<TenantResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(url) = request_url(&request) else {
        return (StatusCode::NOT_FOUND, "Unknown tenant").into_response();
    };

    match resolver.resolve(&url).await {
        Ok(Some(resolved)) => {
            tracing::debug!(
                tenant_id = %resolved.tenant_id,
                is_custom_domain = resolved.is_custom_domain,
                "Tenant resolved"
            );
            request.extensions_mut().insert(resolved);
            next.run(request).await
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Unknown tenant").into_response(),
        Err(err) => err.into_response(),
    }
}

/// The absolute request URL, rebuilt from the Host header when the
/// request-target is origin-form.
fn request_url(request: &Request<Body>) -> Option<Uri> {
    if request.uri().host().is_some() {
        return Some(request.uri().clone());
    }

    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())?;

    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    format!("https://{host}{path_and_query}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_request_is_rebuilt_from_host() {
        let request = Request::builder()
            .uri("/t1/api/users")
            .header("Host", "auth.tessera.app")
            .body(Body::empty())
            .unwrap();

        let url = request_url(&request).unwrap();
        assert_eq!(url.host(), Some("auth.tessera.app"));
        assert_eq!(url.path(), "/t1/api/users");
    }

    #[test]
    fn absolute_form_request_is_used_as_is() {
        let request = Request::builder()
            .uri("https://admin.tessera.app/api/tenants")
            .body(Body::empty())
            .unwrap();

        let url = request_url(&request).unwrap();
        assert_eq!(url.host(), Some("admin.tessera.app"));
    }

    #[test]
    fn missing_host_yields_none() {
        let request = Request::builder()
            .uri("/api/users")
            .body(Body::empty())
            .unwrap();
        assert!(request_url(&request).is_none());
    }
}
