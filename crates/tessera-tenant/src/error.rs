//! Error types for tenant resolution and domain management.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tessera_core::ErrorCode;
use tessera_db::DbError;
use thiserror::Error;

/// Tenant resolution and custom-domain errors.
#[derive(Debug, Error)]
pub enum TenantError {
    /// No tenant matched the request URL.
    #[error("No tenant matched the request URL")]
    NotResolved,

    /// The resolved tenant is suspended.
    #[error("Tenant {0} is suspended")]
    Suspended(String),

    /// Custom domains are unavailable in this deployment mode.
    #[error("Custom domains are not configured for this deployment")]
    DomainNotConfigured,

    /// Underlying storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl TenantError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            TenantError::NotResolved => ErrorCode::EntityNotFound,
            TenantError::Suspended(_) => ErrorCode::AuthForbidden,
            TenantError::DomainNotConfigured => ErrorCode::DomainNotConfigured,
            TenantError::Db(db) => db.code(),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "Tenant resolution failure");
        }

        let body = ErrorBody {
            error: code.as_str(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_resolved_maps_to_not_found() {
        assert_eq!(TenantError::NotResolved.code(), ErrorCode::EntityNotFound);
        assert_eq!(TenantError::NotResolved.code().http_status(), 404);
    }

    #[test]
    fn domain_not_configured_code() {
        assert_eq!(
            TenantError::DomainNotConfigured.code().as_str(),
            "domain.not_configured"
        );
    }

    #[test]
    fn suspended_tenant_is_forbidden() {
        let err = TenantError::Suspended("t1".to_string());
        assert_eq!(err.code().http_status(), 403);
    }
}
