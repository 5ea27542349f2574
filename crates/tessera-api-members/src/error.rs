//! API error mapping.
//!
//! Every failure surfaces as `{error, message}` JSON with the machine code
//! from the core taxonomy; forbidden member operations additionally carry a
//! diagnostic payload naming the operation, tenant and required scopes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tessera_auth::AuthError;
use tessera_authz::{AuthzError, MemberOperation};
use tessera_core::ErrorCode;
use thiserror::Error;

/// Member-management API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token verification failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Valid identity, insufficient scope for a member operation.
    #[error("Insufficient scope for {operation} on tenant {tenant_id}")]
    InsufficientScope {
        operation: MemberOperation,
        tenant_id: String,
        required_scopes: Vec<String>,
    },

    /// Destructive operation against a protected system tenant.
    #[error("Tenant {tenant_id} is protected from {operation}")]
    SystemTenantProtected {
        operation: MemberOperation,
        tenant_id: String,
    },

    /// Valid identity, endpoint requires full management access.
    #[error("Full management access required")]
    ManagementScopeRequired,

    /// Access-control operation failed.
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Storage failure outside the access-control service.
    #[error(transparent)]
    Db(#[from] tessera_db::DbError),

    /// Request input failed validation.
    #[error("Invalid input: {0}")]
    Validation(String),
}

impl ApiError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ApiError::Auth(err) => Some(err.code()),
            ApiError::InsufficientScope { .. }
            | ApiError::SystemTenantProtected { .. }
            | ApiError::ManagementScopeRequired => Some(ErrorCode::AuthForbidden),
            ApiError::Authz(err) => Some(err.code()),
            ApiError::Db(err) => Some(err.code()),
            ApiError::Validation(_) => None,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self.code() {
            Some(code) => (
                StatusCode::from_u16(code.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                code.as_str().to_string(),
            ),
            None => (StatusCode::BAD_REQUEST, "invalid_input".to_string()),
        };

        let data = match &self {
            ApiError::InsufficientScope {
                operation,
                tenant_id,
                required_scopes,
            } => Some(serde_json::json!({
                "operation": operation.as_str(),
                "tenantId": tenant_id,
                "requiredScopes": required_scopes,
            })),
            ApiError::SystemTenantProtected {
                operation,
                tenant_id,
            } => Some(serde_json::json!({
                "operation": operation.as_str(),
                "tenantId": tenant_id,
            })),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            error,
            message: self.to_string(),
            data,
        };
        (status, Json(body)).into_response()
    }
}
