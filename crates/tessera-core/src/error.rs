//! Machine-readable error codes.
//!
//! Every failure the authorization core surfaces to callers carries one of
//! these codes; HTTP layers map them to status codes, clients match on the
//! string form.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The closed set of error codes surfaced by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing, invalid, revoked token, or key material unreachable.
    AuthUnauthorized,
    /// Valid identity but insufficient scope or system-tenant protection.
    AuthForbidden,
    /// Structurally invalid token: no `sub` claim.
    AuthJwtSubMissing,
    /// Membership, invitation, or tenant absent.
    EntityNotFound,
    /// Duplicate member or duplicate active invitation.
    EntityUniqueIntegrityViolation,
    /// Last-admin protection triggered.
    EntityDbConstraintViolated,
    /// Organization or invitation creation failure.
    EntityCreateFailed,
    /// Custom-domain feature unavailable in this deployment mode.
    DomainNotConfigured,
}

impl ErrorCode {
    /// The wire form of the code, e.g. `auth.unauthorized`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AuthUnauthorized => "auth.unauthorized",
            ErrorCode::AuthForbidden => "auth.forbidden",
            ErrorCode::AuthJwtSubMissing => "auth.jwt_sub_missing",
            ErrorCode::EntityNotFound => "entity.not_found",
            ErrorCode::EntityUniqueIntegrityViolation => "entity.unique_integrity_violation",
            ErrorCode::EntityDbConstraintViolated => "entity.db_constraint_violated",
            ErrorCode::EntityCreateFailed => "entity.create_failed",
            ErrorCode::DomainNotConfigured => "domain.not_configured",
        }
    }

    /// The HTTP status this code maps to.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::AuthUnauthorized | ErrorCode::AuthJwtSubMissing => 401,
            ErrorCode::AuthForbidden => 403,
            ErrorCode::EntityNotFound => 404,
            ErrorCode::EntityUniqueIntegrityViolation
            | ErrorCode::EntityDbConstraintViolated => 422,
            ErrorCode::EntityCreateFailed => 500,
            ErrorCode::DomainNotConfigured => 404,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_dotted_wire_form() {
        assert_eq!(ErrorCode::AuthUnauthorized.as_str(), "auth.unauthorized");
        assert_eq!(
            ErrorCode::EntityUniqueIntegrityViolation.as_str(),
            "entity.unique_integrity_violation"
        );
        assert_eq!(ErrorCode::DomainNotConfigured.as_str(), "domain.not_configured");
    }

    #[test]
    fn constraint_violations_map_to_422() {
        assert_eq!(ErrorCode::EntityDbConstraintViolated.http_status(), 422);
        assert_eq!(ErrorCode::EntityUniqueIntegrityViolation.http_status(), 422);
    }

    #[test]
    fn auth_codes_map_to_401_and_403() {
        assert_eq!(ErrorCode::AuthUnauthorized.http_status(), 401);
        assert_eq!(ErrorCode::AuthJwtSubMissing.http_status(), 401);
        assert_eq!(ErrorCode::AuthForbidden.http_status(), 403);
    }
}
