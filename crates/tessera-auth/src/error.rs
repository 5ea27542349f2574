//! Error types for token verification and revocation.

use tessera_core::ErrorCode;
use tessera_db::DbError;
use thiserror::Error;

use crate::jwks::JwksError;

/// Token verification failures.
///
/// `KeyFetch` and `RevocationCheck` are availability failures, kept as
/// distinct variants so callers can tell "token invalid" from "could not
/// verify right now". Both still deny access.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    #[error("Missing Authorization header")]
    MissingAuthorization,

    /// The `Authorization` header is not a bearer token.
    #[error("Malformed Authorization header")]
    MalformedAuthorization,

    /// Signature, issuer, audience, or expiry validation failed.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token carries no `sub` claim.
    #[error("Token has no sub claim")]
    SubMissing,

    /// The token's `jti` is blacklisted.
    #[error("Token has been revoked")]
    Revoked,

    /// No verification key is available for the token.
    #[error("No verification key matches the token")]
    NoMatchingKey,

    /// Remote key discovery failed; verification could not be attempted.
    #[error("Key fetch failed: {0}")]
    KeyFetch(#[from] JwksError),

    /// The blacklist could not be consulted; access is denied rather than
    /// assumed clean.
    #[error("Revocation check failed: {0}")]
    RevocationCheck(#[source] DbError),
}

impl AuthError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::SubMissing => ErrorCode::AuthJwtSubMissing,
            _ => ErrorCode::AuthUnauthorized,
        }
    }

    /// Whether this failure is about availability rather than the token.
    #[must_use]
    pub fn is_availability_failure(&self) -> bool {
        matches!(self, AuthError::KeyFetch(_) | AuthError::RevocationCheck(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_missing_has_its_own_code() {
        assert_eq!(AuthError::SubMissing.code().as_str(), "auth.jwt_sub_missing");
        assert_eq!(AuthError::Revoked.code().as_str(), "auth.unauthorized");
    }

    #[test]
    fn availability_failures_are_distinct() {
        let fetch = AuthError::KeyFetch(JwksError::Fetch("connection refused".to_string()));
        assert!(fetch.is_availability_failure());
        // But they still map to a deny, never a grant.
        assert_eq!(fetch.code().as_str(), "auth.unauthorized");

        assert!(!AuthError::Revoked.is_availability_failure());
    }
}
