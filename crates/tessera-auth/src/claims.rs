//! Access-token claims and the verified principal.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The wildcard scope granting full access to a tenant's Management API.
pub const SCOPE_ALL: &str = "all";

/// Claims the core reads out of a verified access token.
///
/// Signature, expiry, issuer and audience are enforced by the verifier; the
/// struct itself stays permissive so structurally unusual tokens still
/// deserialize and fail with a precise error instead of a JSON error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user ID, or client ID for machine tokens.
    #[serde(default)]
    pub sub: Option<String>,

    /// Issuer.
    pub iss: String,

    /// Expiry (unix seconds).
    pub exp: i64,

    /// OAuth client the token was issued to.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Space-delimited granted scopes.
    #[serde(default)]
    pub scope: Option<String>,

    /// JWT ID, consulted against the revocation blacklist when present.
    #[serde(default)]
    pub jti: Option<String>,
}

impl AccessClaims {
    /// The granted scopes as a set.
    #[must_use]
    pub fn scopes(&self) -> HashSet<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Whether the verified caller is a human user or a machine client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// A human user (`sub != client_id`).
    User,
    /// A machine client authenticating as itself (`sub == client_id`).
    Application,
}

/// The identity a verified token resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    /// User or application.
    #[serde(rename = "type")]
    pub kind: PrincipalKind,

    /// Subject identifier.
    pub id: String,

    /// OAuth client the token was issued to, when present.
    pub client_id: Option<String>,

    /// Granted scopes.
    pub scopes: HashSet<String>,
}

impl Principal {
    /// Whether the principal holds a scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Whether the principal holds the wildcard scope.
    #[must_use]
    pub fn has_all_scope(&self) -> bool {
        self.has_scope(SCOPE_ALL)
    }

    /// Whether this is a machine client.
    #[must_use]
    pub fn is_application(&self) -> bool {
        self.kind == PrincipalKind::Application
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(scope: Option<&str>) -> AccessClaims {
        AccessClaims {
            sub: Some("user-1".to_string()),
            iss: "https://t1.tessera.app/oidc".to_string(),
            exp: 4_102_444_800,
            client_id: None,
            scope: scope.map(str::to_string),
            jti: None,
        }
    }

    #[test]
    fn scopes_split_on_whitespace() {
        let set = claims(Some("all read:tenant  write:tenant")).scopes();
        assert_eq!(set.len(), 3);
        assert!(set.contains("all"));
        assert!(set.contains("write:tenant"));
    }

    #[test]
    fn missing_scope_claim_is_empty() {
        assert!(claims(None).scopes().is_empty());
        assert!(claims(Some("")).scopes().is_empty());
    }

    #[test]
    fn claims_deserialize_without_optional_fields() {
        let parsed: AccessClaims = serde_json::from_str(
            r#"{"iss": "https://t1.tessera.app/oidc", "exp": 4102444800}"#,
        )
        .unwrap();
        assert_eq!(parsed.sub, None);
        assert_eq!(parsed.jti, None);
    }

    #[test]
    fn principal_scope_checks() {
        let principal = Principal {
            kind: PrincipalKind::User,
            id: "user-1".to_string(),
            client_id: Some("app-1".to_string()),
            scopes: ["all".to_string()].into_iter().collect(),
        };
        assert!(principal.has_all_scope());
        assert!(!principal.has_scope("manage:tenant"));
        assert!(!principal.is_application());
    }

    #[test]
    fn principal_serializes_kind_as_type() {
        let principal = Principal {
            kind: PrincipalKind::Application,
            id: "app-1".to_string(),
            client_id: Some("app-1".to_string()),
            scopes: HashSet::new(),
        };
        let json = serde_json::to_string(&principal).unwrap();
        assert!(json.contains("\"type\":\"application\""));
    }
}
