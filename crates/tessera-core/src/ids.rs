//! Strongly typed identifiers.
//!
//! Tenant and organization identifiers are short, subdomain-safe strings
//! (tenant IDs become the host label of per-tenant endpoints such as
//! `https://{tenantId}.tessera.app/api`). Row-level identifiers are UUIDs.
//! The newtype pattern prevents accidental misuse of one ID type where
//! another is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// The distinguished tenant that hosts cross-tenant management metadata.
pub const ADMIN_TENANT_ID: &str = "admin";

/// The tenant used when multi-tenancy is disabled.
pub const DEFAULT_TENANT_ID: &str = "default";

/// Maximum accepted length of a tenant identifier.
pub const TENANT_ID_MAX_LEN: usize = 21;

/// Length of generated tenant identifiers.
const TENANT_ID_GENERATED_LEN: usize = 12;

/// Error type for ID parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// Why the input was rejected.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Strongly typed tenant identifier.
///
/// A tenant ID is 1–21 characters of `[a-z0-9-]`, starting with a letter or
/// digit, so it can be embedded as a DNS label in per-tenant endpoints.
/// Generated IDs are 12 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Generates a new random tenant ID.
    #[must_use]
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..TENANT_ID_GENERATED_LEN].to_string())
    }

    /// The admin tenant ID.
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_TENANT_ID.to_string())
    }

    /// The default tenant ID (single-tenant deployments).
    #[must_use]
    pub fn default_tenant() -> Self {
        Self(DEFAULT_TENANT_ID.to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the admin tenant.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_TENANT_ID
    }

    /// Returns `true` for tenants protected from deletion and from
    /// destructive member operations (the admin and default tenants).
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.0 == ADMIN_TENANT_ID || self.0 == DEFAULT_TENANT_ID
    }

    /// Validates the raw shape of a tenant ID without constructing one.
    ///
    /// Accepts 1–21 characters of `[a-z0-9-]` that do not start or end
    /// with `-`. This is the same plausibility check applied to tenant IDs
    /// extracted from resource indicators.
    #[must_use]
    pub fn is_valid_shape(s: &str) -> bool {
        if s.is_empty() || s.len() > TENANT_ID_MAX_LEN {
            return false;
        }
        if s.starts_with('-') || s.ends_with('-') {
            return false;
        }
        s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}

impl FromStr for TenantId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid_shape(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseIdError {
                id_type: "TenantId",
                message: format!("'{s}' is not a valid tenant identifier"),
            })
        }
    }
}

impl TryFrom<String> for TenantId {
    type Error = ParseIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed organization identifier.
///
/// Each managed tenant is mirrored by exactly one organization in the admin
/// tenant's store, with the fixed ID form `t-<tenantId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    const TENANT_PREFIX: &'static str = "t-";

    /// Builds the organization ID mirroring a tenant.
    #[must_use]
    pub fn for_tenant(tenant_id: &TenantId) -> Self {
        Self(format!("{}{}", Self::TENANT_PREFIX, tenant_id))
    }

    /// Returns the tenant this organization mirrors, if it has the
    /// `t-<tenantId>` form.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.0
            .strip_prefix(Self::TENANT_PREFIX)
            .and_then(|t| t.parse().ok())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrganizationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrganizationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Macro to define a UUID-backed ID type.
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    message: e.to_string(),
                })
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_uuid_id!(
    /// Identifier for a user (within any tenant).
    UserId
);

define_uuid_id!(
    /// Identifier for an organization invitation.
    InvitationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tenant_ids_are_valid_and_distinct() {
        let a = TenantId::generate();
        let b = TenantId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
        assert!(TenantId::is_valid_shape(a.as_str()));
    }

    #[test]
    fn system_tenants_are_flagged() {
        assert!(TenantId::admin().is_system());
        assert!(TenantId::admin().is_admin());
        assert!(TenantId::default_tenant().is_system());
        assert!(!TenantId::default_tenant().is_admin());
        assert!(!TenantId::generate().is_system());
    }

    #[test]
    fn tenant_id_shape_validation() {
        assert!(TenantId::is_valid_shape("t1"));
        assert!(TenantId::is_valid_shape("acme-corp-7"));
        assert!(!TenantId::is_valid_shape(""));
        assert!(!TenantId::is_valid_shape("UPPER"));
        assert!(!TenantId::is_valid_shape("-leading"));
        assert!(!TenantId::is_valid_shape("trailing-"));
        assert!(!TenantId::is_valid_shape("has_underscore"));
        assert!(!TenantId::is_valid_shape(&"x".repeat(22)));
    }

    #[test]
    fn tenant_id_parse_rejects_bad_shapes() {
        let err = "Not A Tenant".parse::<TenantId>().unwrap_err();
        assert_eq!(err.id_type, "TenantId");
    }

    #[test]
    fn organization_id_round_trips_tenant() {
        let tenant: TenantId = "t1".parse().unwrap();
        let org = OrganizationId::for_tenant(&tenant);
        assert_eq!(org.as_str(), "t-t1");
        assert_eq!(org.tenant_id(), Some(tenant));
    }

    #[test]
    fn organization_id_without_prefix_has_no_tenant() {
        let org = OrganizationId::from("custom-org".to_string());
        assert_eq!(org.tenant_id(), None);
    }

    #[test]
    fn tenant_id_serde_round_trip() {
        let id: TenantId = "acme".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme\"");
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn tenant_id_serde_rejects_invalid() {
        let result: Result<TenantId, _> = serde_json::from_str("\"Not Valid\"");
        assert!(result.is_err());
    }

    #[test]
    fn user_id_parse_and_display() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("nope".parse::<UserId>().is_err());
    }
}
