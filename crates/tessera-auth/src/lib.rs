//! Bearer-token verification and revocation.
//!
//! [`TokenVerifier`] checks a bearer token's signature, issuer and audience
//! against the current tenant's verification context, including the
//! cross-tenant case where the admin tenant issues tokens consumed by
//! another tenant's Management API. [`RevocationStore`] closes the gap left
//! by self-verifying JWTs: revoked token IDs are blacklisted and rejected at
//! verification time.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod revocation;
pub mod verifier;

pub use claims::{AccessClaims, Principal, PrincipalKind, SCOPE_ALL};
pub use error::AuthError;
pub use jwks::{Jwk, JwkSet, JwksClient, JwksError};
pub use revocation::RevocationStore;
pub use verifier::{
    DevUserOverride, LocalVerificationKey, TokenVerifier, VerificationContext, VerifierOptions,
};
