//! Error types for organization access control.

use tessera_core::ErrorCode;
use tessera_db::DbError;
use thiserror::Error;

/// Access-control operation errors.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Membership, invitation, or organization absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Removing or downgrading the organization's last admin.
    #[error("Organization {0} would be left without an admin")]
    LastAdmin(String),

    /// The invitation is already in a terminal state.
    #[error("Invitation {0} is already finalized")]
    InvitationFinalized(String),

    /// Organization or invitation creation failed.
    #[error("Failed to create {0}")]
    CreateFailed(String),

    /// Underlying storage failure (including uniqueness violations).
    #[error(transparent)]
    Db(#[from] DbError),
}

impl AuthzError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthzError::NotFound(_) => ErrorCode::EntityNotFound,
            AuthzError::LastAdmin(_) | AuthzError::InvitationFinalized(_) => {
                ErrorCode::EntityDbConstraintViolated
            }
            AuthzError::CreateFailed(_) => ErrorCode::EntityCreateFailed,
            AuthzError::Db(db) => db.code(),
        }
    }

    /// Whether this is a duplicate-entity failure.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AuthzError::Db(db) if db.is_unique_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_admin_maps_to_constraint_violation() {
        let err = AuthzError::LastAdmin("t-t1".to_string());
        assert_eq!(err.code().as_str(), "entity.db_constraint_violated");
        assert_eq!(err.code().http_status(), 422);
    }

    #[test]
    fn duplicate_member_surfaces_unique_violation() {
        let err = AuthzError::Db(DbError::UniqueViolation("duplicate key".to_string()));
        assert!(err.is_unique_violation());
        assert_eq!(err.code().as_str(), "entity.unique_integrity_violation");
    }
}
