//! Error types for the tessera-db crate.

use tessera_core::ErrorCode;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// A uniqueness constraint was violated (duplicate member, duplicate
    /// active invitation).
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Row not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An insert that was expected to produce a row did not.
    #[error("Create failed: {0}")]
    CreateFailed(String),
}

impl DbError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            DbError::UniqueViolation(_) => ErrorCode::EntityUniqueIntegrityViolation,
            DbError::NotFound(_) => ErrorCode::EntityNotFound,
            DbError::CreateFailed(_)
            | DbError::ConnectionFailed(_)
            | DbError::QueryFailed(_) => ErrorCode::EntityCreateFailed,
        }
    }

    /// Check if this error is a uniqueness violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }

    /// Check if this error is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::UniqueViolation(db.message().to_string())
            }
            e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
                DbError::ConnectionFailed(e)
            }
            other => DbError::QueryFailed(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_code() {
        let err = DbError::UniqueViolation("duplicate key".to_string());
        assert!(err.is_unique_violation());
        assert_eq!(err.code(), ErrorCode::EntityUniqueIntegrityViolation);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
        assert_eq!(err.code(), ErrorCode::EntityNotFound);
    }

    #[test]
    fn pool_errors_are_connection_failures() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
