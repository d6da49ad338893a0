//! Error type for repository operations.
//!
//! Wraps [`CoreError`] for domain failures and [`sqlx::Error`] for store
//! failures, and classifies every value into a response class so the
//! boundary layer never inspects variants directly.

use flowdef_core::error::CoreError;

/// Error returned by every repository operation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A domain-level error from `flowdef-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for repository return values.
pub type DbResult<T> = Result<T, DbError>;

/// Caller-visible response class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or rule-violating input.
    BadInput,
    /// A referenced workflow or stage does not exist.
    NotFound,
    /// A referenced `specific` target does not belong to the workflow.
    Conflict,
    /// Store or internal failure; details stay server-side.
    Internal,
}

impl DbError {
    /// Classify this error into a response class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Core(core) => match core {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::Validation(_) => ErrorKind::BadInput,
                CoreError::Conflict(_) => ErrorKind::Conflict,
                CoreError::Internal(_) => ErrorKind::Internal,
            },
            DbError::Database(err) => match err {
                sqlx::Error::RowNotFound => ErrorKind::NotFound,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Whether the caller may safely retry the operation.
    ///
    /// True only for failures that happen before any statement executes
    /// (pool saturation, connection I/O); writes are never assumed
    /// idempotent and are not flagged retryable once a transaction begins.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Database(sqlx::Error::PoolTimedOut) | DbError::Database(sqlx::Error::Io(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classified_bad_input() {
        let err = DbError::Core(CoreError::Validation("seq_no must be positive".into()));
        assert_eq!(err.kind(), ErrorKind::BadInput);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_not_found_classified() {
        let err = DbError::Core(CoreError::NotFound { entity: "Workflow", id: 9 });
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_conflict_classified() {
        let err = DbError::Core(CoreError::Conflict("target_stage_id 4".into()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DbError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_pool_timeout_is_retryable_internal() {
        let err = DbError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.is_retryable());
    }
}
