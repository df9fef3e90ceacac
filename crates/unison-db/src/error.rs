//! Error types for the unison-db crate.
//!
//! Wraps `SQLx` errors and adds the storage-level conditions the engine
//! reacts to (conflicts, missing rows, undecodable rows).

use thiserror::Error;

/// Storage operation errors.
///
/// # Example
///
/// ```rust
/// use unison_db::DbError;
///
/// fn handle_error(err: DbError) {
///     match err {
///         DbError::ConnectionFailed(e) => eprintln!("Cannot connect: {}", e),
///         DbError::MigrationFailed(e) => eprintln!("Migration error: {}", e),
///         DbError::QueryFailed(e) => eprintln!("Query error: {}", e),
///         DbError::NotFound(msg) => eprintln!("Not found: {}", msg),
///         DbError::Conflict(msg) => eprintln!("Conflict: {}", msg),
///         DbError::InvalidData(msg) => eprintln!("Invalid row: {}", msg),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Resource not found within the tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row could not be decoded into its model.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl DbError {
    /// Map a query error, turning unique violations into [`DbError::Conflict`].
    pub(crate) fn from_query(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(conflict()),
            _ => DbError::QueryFailed(err),
        }
    }

    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// Check if this error indicates a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }

    /// Check if this error indicates a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            DbError::ConnectionFailed(_) => "DB_CONNECTION_FAILED",
            DbError::MigrationFailed(_) => "DB_MIGRATION_FAILED",
            DbError::QueryFailed(_) => "DB_QUERY_FAILED",
            DbError::NotFound(_) => "NOT_FOUND",
            DbError::Conflict(_) => "CONFLICT",
            DbError::InvalidData(_) => "DB_INVALID_DATA",
        }
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
