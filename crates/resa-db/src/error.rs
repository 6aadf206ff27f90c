//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  MySQL / SQLite error (sqlx::Error)     resa_core::CoreError            │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (store.rs) ← DbError or mail failure                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Web layer displays a user-friendly message                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use resa_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering a user name that is already taken
    /// - Inserting a second digicode for the same booking
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - MySQL server unreachable or credentials rejected
    /// - SQLite file can't be created (permissions, disk full)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value does not map to a domain type
    /// (unknown level or status, malformed digicode).
    #[error("Invalid stored value: {0}")]
    Decode(String),

    /// Input rejected before reaching the database.
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Password hashing failed.
    #[error("Password error: {0}")]
    Password(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Whether this is a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Constraint kind (MySQL and SQLite)
/// sqlx::Error::ColumnDecode   → DbError::Decode
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        // SQLite: "UNIQUE constraint failed: <table>.<column>"
                        // MySQL:  "Duplicate entry '<value>' for key '<index>'"
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .or_else(|| msg.split(" for key ").nth(1))
                            .unwrap_or("unknown")
                            .trim_matches('\'')
                            .to_string();
                        let value = msg
                            .strip_prefix("Duplicate entry '")
                            .and_then(|rest| rest.split('\'').next())
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation { field, value }
                    }
                    ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::ColumnDecode { index, source } => {
                DbError::Decode(format!("column {index}: {source}"))
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => DbError::Invalid(v),
            CoreError::PasswordHash(msg) => DbError::Password(msg),
            other => DbError::Decode(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
