//! # Database Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ─────────┐                                                 │
//! │   (kind(): Unique,    │                                                 │
//! │    ForeignKey, Check) ├──► DbError ──► CliError { code, message }       │
//! │  CoreError ───────────┘    (Domain)                                     │
//! │   (not found, stock,                                                    │
//! │    validation)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rule failures travel inside [`DbError::Domain`] untouched, so
//! a caller can always match on the original `CoreError`.

use sqlx::error::ErrorKind;
use stockpile_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A product id or username that is already taken.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A schema CHECK rejected a row that got past validation.
    #[error("Constraint violation: {0}")]
    CheckViolation(String),

    /// The database file could not be opened or created.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Rejected by a business rule: unknown product, insufficient stock,
    /// invalid input.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl ToString) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Classifies driver errors by their SQLite constraint kind.
///
/// `UNIQUE` and `PRIMARY KEY` failures both report
/// [`ErrorKind::UniqueViolation`]. The failing column comes from the
/// message (`UNIQUE constraint failed: users.username`); repositories that
/// know the offending value replace it with [`DbError::duplicate`].
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or("value")
                            .to_string(),
                        value: "?".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation(message)
                    }
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
