//! The error every command returns.
//!
//! A failed command prints `{"code": ..., "message": ...}` on stderr and
//! exits with status 1. Scripts match on `code`; `message` is for people
//! and may change. Database internals are logged, never printed.

use serde::Serialize;
use std::fmt;
use stockpile_core::transfer::TransferError;
use stockpile_core::{CoreError, ValidationError};
use stockpile_db::DbError;
use thiserror::Error;

/// Error printed when a command fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for product 7: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message}")]
pub struct CliError {
    pub code: ErrorCode,

    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, sale or user does not exist
    NotFound,

    /// Input failed validation
    ValidationError,

    /// Not enough stock for a sale
    InsufficientStock,

    /// Unrecognized value (bucket, role) or a refused request
    InvalidArgument,

    /// Missing or wrong credentials
    Unauthorized,

    /// Logged in, but the role does not allow the command
    Forbidden,

    /// Database operation failed
    DatabaseError,

    /// Configuration could not be loaded or is invalid
    ConfigError,

    /// File could not be read or written
    IoError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type for command functions.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// `"{resource} not found: {id}"`
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::InvalidArgument, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Forbidden, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => CliError::from(core),
            DbError::NotFound { entity, id } => CliError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => CliError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CliError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation(message) => CliError::new(
                ErrorCode::ValidationError,
                format!("Rejected by the database: {}", message),
            ),
            DbError::ConnectionFailed(e) => CliError::new(
                ErrorCode::DatabaseError,
                format!("Database connection failed: {}", e),
            ),
            DbError::MigrationFailed(e) => CliError::new(
                ErrorCode::DatabaseError,
                format!("Database migration failed: {}", e),
            ),
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", id),
            err @ CoreError::InsufficientStock { .. } => {
                CliError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::InvalidArgument(message) => CliError::invalid_argument(message),
            err @ CoreError::AmountOverflow(_) => CliError::invalid_argument(err.to_string()),
            err @ (CoreError::EmptyBill | CoreError::BillTooLarge { .. }) => {
                CliError::new(ErrorCode::ValidationError, err.to_string())
            }
            CoreError::Validation(e) => CliError::from(e),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::new(ErrorCode::ValidationError, err.to_string())
    }
}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Io(e) => CliError::from(e),
            other => CliError::new(ErrorCode::ValidationError, other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::config(format!("Invalid config file: {}", err))
    }
}
