//! Domain errors.
//!
//! [`ValidationError`] is raised for bad input before anything is written;
//! [`CoreError`] covers business rule failures and wraps validation. The
//! database layer carries `CoreError` unchanged inside `DbError::Domain`,
//! and the CLI turns either into a stable error code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Raised by the guarded decrement; `available` is the stock at the
    /// moment the sale was refused.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Unknown revenue bucket, unknown role name and similar.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A running total left the `i64` range.
    #[error("Amount overflow while totalling {0}")]
    AmountOverflow(&'static str),

    #[error("Bill has no items")]
    EmptyBill,

    #[error("Bill cannot have more than {max} items")]
    BillTooLarge { max: usize },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// A field failed a check in [`crate::validation`].
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero is rejected as well as negatives.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Text that should have been a number or a price.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7: available 3, requested 5"
        );
        assert_eq!(
            CoreError::ProductNotFound(42).to_string(),
            "Product not found: 42"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price cannot be negative");
    }

    #[test]
    fn test_validation_wraps_into_core_error() {
        let err: CoreError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: quantity must be positive");
    }
}
