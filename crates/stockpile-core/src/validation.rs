//! Field checks run by the stores before anything is written.
//!
//! The schema repeats the important ones as `CHECK` constraints
//! (`quantity >= 0`, `price_cents >= 0`); these functions exist so the
//! operator gets a message naming the field instead of a constraint name.
//!
//! ```rust
//! use stockpile_core::validation::{validate_product_name, validate_sale_quantity};
//!
//! validate_product_name("Widget").unwrap();
//! assert!(validate_sale_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Product;
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;
const USERNAME_LEN: (usize, usize) = (3, 50);
const PASSWORD_LEN: (usize, usize) = (6, 128);

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn at_most(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Character count within `min..=max`.
fn length_between(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Product ids are chosen by the operator.
pub fn validate_product_id(id: i64) -> ValidationResult<()> {
    positive("id", id)
}

/// Non-blank, at most 200 characters.
///
/// ```rust
/// use stockpile_core::validation::validate_product_name;
///
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    length_between("name", name, 1, MAX_NAME_LEN)
}

/// An empty category means uncategorized.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    length_between("category", category, 0, MAX_CATEGORY_LEN)
}

/// `0..=MAX_STOCK_QUANTITY`.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    non_negative("quantity", quantity)?;
    at_most("quantity", quantity, 0, MAX_STOCK_QUANTITY)
}

/// `0..=MAX_PRICE_CENTS`.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    non_negative("price", cents)?;
    at_most("price", cents, 0, MAX_PRICE_CENTS)
}

pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_id(product.id)?;
    validate_product_name(&product.name)?;
    validate_stock_quantity(product.quantity)?;
    validate_price_cents(product.price_cents)?;
    validate_category(&product.category)
}

/// Quantity of one sale line: `1..=MAX_LINE_QUANTITY`.
pub fn validate_sale_quantity(quantity: i64) -> ValidationResult<()> {
    positive("quantity", quantity)?;
    at_most("quantity", quantity, 1, MAX_LINE_QUANTITY)
}

/// `1..=MAX_STOCK_QUANTITY` units added or removed at once.
pub fn validate_stock_increase(amount: i64) -> ValidationResult<()> {
    positive("amount", amount)?;
    at_most("amount", amount, 1, MAX_STOCK_QUANTITY)
}

pub fn validate_threshold(threshold: i64) -> ValidationResult<()> {
    non_negative("threshold", threshold)
}

/// 3 to 50 characters from letters, digits, `_`, `-` and `.`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    length_between("username", username, USERNAME_LEN.0, USERNAME_LEN.1)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.');
    if !username.chars().all(allowed) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "use letters, digits, '_', '-' or '.'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    length_between("password", password, PASSWORD_LEN.0, PASSWORD_LEN.1)
}
