//! Domain model of the Stockpile inventory system.
//!
//! Everything here is plain data and pure functions: products, sales, money,
//! roles, bills, the analytics aggregations and the CSV catalog format. The
//! stores in `stockpile-db` persist these types and the CLI drives them;
//! this crate never opens a file or a connection itself, which keeps the
//! arithmetic testable without a database.
//!
//! ## Example Usage
//!
//! ```rust
//! use stockpile_core::analytics::{revenue_by_category, TimeBucket};
//! use stockpile_core::money::Money;
//!
//! let price = Money::from_cents(1250);
//! assert_eq!(price.checked_multiply_quantity(3), Some(Money::from_cents(3750)));
//!
//! let bucket: TimeBucket = "monthly".parse().unwrap();
//! assert_eq!(bucket, TimeBucket::Monthly);
//! assert!(revenue_by_category(&[]).unwrap().is_empty());
//! ```

pub mod access;
pub mod analytics;
pub mod bill;
pub mod error;
pub mod inventory;
pub mod money;
pub mod transfer;
pub mod types;
pub mod validation;

pub use access::{Action, Role};
pub use bill::{Bill, BillLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::InventoryStats;
pub use money::Money;
pub use types::*;

/// Quantity at or below which a product counts as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Number of entries a best-seller report returns unless asked otherwise.
pub const DEFAULT_BEST_SELLERS: usize = 5;

/// Upper bound on the quantity of one sale line.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum number of distinct products on one bill.
pub const MAX_BILL_LINES: usize = 100;

/// Largest stock level a product may hold.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Largest unit price, in cents (one billion in currency units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
