//! SQLite persistence for Stockpile.
//!
//! [`Database`] owns the pool and is the entry point: the catalog store,
//! the sales ledger and the account store are reached through it, as is
//! [`Checkout`], which runs every sale as one transaction so the stock
//! decrement and the ledger entry commit or vanish together.
//!
//! ```rust,ignore
//! use stockpile_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockpile.db")).await?;
//! let sale = db.checkout().sell(7, 2).await?;
//! let by_month = db.analytics().revenue_over_time(TimeBucket::Monthly).await?;
//! ```

pub mod analytics;
pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use analytics::AnalyticsService;
pub use checkout::{Checkout, SaleStage};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
