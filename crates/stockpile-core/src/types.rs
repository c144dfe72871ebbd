//! # Domain Types
//!
//! Core domain types used throughout Stockpile.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │        Sale         │   │      User       │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id             │   │  id (ledger key)    │   │  id             │   │
//! │  │  name           │──►│  product_id         │   │  username       │   │
//! │  │  quantity       │   │  product_name  (*)  │   │  role           │   │
//! │  │  price_cents    │   │  quantity_sold      │   └─────────────────┘   │
//! │  │  category       │──►│  total_cents        │                         │
//! │  └─────────────────┘   │  sold_at            │                         │
//! │                        │  category      (*)  │                         │
//! │                        └─────────────────────┘                         │
//! │                                                                         │
//! │  (*) snapshot: copied from the product at the moment of sale           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A sale copies the product's name and category when it is recorded, so
//! historical analytics stay stable when the product is later renamed,
//! re-categorized, repriced or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Catalog id, chosen by the operator when the product is added.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Units currently in stock. Never negative.
    pub quantity: i64,

    /// Unit price in cents. Never negative.
    pub price_cents: i64,

    /// Free-text category label (may be empty).
    pub category: String,
}

impl Product {
    /// Creates a product.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        quantity: i64,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        Product {
            id,
            name: name.into(),
            quantity,
            price_cents: price.cents(),
            category: category.into(),
        }
    }

    /// The product as the catalog stores it: name and category without
    /// surrounding whitespace.
    pub fn normalized(&self) -> Product {
        Product {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            ..self.clone()
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the quantity is at or below `threshold`.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// Checks if `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A ledger entry for one product sold in one transaction.
///
/// Entries are immutable once recorded. The `id` is the ledger's own
/// auto-incrementing key, so selling the same product twice produces two
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity_sold: i64,
    /// `quantity_sold × unit price` at time of sale.
    pub total_cents: i64,
    pub sold_at: DateTime<Utc>,
    /// Product category at time of sale (frozen).
    pub category: String,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale that has not been written to the ledger yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub product_id: i64,
    pub product_name: String,
    pub quantity_sold: i64,
    pub total_cents: i64,
    pub sold_at: DateTime<Utc>,
    pub category: String,
}

impl NewSale {
    /// Builds a ledger entry from the product as it is right now.
    ///
    /// ## Errors
    /// `ValidationError::OutOfRange` when `price × quantity` overflows.
    pub fn from_product(product: &Product, quantity: i64, sold_at: DateTime<Utc>) -> CoreResult<Self> {
        let total = product
            .price()
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        Ok(NewSale {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity_sold: quantity,
            total_cents: total.cents(),
            sold_at,
            category: product.category.clone(),
        })
    }

    /// Attaches the id the ledger assigned.
    pub fn into_sale(self, id: i64) -> Sale {
        Sale {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity_sold: self.quantity_sold,
            total_cents: self.total_cents,
            sold_at: self.sold_at,
            category: self.category,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn widget() -> Product {
        Product::new(1, "Widget", 10, Money::from_cents(250), "Hardware")
    }

    #[test]
    fn test_product_stock_predicates() {
        let mut product = widget();
        assert!(!product.is_low_stock(5));
        assert!(product.can_sell(10));
        assert!(!product.can_sell(11));

        product.quantity = 5;
        assert!(product.is_low_stock(5));
        assert!(!product.is_out_of_stock());

        product.quantity = 0;
        assert!(product.is_out_of_stock());
    }

    #[test]
    fn test_normalized_trims_text_fields() {
        let padded = Product::new(1, " Widget ", 10, Money::from_cents(250), "Hardware\t");
        let normalized = padded.normalized();

        assert_eq!(normalized, widget());
        assert_eq!(widget().normalized(), widget());
    }

    #[test]
    fn test_new_sale_snapshots_product() {
        let sold_at = Utc.with_ymd_and_hms(2025, 5, 4, 10, 0, 0).unwrap();
        let sale = NewSale::from_product(&widget(), 3, sold_at).unwrap();

        assert_eq!(sale.product_id, 1);
        assert_eq!(sale.product_name, "Widget");
        assert_eq!(sale.category, "Hardware");
        assert_eq!(sale.quantity_sold, 3);
        assert_eq!(sale.total_cents, 750);

        let stored = sale.into_sale(99);
        assert_eq!(stored.id, 99);
        assert_eq!(stored.total(), Money::from_cents(750));
    }

    #[test]
    fn test_new_sale_rejects_overflowing_total() {
        let product = Product::new(1, "Gold", 10, Money::from_cents(i64::MAX), "");
        let result = NewSale::from_product(&product, 2, Utc::now());
        assert!(result.is_err());
    }
}
