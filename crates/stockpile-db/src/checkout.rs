//! # Checkout
//!
//! Atomic sale transactions: stock decrement and ledger append commit
//! together or not at all.
//!
//! ## One Sale Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Requested ──► validate quantity (1..=9999)       ✗ → Rejected         │
//! │      │                                              (no transaction)   │
//! │      ▼                                                                  │
//! │  BEGIN                                                                  │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  StockChecked + StockDecremented                                       │
//! │      UPDATE products SET quantity = quantity - q                       │
//! │      WHERE id = ? AND quantity >= q RETURNING ...                      │
//! │      no row → ProductNotFound | InsufficientStock  ✗ → ROLLBACK        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Recorded                                                              │
//! │      INSERT INTO sales (snapshot of name, category, q × price)         │
//! │      │                                              ✗ → ROLLBACK        │
//! │      ▼                                                                  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the check and the decrement are one statement under SQLite's
//! single-writer lock, two processes selling the last unit cannot both
//! succeed. A bill runs every line inside the same transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::decrement_in;
use crate::repository::sale::SaleRepository;
use stockpile_core::validation::validate_sale_quantity;
use stockpile_core::{Bill, CoreError, NewSale, Sale};

/// Where a sale line is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleStage {
    Requested,
    StockChecked,
    StockDecremented,
    Recorded,
    Rejected,
}

impl fmt::Display for SaleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaleStage::Requested => "requested",
            SaleStage::StockChecked => "stock_checked",
            SaleStage::StockDecremented => "stock_decremented",
            SaleStage::Recorded => "recorded",
            SaleStage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// The sale transaction service.
///
/// ## Usage
/// ```rust,ignore
/// let sale = db.checkout().sell(product_id, 2).await?;
///
/// let mut bill = Bill::new();
/// bill.add(&widget, 2)?;
/// bill.add(&gadget, 1)?;
/// let sales = db.checkout().checkout_bill(&bill).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
}

impl Checkout {
    pub fn new(pool: SqlitePool) -> Self {
        Checkout { pool }
    }

    /// Sells `quantity` units of one product now.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The ledger entry; stock has been decremented
    /// * `Err(Domain(Validation))` - Quantity outside 1..=9999, nothing touched
    /// * `Err(Domain(ProductNotFound))` - Rolled back
    /// * `Err(Domain(InsufficientStock))` - Rolled back, stock unchanged
    pub async fn sell(&self, product_id: i64, quantity: i64) -> DbResult<Sale> {
        self.sell_at(product_id, quantity, Utc::now()).await
    }

    /// Same as [`sell`](Self::sell) with an explicit sale time.
    pub async fn sell_at(
        &self,
        product_id: i64,
        quantity: i64,
        sold_at: DateTime<Utc>,
    ) -> DbResult<Sale> {
        debug!(product_id, quantity, stage = %SaleStage::Requested, "Sale requested");
        if let Err(err) = validate_sale_quantity(quantity) {
            warn!(product_id, quantity, stage = %SaleStage::Rejected, error = %err, "Sale rejected");
            return Err(err.into());
        }

        let mut tx = self.pool.begin().await?;
        let sale = sell_line(&mut tx, product_id, quantity, sold_at).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = sale.id,
            product_id,
            quantity,
            total_cents = sale.total_cents,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Sells every line of a bill in one transaction.
    ///
    /// Either every line is decremented and recorded, or nothing is. All
    /// entries share one sale time.
    pub async fn checkout_bill(&self, bill: &Bill) -> DbResult<Vec<Sale>> {
        if bill.is_empty() {
            return Err(CoreError::EmptyBill.into());
        }
        for line in bill.lines() {
            validate_sale_quantity(line.quantity)?;
        }

        let sold_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut sales = Vec::with_capacity(bill.line_count());

        for line in bill.lines() {
            let sale = sell_line(&mut tx, line.product_id, line.quantity, sold_at).await?;
            sales.push(sale);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            lines = sales.len(),
            total_cents = sales.iter().map(|s| s.total_cents).sum::<i64>(),
            "Bill checked out"
        );
        Ok(sales)
    }
}

/// Decrements and records one line on the caller's transaction.
///
/// The caller drops the transaction on error, which rolls back anything
/// this line or earlier lines wrote.
async fn sell_line(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    sold_at: DateTime<Utc>,
) -> DbResult<Sale> {
    let product = match decrement_in(conn, product_id, quantity).await {
        Ok(product) => product,
        Err(err) => {
            warn!(
                product_id,
                quantity,
                stage = %SaleStage::StockChecked,
                error = %err,
                "Sale rejected"
            );
            return Err(err);
        }
    };
    debug!(
        product_id,
        remaining = product.quantity,
        stage = %SaleStage::StockDecremented,
        "Stock decremented"
    );

    let new_sale = NewSale::from_product(&product, quantity, sold_at)?;
    let sale = SaleRepository::record_in(conn, &new_sale).await?;
    debug!(sale_id = sale.id, stage = %SaleStage::Recorded, "Ledger entry appended");

    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockpile_core::{Money, Product};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new(1, "Widget", 10, Money::from_cents(250), "Hardware"))
            .await
            .unwrap();
        db.products()
            .insert(&Product::new(2, "Tea", 1, Money::from_cents(400), "Drinks"))
            .await
            .unwrap();
        db
    }

    async fn quantity(db: &Database, id: i64) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_sell_decrements_and_records() {
        let db = setup().await;

        let sale = db.checkout().sell(1, 3).await.unwrap();

        assert_eq!(quantity(&db, 1).await, 7);
        assert_eq!(sale.quantity_sold, 3);
        assert_eq!(sale.total_cents, 750);
        assert_eq!(sale.product_name, "Widget");
        assert_eq!(sale.category, "Hardware");
        assert_eq!(db.sales().list_all().await.unwrap(), vec![sale]);
    }

    #[tokio::test]
    async fn test_sell_more_than_stock_changes_nothing() {
        let db = setup().await;

        let err = db.checkout().sell(1, 11).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                product_id: 1,
                available: 10,
                requested: 11
            })
        ));
        assert_eq!(quantity(&db, 1).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sell_unknown_product_and_bad_quantity() {
        let db = setup().await;

        assert!(matches!(
            db.checkout().sell(99, 1).await,
            Err(DbError::Domain(CoreError::ProductNotFound(99)))
        ));
        assert!(matches!(
            db.checkout().sell(1, 0).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
        assert!(db.checkout().sell(1, 10_000).await.is_err());
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sell_exact_stock_reaches_zero() {
        let db = setup().await;

        db.checkout().sell(2, 1).await.unwrap();
        assert_eq!(quantity(&db, 2).await, 0);
        assert!(db.checkout().sell(2, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_repeated_sales_are_separate_entries() {
        let db = setup().await;

        let first = db.checkout().sell(1, 1).await.unwrap();
        let second = db.checkout().sell(1, 2).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(db.sales().list_for_product(1).await.unwrap().len(), 2);
        assert_eq!(quantity(&db, 1).await, 7);
    }

    #[tokio::test]
    async fn test_sale_keeps_snapshot_after_product_changes() {
        let db = setup().await;
        db.checkout().sell(1, 2).await.unwrap();

        let renamed = Product::new(1, "Widget Pro", 8, Money::from_cents(999), "Tools");
        db.products().update(&renamed).await.unwrap();
        db.products().remove_by_id(1).await.unwrap();

        let sales = db.sales().list_all().await.unwrap();
        assert_eq!(sales[0].product_name, "Widget");
        assert_eq!(sales[0].category, "Hardware");
        assert_eq!(sales[0].total_cents, 500);
    }

    #[tokio::test]
    async fn test_checkout_bill_commits_all_lines() {
        let db = setup().await;
        let widget = db.products().get_by_id(1).await.unwrap().unwrap();
        let tea = db.products().get_by_id(2).await.unwrap().unwrap();

        let mut bill = Bill::new();
        bill.add(&widget, 2).unwrap();
        bill.add(&tea, 1).unwrap();
        bill.add(&widget, 1).unwrap();

        let sales = db.checkout().checkout_bill(&bill).await.unwrap();

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].quantity_sold, 3);
        assert_eq!(sales[0].sold_at, sales[1].sold_at);
        assert_eq!(quantity(&db, 1).await, 7);
        assert_eq!(quantity(&db, 2).await, 0);
    }

    #[tokio::test]
    async fn test_checkout_bill_rolls_back_on_failure() {
        let db = setup().await;
        let widget = db.products().get_by_id(1).await.unwrap().unwrap();
        let tea = db.products().get_by_id(2).await.unwrap().unwrap();

        let mut bill = Bill::new();
        bill.add(&widget, 4).unwrap();
        bill.add(&tea, 5).unwrap();

        let err = db.checkout().checkout_bill(&bill).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { product_id: 2, .. })
        ));
        assert_eq!(quantity(&db, 1).await, 10);
        assert_eq!(quantity(&db, 2).await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_empty_bill() {
        let db = setup().await;
        assert!(matches!(
            db.checkout().checkout_bill(&Bill::new()).await,
            Err(DbError::Domain(CoreError::EmptyBill))
        ));
    }
}
