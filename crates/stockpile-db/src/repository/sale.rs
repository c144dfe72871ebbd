//! # Sale Repository
//!
//! The sales ledger: an append-only log of sale lines.
//!
//! ## Ledger Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • Every confirmed sale line appends exactly one row                   │
//! │  • Rows are keyed by their own AUTOINCREMENT id, so selling the same   │
//! │    product twice keeps both rows                                       │
//! │  • Rows are never updated or deleted                                   │
//! │  • Name and category are snapshots taken at the moment of sale         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockpile_core::{NewSale, Sale};

/// Repository for the sales ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Appends one entry and returns it with its ledger id.
    ///
    /// This does not touch stock. Sales made at the counter go through
    /// [`Checkout`](crate::checkout::Checkout), which decrements stock and
    /// calls [`record_in`](Self::record_in) in one transaction.
    pub async fn record(&self, sale: &NewSale) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;
        Self::record_in(&mut conn, sale).await
    }

    /// Appends one entry on an existing connection or transaction.
    pub async fn record_in(conn: &mut SqliteConnection, sale: &NewSale) -> DbResult<Sale> {
        debug!(
            product_id = sale.product_id,
            quantity = sale.quantity_sold,
            total_cents = sale.total_cents,
            "Recording sale"
        );

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sales (
                product_id, product_name, quantity_sold,
                total_cents, sold_at, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(sale.product_id)
        .bind(&sale.product_name)
        .bind(sale.quantity_sold)
        .bind(sale.total_cents)
        .bind(sale.sold_at)
        .bind(&sale.category)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sale.clone().into_sale(id))
    }

    /// Gets one ledger entry.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, product_id, product_name, quantity_sold, total_cents, sold_at, category
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Returns the whole ledger in time order.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, product_id, product_name, quantity_sold, total_cents, sold_at, category
            FROM sales
            ORDER BY sold_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Loaded sales ledger");
        Ok(sales)
    }

    /// Returns sales with `from <= sold_at < to`.
    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, product_id, product_name, quantity_sold, total_cents, sold_at, category
            FROM sales
            WHERE sold_at >= ?1 AND sold_at < ?2
            ORDER BY sold_at, id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Returns every sale of one product, oldest first.
    pub async fn list_for_product(&self, product_id: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, product_id, product_name, quantity_sold, total_cents, sold_at, category
            FROM sales
            WHERE product_id = ?1
            ORDER BY sold_at, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts ledger entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
