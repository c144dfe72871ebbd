//! # Product Repository
//!
//! The catalog store.
//!
//! ## Key Operations
//! - CRUD keyed by the operator-chosen product id
//! - Stock changes: guarded decrement, absolute restock, delivery increase
//! - Low-stock listing and catalog statistics
//! - Bulk load from parsed CSV rows
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read, compare in Rust, then write                           │
//! │     SELECT quantity ...          (another writer sells here)           │
//! │     UPDATE products SET quantity = 2                                   │
//! │                                                                         │
//! │  ✅ CORRECT: one statement checks and writes                           │
//! │     UPDATE products SET quantity = quantity - ?2                       │
//! │     WHERE id = ?1 AND quantity >= ?2                                   │
//! │     RETURNING ...                                                      │
//! │                                                                         │
//! │  No row back → look the product up to tell NotFound from              │
//! │  InsufficientStock. Stock is never driven below zero.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use stockpile_core::transfer::{CsvRow, ImportReport, RowError};
use stockpile_core::validation::{
    validate_product, validate_stock_increase, validate_stock_quantity, validate_threshold,
};
use stockpile_core::{
    CoreError, InventoryStats, Product, ValidationError, MAX_STOCK_QUANTITY,
};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// repo.insert(&Product::new(1, "Widget", 10, Money::from_cents(250), "Hardware")).await?;
/// let low = repo.list_low_stock(5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Inserts a new product. Name and category are stored trimmed.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::Domain(Validation))` - Empty name, quantity or price out of range
    /// * `Err(DbError::UniqueViolation)` - A product with this id exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        let product = product.normalized();
        validate_product(&product)?;

        debug!(id = product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, quantity, price_cents, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(&product.category)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("product id", product.id),
            other => other,
        })?;

        Ok(product)
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, price_cents, category
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the whole catalog ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, price_cents, category
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Replaces every field of an existing product, trimming name and
    /// category as [`insert`](Self::insert) does.
    ///
    /// ## Returns
    /// `true` if a product with this id existed and was updated.
    pub async fn update(&self, product: &Product) -> DbResult<bool> {
        let product = product.normalized();
        validate_product(&product)?;

        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                quantity = ?3,
                price_cents = ?4,
                category = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a product. Its sales stay in the ledger.
    ///
    /// ## Returns
    /// `true` if the product existed.
    pub async fn remove_by_id(&self, id: i64) -> DbResult<bool> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the whole catalog. Returns the number of products removed.
    pub async fn remove_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await?;

        info!(removed = result.rows_affected(), "Deleted all products");
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Lists products with `quantity <= threshold`, lowest stock first.
    pub async fn list_low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        validate_threshold(threshold)?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, price_cents, category
            FROM products
            WHERE quantity <= ?1
            ORDER BY quantity, id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!(threshold, count = products.len(), "Listed low-stock products");
        Ok(products)
    }

    /// Removes `amount` units from stock.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the decrement
    /// * `Err(Domain(ProductNotFound))` - No such product
    /// * `Err(Domain(InsufficientStock))` - Fewer than `amount` in stock, nothing changed
    pub async fn decrement_quantity(&self, id: i64, amount: i64) -> DbResult<Product> {
        validate_stock_increase(amount)?;

        let mut conn = self.pool.acquire().await?;
        decrement_in(&mut conn, id, amount).await
    }

    /// Sets the stock level to an absolute value.
    ///
    /// ## Returns
    /// `true` if the product existed.
    pub async fn restock(&self, id: i64, quantity: i64) -> DbResult<bool> {
        validate_stock_quantity(quantity)?;

        debug!(id, quantity, "Restocking product");

        let result = sqlx::query(
            r#"
            UPDATE products SET quantity = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a delivery of `amount` units to stock.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the delivery
    /// * `Err(Domain(ProductNotFound))` - No such product
    /// * `Err(Domain(Validation(OutOfRange)))` - The new level would exceed
    ///   `MAX_STOCK_QUANTITY`, nothing changed
    pub async fn add_stock(&self, id: i64, amount: i64) -> DbResult<Product> {
        validate_stock_increase(amount)?;

        debug!(id, amount, "Adding stock");

        let mut conn = self.pool.acquire().await?;
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1 AND quantity <= ?4 - ?2
            RETURNING id, name, quantity, price_cents, category
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(Utc::now())
        .bind(MAX_STOCK_QUANTITY)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(product) = updated {
            return Ok(product);
        }

        let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match current {
            None => Err(CoreError::ProductNotFound(id).into()),
            Some(current) => {
                warn!(id, current, amount, "Delivery would exceed the stock limit");
                Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 0,
                    max: MAX_STOCK_QUANTITY,
                }
                .into())
            }
        }
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// Counts products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Computes catalog statistics with the given low-stock threshold.
    pub async fn stats(&self, threshold: i64) -> DbResult<InventoryStats> {
        validate_threshold(threshold)?;

        let products = self.list_all().await?;
        Ok(InventoryStats::compute(&products, threshold))
    }

    // =========================================================================
    // Bulk Load
    // =========================================================================

    /// Inserts parsed CSV rows in one transaction.
    ///
    /// Rows whose id is already in the catalog (or earlier in the same
    /// file) are skipped and reported; the rest are committed together.
    pub async fn import(&self, rows: &[CsvRow]) -> DbResult<ImportReport> {
        let mut tx = self.pool.begin().await?;
        let mut report = ImportReport::default();

        for row in rows {
            let product = row.product.normalized();
            validate_product(&product)?;

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO products (id, name, quantity, price_cents, category)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(product.id)
            .bind(&product.name)
            .bind(product.quantity)
            .bind(product.price_cents)
            .bind(&product.category)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(line = row.line, id = product.id, "Skipping duplicate product");
                report.skipped.push(RowError {
                    line: row.line,
                    message: format!("product id {} already exists", product.id),
                });
            } else {
                report.imported += 1;
            }
        }

        tx.commit().await?;

        info!(
            imported = report.imported,
            skipped = report.skipped.len(),
            "Product import finished"
        );
        Ok(report)
    }
}

/// Guarded decrement on an existing connection or transaction.
///
/// The check and the write are a single statement, so a concurrent sale
/// can never push stock below zero between them.
pub(crate) async fn decrement_in(
    conn: &mut SqliteConnection,
    id: i64,
    amount: i64,
) -> DbResult<Product> {
    debug!(id, amount, "Decrementing stock");

    let updated = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products SET quantity = quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        RETURNING id, name, quantity, price_cents, category
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(product) = updated {
        return Ok(product);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let err = match available {
        None => CoreError::ProductNotFound(id),
        Some(available) => CoreError::InsufficientStock {
            product_id: id,
            available,
            requested: amount,
        },
    };
    Err(err.into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockpile_core::transfer::{read_products, write_products};
    use stockpile_core::Money;

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn widget() -> Product {
        Product::new(1, "Widget", 10, Money::from_cents(250), "Hardware")
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(widget()));
        assert_eq!(repo.get_by_id(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_without_persisting() {
        let repo = repo().await;

        let negative_qty = Product { quantity: -1, ..widget() };
        let err = repo.insert(&negative_qty).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Negative { .. }))
        ));

        let negative_price = Product { price_cents: -5, ..widget() };
        assert!(repo.insert(&negative_price).await.is_err());

        let blank_name = Product { name: "  ".to_string(), ..widget() };
        assert!(repo.insert(&blank_name).await.is_err());

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        let err = repo.insert(&widget()).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        let renamed = Product { name: "Gadget".to_string(), price_cents: 300, ..widget() };
        assert!(repo.update(&renamed).await.unwrap());
        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(renamed));

        let missing = Product { id: 99, ..widget() };
        assert!(!repo.update(&missing).await.unwrap());

        assert!(repo.remove_by_id(1).await.unwrap());
        assert!(!repo.remove_by_id(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_all() {
        let repo = repo().await;
        for id in 1..=3 {
            repo.insert(&Product { id, ..widget() }).await.unwrap();
        }

        assert_eq!(repo.remove_all().await.unwrap(), 3);
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decrement_quantity() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        let after = repo.decrement_quantity(1, 4).await.unwrap();
        assert_eq!(after.quantity, 6);

        let err = repo.decrement_quantity(1, 7).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                product_id: 1,
                available: 6,
                requested: 7
            })
        ));
        assert_eq!(repo.get_by_id(1).await.unwrap().unwrap().quantity, 6);

        let err = repo.decrement_quantity(42, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(42))));

        assert!(repo.decrement_quantity(1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_restock_and_add_stock() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        assert!(repo.restock(1, 50).await.unwrap());
        assert_eq!(repo.get_by_id(1).await.unwrap().unwrap().quantity, 50);
        assert!(!repo.restock(2, 50).await.unwrap());
        assert!(repo.restock(1, -1).await.is_err());

        let after = repo.add_stock(1, 5).await.unwrap();
        assert_eq!(after.quantity, 55);
        assert!(repo.add_stock(2, 5).await.is_err());
    }

    #[tokio::test]
    async fn test_add_stock_stops_at_the_stock_limit() {
        let repo = repo().await;
        let nearly_full = Product { quantity: MAX_STOCK_QUANTITY - 1, ..widget() };
        repo.insert(&nearly_full).await.unwrap();

        let err = repo.add_stock(1, 5).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(repo.add_stock(1, i64::MAX).await.is_err());

        let products = repo.list_all().await.unwrap();
        assert_eq!(products, [nearly_full]);

        let full = repo.add_stock(1, 1).await.unwrap();
        assert_eq!(full.quantity, MAX_STOCK_QUANTITY);
        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(full));
    }

    #[tokio::test]
    async fn test_quantities_beyond_the_limit_are_rejected() {
        let repo = repo().await;

        let huge = Product { quantity: i64::MAX - 1, ..widget() };
        let err = repo.insert(&huge).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let dear = Product { price_cents: i64::MAX, ..widget() };
        assert!(repo.insert(&dear).await.is_err());

        repo.insert(&widget()).await.unwrap();
        assert!(repo.restock(1, MAX_STOCK_QUANTITY + 1).await.is_err());
        assert!(repo.restock(1, MAX_STOCK_QUANTITY).await.unwrap());
        assert!(repo.update(&huge).await.is_err());
        assert_eq!(repo.get_by_id(1).await.unwrap().unwrap().quantity, MAX_STOCK_QUANTITY);
    }

    #[tokio::test]
    async fn test_schema_rejects_out_of_range_and_non_integer_stock() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        for sql in [
            "UPDATE products SET quantity = 1000000001 WHERE id = ?1",
            "UPDATE products SET quantity = 2.5 WHERE id = ?1",
            "UPDATE products SET price_cents = 100000000001 WHERE id = ?1",
        ] {
            let err: DbError = sqlx::query(sql)
                .bind(1)
                .execute(&repo.pool)
                .await
                .unwrap_err()
                .into();
            assert!(matches!(err, DbError::CheckViolation(_)), "{}", sql);
        }
        assert_eq!(repo.list_all().await.unwrap(), [widget()]);
    }

    #[tokio::test]
    async fn test_text_fields_are_stored_trimmed() {
        let repo = repo().await;
        let padded = Product::new(1, " Widget", 10, Money::from_cents(250), "Hardware ");

        let stored = repo.insert(&padded).await.unwrap();
        assert_eq!(stored, widget());
        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(widget()));

        let renamed = Product { name: "\tGadget  ".to_string(), ..widget() };
        assert!(repo.update(&renamed).await.unwrap());
        assert_eq!(repo.get_by_id(1).await.unwrap().unwrap().name, "Gadget");
    }

    #[tokio::test]
    async fn test_export_then_import_reproduces_padded_catalog() {
        let source = repo().await;
        source
            .insert(&Product::new(1, " Widget", 3, Money::from_cents(100), "Tools "))
            .await
            .unwrap();
        source
            .insert(&Product::new(2, "Green Tea ", 0, Money::from_cents(450), " Drinks"))
            .await
            .unwrap();
        let catalog = source.list_all().await.unwrap();

        let mut file = Vec::new();
        write_products(&mut file, &catalog).unwrap();
        let parsed = read_products(file.as_slice()).unwrap();
        assert!(parsed.errors.is_empty());

        let target = repo().await;
        let report = target.import(&parsed.rows).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(target.list_all().await.unwrap(), catalog);
    }

    #[tokio::test]
    async fn test_low_stock_and_stats() {
        let repo = repo().await;
        let quantities = [(1, 0), (2, 5), (3, 2), (4, 30)];
        for (id, quantity) in quantities {
            repo.insert(&Product { id, quantity, ..widget() }).await.unwrap();
        }

        let low: Vec<i64> = repo
            .list_low_stock(5)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(low, [1, 3, 2]);

        let stats = repo.stats(5).await.unwrap();
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.out_of_stock_count, 1);
        assert_eq!(stats.most_stocked.map(|p| p.id), Some(4));
    }

    #[tokio::test]
    async fn test_import_skips_duplicates() {
        let repo = repo().await;
        repo.insert(&widget()).await.unwrap();

        let rows = vec![
            CsvRow { line: 2, product: widget() },
            CsvRow { line: 3, product: Product { id: 2, ..widget() } },
            CsvRow { line: 4, product: Product { id: 2, ..widget() } },
        ];
        let report = repo.import(&rows).await.unwrap();

        assert_eq!(report.imported, 1);
        let skipped: Vec<u64> = report.skipped.iter().map(|e| e.line).collect();
        assert_eq!(skipped, [2, 4]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
