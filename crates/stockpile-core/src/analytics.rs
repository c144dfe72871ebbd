//! # Sales Analytics
//!
//! Aggregations derived from the sales ledger. Every function is a pure
//! fold over `&[Sale]`; the caller decides where the sales come from
//! (stockpile-db loads the full ledger per request).
//!
//! ## Reports
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Ledger (&[Sale])                                                       │
//! │       │                                                                 │
//! │       ├──► total_revenue ─────────► Money                               │
//! │       ├──► best_selling(n) ───────► Vec<ProductSales>  (by units)       │
//! │       ├──► revenue_by_category ───► BTreeMap<category, Money>           │
//! │       ├──► quantity_by_category ──► BTreeMap<category, units>           │
//! │       ├──► revenue_over_time(b) ──► BTreeMap<bucket key, Money>         │
//! │       └──► summary(n) ────────────► SalesSummary (all of the above)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bucket Keys
//! ```text
//! Daily    2025-03-09     (%Y-%m-%d)
//! Weekly   2025-W10       (ISO week-year and week, %G-W%V)
//! Monthly  2025-03        (%Y-%m)
//! ```
//! All keys are zero padded, so the `BTreeMap` order is chronological.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Sale;

// =============================================================================
// Time Buckets
// =============================================================================

/// Granularity of a revenue-over-time report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Daily,
    Weekly,
    Monthly,
}

impl TimeBucket {
    fn format(&self) -> &'static str {
        match self {
            TimeBucket::Daily => "%Y-%m-%d",
            TimeBucket::Weekly => "%G-W%V",
            TimeBucket::Monthly => "%Y-%m",
        }
    }

    /// Returns the bucket key a timestamp falls into.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use stockpile_core::analytics::TimeBucket;
    ///
    /// let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    /// assert_eq!(TimeBucket::Daily.key(&at), "2025-01-01");
    /// assert_eq!(TimeBucket::Weekly.key(&at), "2025-W01");
    /// assert_eq!(TimeBucket::Monthly.key(&at), "2025-01");
    /// ```
    pub fn key(&self, at: &DateTime<Utc>) -> String {
        at.format(self.format()).to_string()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Daily => "daily",
            TimeBucket::Weekly => "weekly",
            TimeBucket::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(TimeBucket::Daily),
            "weekly" => Ok(TimeBucket::Weekly),
            "monthly" => Ok(TimeBucket::Monthly),
            _ => Err(CoreError::InvalidArgument(format!(
                "invalid period '{}', use daily, weekly or monthly",
                s
            ))),
        }
    }
}

// =============================================================================
// Report Types
// =============================================================================

/// Units and revenue for one product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

/// Headline numbers for the analytics dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_revenue: Money,
    pub sale_count: usize,
    pub units_sold: i64,
    pub best_sellers: Vec<ProductSales>,
    pub revenue_by_category: BTreeMap<String, Money>,
}

// =============================================================================
// Aggregations
// =============================================================================

/// Adds `amount` to `total`, failing instead of wrapping.
fn accumulate(total: &mut Money, amount: Money, what: &'static str) -> CoreResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or(CoreError::AmountOverflow(what))?;
    Ok(())
}

fn accumulate_units(total: &mut i64, units: i64) -> CoreResult<()> {
    *total = total
        .checked_add(units)
        .ok_or(CoreError::AmountOverflow("units sold"))?;
    Ok(())
}

/// Sum of every sale total.
pub fn total_revenue(sales: &[Sale]) -> CoreResult<Money> {
    Money::checked_sum(sales.iter().map(Sale::total))
        .ok_or(CoreError::AmountOverflow("revenue"))
}

/// Top `top_n` products by units sold.
///
/// Sales are grouped by the product name recorded on the sale, so a
/// product keeps its history under the name it was sold as. Ties are
/// broken by name, ascending.
///
/// ```rust
/// # use chrono::Utc;
/// # use stockpile_core::{Sale, analytics::best_selling};
/// # fn sale(name: &str, qty: i64) -> Sale {
/// #     Sale { id: 0, product_id: 0, product_name: name.into(), quantity_sold: qty,
/// #            total_cents: 0, sold_at: Utc::now(), category: String::new() }
/// # }
/// let sales = vec![sale("A", 3), sale("B", 10), sale("C", 1)];
/// let top: Vec<_> = best_selling(&sales, 2)
///     .unwrap()
///     .into_iter()
///     .map(|p| p.product_name)
///     .collect();
/// assert_eq!(top, ["B", "A"]);
/// ```
pub fn best_selling(sales: &[Sale], top_n: usize) -> CoreResult<Vec<ProductSales>> {
    let mut by_name: HashMap<&str, (i64, Money)> = HashMap::new();
    for sale in sales {
        let (units, revenue) = by_name
            .entry(sale.product_name.as_str())
            .or_insert((0, Money::zero()));
        accumulate_units(units, sale.quantity_sold)?;
        accumulate(revenue, sale.total(), "product revenue")?;
    }

    let mut ranked: Vec<ProductSales> = by_name
        .into_iter()
        .map(|(name, (quantity_sold, revenue))| ProductSales {
            product_name: name.to_string(),
            quantity_sold,
            revenue,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(top_n);
    Ok(ranked)
}

/// Revenue per category label recorded on the sale.
pub fn revenue_by_category(sales: &[Sale]) -> CoreResult<BTreeMap<String, Money>> {
    let mut by_category = BTreeMap::new();
    for sale in sales {
        let total = by_category
            .entry(sale.category.clone())
            .or_insert_with(Money::zero);
        accumulate(total, sale.total(), "category revenue")?;
    }
    Ok(by_category)
}

/// Units sold per category label recorded on the sale.
pub fn quantity_by_category(sales: &[Sale]) -> CoreResult<BTreeMap<String, i64>> {
    let mut by_category = BTreeMap::new();
    for sale in sales {
        let units = by_category.entry(sale.category.clone()).or_insert(0);
        accumulate_units(units, sale.quantity_sold)?;
    }
    Ok(by_category)
}

/// Revenue per time bucket, keyed chronologically.
pub fn revenue_over_time(
    sales: &[Sale],
    bucket: TimeBucket,
) -> CoreResult<BTreeMap<String, Money>> {
    let mut by_bucket = BTreeMap::new();
    for sale in sales {
        let total = by_bucket
            .entry(bucket.key(&sale.sold_at))
            .or_insert_with(Money::zero);
        accumulate(total, sale.total(), "period revenue")?;
    }
    Ok(by_bucket)
}

/// Bundles the headline reports in one pass over the ledger snapshot.
pub fn summary(sales: &[Sale], top_n: usize) -> CoreResult<SalesSummary> {
    let mut units_sold = 0;
    for sale in sales {
        accumulate_units(&mut units_sold, sale.quantity_sold)?;
    }

    Ok(SalesSummary {
        total_revenue: total_revenue(sales)?,
        sale_count: sales.len(),
        units_sold,
        best_sellers: best_selling(sales, top_n)?,
        revenue_by_category: revenue_by_category(sales)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
