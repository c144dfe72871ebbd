//! # Bill
//!
//! A multi-line bill assembled at the counter before checkout.
//!
//! ## Bill Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator Action          Bill Change                                   │
//! │  ───────────────          ───────────                                   │
//! │                                                                         │
//! │  add(widget, 2) ─────────► lines.push(Widget ×2)                       │
//! │  add(widget, 3) ─────────► Widget ×5   (same product merges)           │
//! │  set_quantity(widget, 0) ► line removed                                │
//! │                                                                         │
//! │  checkout_bill(&bill) ───► every line sold in ONE transaction          │
//! │                            (stockpile-db Checkout)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unit prices on the bill are what the operator was shown. The ledger
//! records the catalog price read inside the checkout transaction.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_sale_quantity;
use crate::{MAX_BILL_LINES, MAX_LINE_QUANTITY};

/// One product on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl BillLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        BillLine {
            product_id: product.id,
            product_name: product.name.clone(),
            category: product.category.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow("bill line"))
    }
}

/// A bill: unique lines keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    lines: Vec<BillLine>,
}

impl Bill {
    pub fn new() -> Self {
        Bill::default()
    }

    /// Adds `quantity` of a product, merging with an existing line for the
    /// same product.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` (or the merged quantity) is outside
    ///   `1..=MAX_LINE_QUANTITY`
    /// - `BillTooLarge` if a new line would exceed `MAX_BILL_LINES`
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_sale_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let merged = line.quantity.saturating_add(quantity);
            validate_sale_quantity(merged)?;
            line.quantity = merged;
            return Ok(());
        }

        if self.lines.len() >= MAX_BILL_LINES {
            return Err(CoreError::BillTooLarge {
                max: MAX_BILL_LINES,
            });
        }

        self.lines.push(BillLine::from_product(product, quantity));
        Ok(())
    }

    /// Replaces the quantity of a line. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }
        validate_sale_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::InvalidArgument(format!(
                "product {} is not on the bill",
                product_id
            ))),
        }
    }

    /// Removes a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: i64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[BillLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals at the prices shown on the bill.
    pub fn total(&self) -> CoreResult<Money> {
        let mut total = Money::zero();
        for line in &self.lines {
            total = total
                .checked_add(line.line_total()?)
                .ok_or(CoreError::AmountOverflow("bill"))?;
        }
        Ok(total)
    }
}
