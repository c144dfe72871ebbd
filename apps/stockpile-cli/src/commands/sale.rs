//! Sale commands: single sales, bills and the ledger listing.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::{json, Value};
use stockpile_core::{Action, Bill, CoreError, Money, Sale};

use super::Context;
use crate::cli::{BillItem, SaleCommand};
use crate::error::{CliError, CliResult};
use crate::output::to_json;

pub async fn run(ctx: &Context, command: SaleCommand) -> CliResult<Value> {
    match command {
        SaleCommand::Record { product, quantity } => {
            ctx.session.require(Action::RecordSales)?;
            let sale = ctx.db.checkout().sell(product, quantity).await?;
            to_json(&sale)
        }

        SaleCommand::Bill { items } => {
            ctx.session.require(Action::RecordSales)?;
            let bill = build_bill(ctx, &items).await?;
            let sales = ctx.db.checkout().checkout_bill(&bill).await?;
            let total = Money::checked_sum(sales.iter().map(Sale::total))
                .ok_or(CoreError::AmountOverflow("bill"))?;

            Ok(json!({
                "sales": to_json(&sales)?,
                "total_cents": total.cents(),
                "total": total.to_string(),
            }))
        }

        SaleCommand::List { product, from, to } => {
            ctx.session.require(Action::ViewSales)?;
            let ledger = ctx.db.sales();

            let mut sales = match (from, to) {
                (Some(from), Some(to)) => {
                    let (start, end) = day_range(from, to)?;
                    ledger.list_between(start, end).await?
                }
                _ => match product {
                    Some(id) => ledger.list_for_product(id).await?,
                    None => ledger.list_all().await?,
                },
            };
            if let Some(id) = product {
                sales.retain(|sale| sale.product_id == id);
            }

            to_json(&sales)
        }
    }
}

/// Looks up each item's product and collects the lines into a bill.
async fn build_bill(ctx: &Context, items: &[BillItem]) -> CliResult<Bill> {
    let products = ctx.db.products();
    let mut bill = Bill::new();

    for item in items {
        let product = products
            .get_by_id(item.product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(item.product_id))?;
        bill.add(&product, item.quantity)?;
    }

    Ok(bill)
}

/// `[from 00:00, day after to 00:00)` in UTC.
fn day_range(from: NaiveDate, to: NaiveDate) -> CliResult<(DateTime<Utc>, DateTime<Utc>)> {
    if to < from {
        return Err(CliError::invalid_argument(format!(
            "--to ({}) is before --from ({})",
            to, from
        )));
    }
    let after = to
        .succ_opt()
        .ok_or_else(|| CliError::invalid_argument("--to is out of range"))?;

    let midnight = |date: NaiveDate| Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    Ok((midnight(from), midnight(after)))
}
