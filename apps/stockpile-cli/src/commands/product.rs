//! Catalog commands.

use serde_json::{json, Value};
use stockpile_core::{Action, Money, Product};
use tracing::info;

use super::Context;
use crate::cli::{NewProductArgs, ProductCommand, UpdateProductArgs};
use crate::error::{CliError, CliResult};
use crate::output::to_json;

pub async fn run(ctx: &Context, command: ProductCommand) -> CliResult<Value> {
    let products = ctx.db.products();

    match command {
        ProductCommand::Add(args) => {
            ctx.session.require(Action::ManageProducts)?;
            let product = new_product(args)?;
            let stored = products.insert(&product).await?;
            to_json(&stored)
        }

        ProductCommand::Get { id } => {
            ctx.session.require(Action::ViewProducts)?;
            let product = products
                .get_by_id(id)
                .await?
                .ok_or_else(|| CliError::not_found("Product", id))?;
            to_json(&product)
        }

        ProductCommand::List => {
            ctx.session.require(Action::ViewProducts)?;
            to_json(&products.list_all().await?)
        }

        ProductCommand::Update(args) => {
            ctx.session.require(Action::ManageProducts)?;
            let existing = products
                .get_by_id(args.id)
                .await?
                .ok_or_else(|| CliError::not_found("Product", args.id))?;
            let updated = apply_update(existing, args)?.normalized();

            if !products.update(&updated).await? {
                return Err(CliError::not_found("Product", updated.id));
            }
            to_json(&updated)
        }

        ProductCommand::Remove { id } => {
            ctx.session.require(Action::ManageProducts)?;
            if !products.remove_by_id(id).await? {
                return Err(CliError::not_found("Product", id));
            }
            Ok(json!({ "removed": id }))
        }

        ProductCommand::RemoveAll { yes } => {
            ctx.session.require(Action::ManageProducts)?;
            if !yes {
                return Err(CliError::invalid_argument(
                    "Refusing to delete the whole catalog without --yes",
                ));
            }
            let removed = products.remove_all().await?;
            info!(removed, username = %ctx.session.user().username, "Catalog cleared");
            Ok(json!({ "removed": removed }))
        }

        ProductCommand::LowStock { threshold } => {
            ctx.session.require(Action::ViewProducts)?;
            let threshold = threshold.unwrap_or(ctx.config.inventory.low_stock_threshold);
            to_json(&products.list_low_stock(threshold).await?)
        }

        ProductCommand::Restock { id, quantity } => {
            ctx.session.require(Action::ManageProducts)?;
            if !products.restock(id, quantity).await? {
                return Err(CliError::not_found("Product", id));
            }
            let product = products
                .get_by_id(id)
                .await?
                .ok_or_else(|| CliError::not_found("Product", id))?;
            to_json(&product)
        }

        ProductCommand::AddStock { id, amount } => {
            ctx.session.require(Action::ManageProducts)?;
            to_json(&products.add_stock(id, amount).await?)
        }

        ProductCommand::Stats { threshold } => {
            ctx.session.require(Action::ViewProducts)?;
            let threshold = threshold.unwrap_or(ctx.config.inventory.low_stock_threshold);
            to_json(&products.stats(threshold).await?)
        }
    }
}

fn parse_price(price: &str) -> CliResult<Money> {
    Ok(price.parse::<Money>()?)
}

fn new_product(args: NewProductArgs) -> CliResult<Product> {
    Ok(Product::new(
        args.id,
        args.name,
        args.quantity,
        parse_price(&args.price)?,
        args.category,
    ))
}

/// Overlays the supplied fields on the stored product.
fn apply_update(mut product: Product, args: UpdateProductArgs) -> CliResult<Product> {
    if let Some(name) = args.name {
        product.name = name;
    }
    if let Some(quantity) = args.quantity {
        product.quantity = quantity;
    }
    if let Some(price) = args.price {
        product.price_cents = parse_price(&price)?.cents();
    }
    if let Some(category) = args.category {
        product.category = category;
    }
    Ok(product)
}
