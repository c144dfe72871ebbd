//! Command handlers, one module per command group.
//!
//! Every handler checks the session's permission before touching the
//! database and returns the JSON value to print.

pub mod analytics;
pub mod csv;
pub mod product;
pub mod sale;
pub mod user;

use serde_json::Value;
use stockpile_db::Database;

use crate::cli::Command;
use crate::config::StockpileConfig;
use crate::error::CliResult;
use crate::session::Session;

/// Everything a command handler needs.
pub struct Context {
    pub db: Database,
    pub config: StockpileConfig,
    pub session: Session,
}

impl Context {
    pub fn new(db: Database, config: StockpileConfig, session: Session) -> Self {
        Context {
            db,
            config,
            session,
        }
    }
}

/// Runs one parsed command.
pub async fn dispatch(ctx: &Context, command: Command) -> CliResult<Value> {
    match command {
        Command::Product(cmd) => product::run(ctx, cmd).await,
        Command::Sale(cmd) => sale::run(ctx, cmd).await,
        Command::Analytics(cmd) => analytics::run(ctx, cmd).await,
        Command::Csv(cmd) => csv::run(ctx, cmd).await,
        Command::User(cmd) => user::run(ctx, cmd).await,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use stockpile_core::{Money, Product, Role, User};
    use stockpile_db::DbConfig;

    /// In-memory database with a small catalog, logged in as `role`.
    pub async fn context(role: Role) -> Context {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db.users().create("operator", "secret1", role).await.unwrap();

        let products = db.products();
        for product in [
            Product::new(1, "Widget", 10, Money::from_cents(250), "Hardware"),
            Product::new(2, "Green Tea", 3, Money::from_cents(199), "Drinks"),
            Product::new(3, "Notebook", 0, Money::from_cents(350), "Stationery"),
        ] {
            products.insert(&product).await.unwrap();
        }

        Context::new(db, StockpileConfig::default(), Session::new(user))
    }

    pub fn as_user(ctx: Context, user: User) -> Context {
        Context::new(ctx.db, ctx.config, Session::new(user))
    }
}
