//! Command-line grammar.
//!
//! ```text
//! stockpile [--config PATH] [--db PATH] [--user NAME] [--password PW] <command>
//!   product   add | get | list | update | remove | remove-all | low-stock
//!             restock | add-stock | stats
//!   sale      record | bill | list
//!   analytics revenue | best-sellers | by-category | over-time
//!             quantity-by-category | summary
//!   csv       export | import
//!   user      add | list | remove | set-role | whoami
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(name = "stockpile")]
#[command(about = "Inventory and sales ledger for small shops", version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "STOCKPILE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Account to run the command as
    #[arg(short, long, global = true, env = "STOCKPILE_USER")]
    pub user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true, env = "STOCKPILE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the product catalog
    #[command(subcommand)]
    Product(ProductCommand),

    /// Record and list sales
    #[command(subcommand)]
    Sale(SaleCommand),

    /// Reports over the sales ledger
    #[command(subcommand)]
    Analytics(AnalyticsCommand),

    /// Import or export the catalog as CSV
    #[command(subcommand)]
    Csv(CsvCommand),

    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product to the catalog
    Add(NewProductArgs),

    /// Show one product
    Get { id: i64 },

    /// List every product
    List,

    /// Change fields of an existing product
    Update(UpdateProductArgs),

    /// Delete a product
    Remove { id: i64 },

    /// Delete every product
    RemoveAll {
        /// Required, the catalog cannot be recovered
        #[arg(long)]
        yes: bool,
    },

    /// Products at or below the low stock threshold
    LowStock {
        #[arg(short, long)]
        threshold: Option<i64>,
    },

    /// Set the stock level of a product
    Restock { id: i64, quantity: i64 },

    /// Add units to the stock level of a product
    AddStock { id: i64, amount: i64 },

    /// Catalog statistics
    Stats {
        #[arg(short, long)]
        threshold: Option<i64>,
    },
}

#[derive(Debug, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub id: i64,

    #[arg(long)]
    pub name: String,

    #[arg(short, long, allow_hyphen_values = true)]
    pub quantity: i64,

    /// Unit price, e.g. 12.50
    #[arg(long, allow_hyphen_values = true)]
    pub price: String,

    #[arg(short, long, default_value = "")]
    pub category: String,
}

#[derive(Debug, Args)]
pub struct UpdateProductArgs {
    #[arg(long)]
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long, allow_hyphen_values = true)]
    pub quantity: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    pub price: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum SaleCommand {
    /// Sell units of one product
    Record {
        #[arg(long)]
        product: i64,

        #[arg(short, long)]
        quantity: i64,
    },

    /// Sell several products in one all-or-nothing transaction
    Bill {
        /// PRODUCT_ID:QUANTITY, repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<BillItem>,
    },

    /// List ledger entries
    List {
        #[arg(long)]
        product: Option<i64>,

        /// First day to include (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

/// One `--item 7:2` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillItem {
    pub product_id: i64,
    pub quantity: i64,
}

impl FromStr for BillItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PRODUCT_ID:QUANTITY, got '{}'", s))?;
        let product_id = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid product id '{}'", id))?;
        let quantity = quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity '{}'", quantity))?;
        Ok(BillItem {
            product_id,
            quantity,
        })
    }
}

// =============================================================================
// Analytics
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommand {
    /// Total revenue over the whole ledger
    Revenue,

    /// Products ranked by units sold
    BestSellers {
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },

    /// Revenue per category
    ByCategory,

    /// Revenue per day, week or month
    OverTime {
        /// daily, weekly or monthly
        #[arg(short, long, default_value = "daily")]
        bucket: String,
    },

    /// Units sold per category
    QuantityByCategory,

    /// Headline numbers in one report
    Summary {
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
}

// =============================================================================
// CSV
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CsvCommand {
    /// Write the catalog to a CSV file
    Export { path: PathBuf },

    /// Add products from a CSV file
    Import { path: PathBuf },
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account
    Add {
        username: String,

        #[arg(long = "new-password")]
        new_password: String,

        /// admin or staff
        #[arg(short, long, default_value = "staff")]
        role: String,
    },

    /// List accounts
    List,

    /// Delete an account
    Remove { id: i64 },

    /// Change the role of an account
    SetRole { id: i64, role: String },

    /// Show the logged-in account
    Whoami,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sale_record_with_credentials() {
        let cli = Cli::try_parse_from([
            "stockpile", "--user", "cashier", "--password", "secret", "sale", "record",
            "--product", "7", "-q", "2",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("cashier"));
        assert!(matches!(
            cli.command,
            Command::Sale(SaleCommand::Record {
                product: 7,
                quantity: 2
            })
        ));
    }

    #[test]
    fn test_parse_bill_items() {
        let cli = Cli::try_parse_from([
            "stockpile", "sale", "bill", "--item", "1:2", "--item", "3:1",
        ])
        .unwrap();

        let Command::Sale(SaleCommand::Bill { items }) = cli.command else {
            panic!("expected sale bill");
        };
        assert_eq!(
            items,
            vec![
                BillItem { product_id: 1, quantity: 2 },
                BillItem { product_id: 3, quantity: 1 },
            ]
        );
    }

    #[test]
    fn test_bill_item_rejects_garbage() {
        assert!("7".parse::<BillItem>().is_err());
        assert!("x:2".parse::<BillItem>().is_err());
        assert!("7:two".parse::<BillItem>().is_err());
        assert!(Cli::try_parse_from(["stockpile", "sale", "bill"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockpile", "product", "list", "--db", "/tmp/shop.db",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/shop.db")));
    }

    #[test]
    fn test_negative_price_reaches_validation() {
        let cli = Cli::try_parse_from([
            "stockpile", "product", "add", "--id", "1", "--name", "Pen", "-q", "3",
            "--price", "-1.00",
        ])
        .unwrap();

        let Command::Product(ProductCommand::Add(args)) = cli.command else {
            panic!("expected product add");
        };
        assert_eq!(args.price, "-1.00");
        assert_eq!(args.category, "");
    }

    #[test]
    fn test_sale_list_dates_come_in_pairs() {
        assert!(Cli::try_parse_from(["stockpile", "sale", "list", "--from", "2025-03-01"]).is_err());

        let cli = Cli::try_parse_from([
            "stockpile", "sale", "list", "--from", "2025-03-01", "--to", "2025-03-31",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Sale(SaleCommand::List { from: Some(_), to: Some(_), .. })
        ));
    }
}
