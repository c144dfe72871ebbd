//! Populates a database with a demo catalog and a few weeks of sales so
//! the analytics reports have something to show.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockpile_dev.db with 21 days of sales (default)
//! cargo run -p stockpile-db --bin seed
//!
//! # Custom database and history length
//! cargo run -p stockpile-db --bin seed -- --db ./data/stockpile.db --days 60
//! ```
//!
//! Sales go through `Checkout`, so stock levels and the ledger stay
//! consistent exactly as they would at the counter.

use chrono::{Duration, Utc};
use std::env;
use stockpile_core::{Money, Product, Role};
use stockpile_db::{Database, DbConfig, DbError};

/// (category, [(name, price in cents)])
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Stationery",
        &[
            ("Ballpoint Pen", 120),
            ("Gel Pen", 180),
            ("A4 Notebook", 350),
            ("Sticky Notes", 225),
            ("Stapler", 899),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Crisps", 150),
            ("Chocolate Bar", 110),
            ("Granola Bar", 95),
            ("Trail Mix", 420),
        ],
    ),
    (
        "Drinks",
        &[
            ("Bottled Water", 80),
            ("Orange Juice", 240),
            ("Cold Brew", 375),
            ("Green Tea", 199),
        ],
    ),
    (
        "Hardware",
        &[
            ("AA Batteries 4-Pack", 650),
            ("USB-C Cable", 1299),
            ("Phone Charger", 1999),
        ],
    ),
];

const MAX_DAYS: i64 = 3_650;

const USAGE: &str = "\
Usage: seed [--db <PATH>] [--days <N>]

  -d, --db <PATH>   database file (default: ./stockpile_dev.db)
  -n, --days <N>    days of sales history, 1 to 3650 (default: 21)";

struct SeedArgs {
    db_path: String,
    days: i64,
}

impl SeedArgs {
    /// `Ok(None)` when help was requested.
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let mut parsed = SeedArgs {
            db_path: "./stockpile_dev.db".to_string(),
            days: 21,
        };

        while let Some(flag) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{} needs a value", flag));
            match flag.as_str() {
                "-d" | "--db" => parsed.db_path = value()?,
                "-n" | "--days" => {
                    let raw = value()?;
                    parsed.days = raw
                        .parse()
                        .ok()
                        .filter(|days: &i64| (1..=MAX_DAYS).contains(days))
                        .ok_or_else(|| {
                            format!("--days must be between 1 and {}, got '{}'", MAX_DAYS, raw)
                        })?;
                }
                "-h" | "--help" => return Ok(None),
                other => return Err(format!("unknown argument '{}'", other)),
            }
        }
        Ok(Some(parsed))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let SeedArgs { db_path, days } = match SeedArgs::parse(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
    };

    println!("Seeding {} with {} days of sales", db_path, days);

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Catalog already holds {} products; nothing to do.", existing);
        return Ok(());
    }

    if db.users().ensure_default_admin("admin", "admin123").await? {
        println!("  admin account: admin / admin123");
    }
    if db.users().get_by_username("cashier").await?.is_none() {
        db.users().create("cashier", "cashier123", Role::Staff).await?;
        println!("  staff account: cashier / cashier123");
    }

    let mut ids = Vec::new();
    let mut next_id = 1001;
    for (category, items) in CATALOG {
        for (name, price_cents) in items.iter() {
            let stock = 40 + (next_id % 7) * 15;
            let product = Product::new(next_id, *name, stock, Money::from_cents(*price_cents), *category);
            db.products().insert(&product).await?;
            ids.push(next_id);
            next_id += 1;
        }
    }
    println!("  products:      {}", ids.len());

    let history = Duration::try_days(days).ok_or("--days is out of range")?;
    let start = Utc::now() - history;
    let mut recorded = 0;
    let mut rejected = 0;

    for day in 0..days {
        let sales_today = 3 + (day % 4) as usize;
        for n in 0..sales_today {
            let seed = (day as usize) * 31 + n * 7;
            let product_id = ids[seed % ids.len()];
            let quantity = 1 + (seed % 3) as i64;
            let sold_at = start + Duration::days(day) + Duration::minutes((9 * 60 + n * 47) as i64);

            match db.checkout().sell_at(product_id, quantity, sold_at).await {
                Ok(_) => recorded += 1,
                Err(DbError::Domain(err)) => {
                    rejected += 1;
                    eprintln!("  skipped sale of {}: {}", product_id, err);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    println!("  sales:         {} ({} refused)", recorded, rejected);

    let summary = db.analytics().summary(3).await?;
    println!();
    println!("Total revenue: {}", summary.total_revenue);
    for best in &summary.best_sellers {
        println!("  {:<24} {:>4} sold", best.product_name, best.quantity_sold);
    }

    db.close().await;
    Ok(())
}
