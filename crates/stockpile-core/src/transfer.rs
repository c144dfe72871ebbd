//! # CSV Transfer
//!
//! Encodes the catalog as CSV and parses it back. Works over `io::Read` /
//! `io::Write` so the caller owns the file handling.
//!
//! ## Format
//! ```text
//! id,name,quantity,price,category
//! 1,Widget,10,2.50,Hardware
//! 2,"Bolts, M4",200,0.10,Hardware
//! ```
//!
//! - Prices are decimal with two places; cents never appear in the file.
//! - The `category` column is optional on import.
//! - Header names are matched case-insensitively, in any order.
//! - A bad row is reported and skipped; the rest of the file still loads.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_product;

/// Column order written on export.
pub const HEADER: [&str; 5] = ["id", "name", "quantity", "price", "category"];

/// Failures that abort a whole transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based line in the file (the header is line 1).
    pub line: u64,
    pub message: String,
}

/// A successfully parsed row and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: u64,
    pub product: Product,
}

/// Result of parsing a file, before anything is written.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub rows: Vec<CsvRow>,
    pub errors: Vec<RowError>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<RowError>,
}

// =============================================================================
// Export
// =============================================================================

/// Writes the header and one row per product. Returns the row count.
pub fn write_products<W: io::Write>(writer: W, products: &[Product]) -> Result<usize, TransferError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for product in products {
        csv_writer.write_record([
            product.id.to_string(),
            product.name.clone(),
            product.quantity.to_string(),
            product.price().to_string(),
            product.category.clone(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(products.len())
}

// =============================================================================
// Import
// =============================================================================

struct Columns {
    id: usize,
    name: usize,
    quantity: usize,
    price: usize,
    category: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, TransferError> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };
        let required =
            |wanted: &str| find(wanted).ok_or_else(|| TransferError::MissingColumn(wanted.to_string()));

        Ok(Columns {
            id: required("id")?,
            name: required("name")?,
            quantity: required("quantity")?,
            price: required("price")?,
            category: find("category"),
        })
    }
}

/// Parses a catalog file. Structural problems (unreadable input, missing
/// header columns) fail the call; problems in individual rows are
/// collected in [`ParsedCsv::errors`].
pub fn read_products<R: io::Read>(reader: R) -> Result<ParsedCsv, TransferError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::locate(csv_reader.headers()?)?;
    let mut parsed = ParsedCsv::default();

    for (index, result) in csv_reader.records().enumerate() {
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                parsed.errors.push(RowError {
                    line,
                    message: err.to_string(),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        match parse_row(&record, &columns) {
            Ok(product) => parsed.rows.push(CsvRow { line, product }),
            Err(message) => parsed.errors.push(RowError { line, message }),
        }
    }

    Ok(parsed)
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<Product, String> {
    let field = |index: usize, name: &str| {
        record
            .get(index)
            .ok_or_else(|| format!("missing value for {}", name))
    };

    let id: i64 = field(columns.id, "id")?
        .parse()
        .map_err(|_| "id is not a whole number".to_string())?;
    let name = field(columns.name, "name")?.to_string();
    let quantity: i64 = field(columns.quantity, "quantity")?
        .parse()
        .map_err(|_| "quantity is not a whole number".to_string())?;
    let price: Money = field(columns.price, "price")?
        .parse()
        .map_err(|e: crate::error::ValidationError| e.to_string())?;
    let category = columns
        .category
        .and_then(|index| record.get(index))
        .unwrap_or_default()
        .to_string();

    let product = Product::new(id, name, quantity, price, category);
    validate_product(&product).map_err(|e| e.to_string())?;
    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================
