//! Catalog CSV transfer.
//!
//! Import is lenient: bad rows are reported and skipped, the rest are
//! committed in one transaction.

use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use stockpile_core::transfer::{self, ImportReport};
use stockpile_core::Action;
use tracing::{info, warn};

use super::Context;
use crate::cli::CsvCommand;
use crate::error::CliResult;
use crate::output::to_json;

pub async fn run(ctx: &Context, command: CsvCommand) -> CliResult<Value> {
    match command {
        CsvCommand::Export { path } => {
            ctx.session.require(Action::ExportProducts)?;
            let products = ctx.db.products().list_all().await?;

            let mut writer = BufWriter::new(File::create(&path)?);
            let exported = transfer::write_products(&mut writer, &products)?;
            writer.flush()?;

            info!(exported, path = %path.display(), "Catalog exported");
            Ok(json!({
                "exported": exported,
                "path": path.display().to_string(),
            }))
        }

        CsvCommand::Import { path } => {
            ctx.session.require(Action::ImportProducts)?;
            let parsed = transfer::read_products(BufReader::new(File::open(&path)?))?;

            let mut report = ctx.db.products().import(&parsed.rows).await?;
            report.skipped.extend(parsed.errors);
            report.skipped.sort_by_key(|row| row.line);

            log_report(&report);
            to_json(&report)
        }
    }
}

fn log_report(report: &ImportReport) {
    for row in &report.skipped {
        warn!(line = row.line, reason = %row.message, "Skipped CSV row");
    }
    info!(
        imported = report.imported,
        skipped = report.skipped.len(),
        "Catalog import finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::error::ErrorCode;
    use std::path::PathBuf;
    use stockpile_core::Role;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stockpile-{}-{}.csv", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_export_then_import_reproduces_catalog() {
        let source = context(Role::Admin).await;
        let path = temp_path("round-trip");

        let exported = run(&source, CsvCommand::Export { path: path.clone() }).await.unwrap();
        assert_eq!(exported["exported"], 3);

        let target = context(Role::Admin).await;
        target.db.products().remove_all().await.unwrap();
        let report = run(&target, CsvCommand::Import { path: path.clone() }).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report["imported"], 3);
        assert_eq!(report["skipped"].as_array().unwrap().len(), 0);
        assert_eq!(
            source.db.products().list_all().await.unwrap(),
            target.db.products().list_all().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_import_reports_bad_and_duplicate_rows() {
        let ctx = context(Role::Admin).await;
        let path = temp_path("mixed");
        std::fs::write(
            &path,
            "id,name,quantity,price,category\n\
             10,\"Pens, blue\",5,1.20,Stationery\n\
             11,Glue,-2,0.99,Stationery\n\
             1,Widget again,1,1.00,Hardware\n\
             12,Tape,4,abc,Stationery\n",
        )
        .unwrap();

        let report = run(&ctx, CsvCommand::Import { path: path.clone() }).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(report["imported"], 1);
        let lines: Vec<u64> = report["skipped"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["line"].as_u64().unwrap())
            .collect();
        assert_eq!(lines, [3, 4, 5]);

        let pens = ctx.db.products().get_by_id(10).await.unwrap().unwrap();
        assert_eq!(pens.name, "Pens, blue");
        assert_eq!(ctx.db.products().get_by_id(1).await.unwrap().unwrap().name, "Widget");
    }

    #[tokio::test]
    async fn test_import_missing_file_is_io_error() {
        let ctx = context(Role::Admin).await;
        let err = run(&ctx, CsvCommand::Import { path: temp_path("does-not-exist") })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IoError);
    }

    #[tokio::test]
    async fn test_staff_can_export_but_not_import() {
        let ctx = context(Role::Staff).await;
        let path = temp_path("staff");

        assert!(run(&ctx, CsvCommand::Export { path: path.clone() }).await.is_ok());
        let err = run(&ctx, CsvCommand::Import { path: path.clone() }).await.unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
