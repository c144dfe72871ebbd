//! Stockpile command-line entry point.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    stockpile_cli::run().await
}
