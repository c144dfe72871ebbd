//! The `stockpile` command-line front end.
//!
//! A run goes: parse arguments, load [`config::StockpileConfig`], start
//! logging, open the database (migrating it), create the configured admin
//! account if it is missing, log in with `--user`/`--password`, then
//! dispatch. Results are printed as JSON on stdout; failures as a
//! [`error::CliError`] on stderr with exit status 1.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod session;

use clap::Parser;
use serde_json::Value;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::Context;
use config::{StockpileConfig, DEFAULT_LOG_FILTER};
use error::{CliError, CliResult};
use session::Session;
use stockpile_db::{Database, DbConfig};

/// Runs the CLI and returns the process exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(value) => match output::print_result(&value) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                output::print_error(&CliError::from(err));
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> CliResult<Value> {
    let config = load_config(&cli, startup_filter(), std::io::stderr)?;
    init_tracing(&config.logging.filter);

    let db = open_database(&config).await?;
    if session::bootstrap_admin(&db, &config.admin).await? {
        info!(username = %config.admin.username, "Created default admin account");
    }

    let session = Session::login(&db, cli.user.as_deref(), cli.password.as_deref()).await?;
    let ctx = Context::new(db, config, session);

    let result = commands::dispatch(&ctx, cli.command).await;
    ctx.db.close().await;
    result
}

/// Loads the config, then applies `--db`.
///
/// The global subscriber depends on the config, so loading runs under a
/// temporary one writing to `writer`.
fn load_config<W>(cli: &Cli, filter: EnvFilter, writer: W) -> CliResult<StockpileConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let startup = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();

    let mut config = tracing::subscriber::with_default(startup, || {
        StockpileConfig::load(cli.config.clone())
    })?;
    if let Some(path) = &cli.db {
        config.database.path = Some(path.clone());
    }
    Ok(config)
}

/// `RUST_LOG` if set, else the built-in filter.
fn startup_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Opens the configured database, running migrations.
pub async fn open_database(config: &StockpileConfig) -> CliResult<Database> {
    let path = config.database_path()?;
    debug!(?path, "Database path determined");

    let db_config = DbConfig::new(path).max_connections(config.database.max_connections);
    Ok(Database::new(db_config).await?)
}

/// `RUST_LOG` if set, else the configured filter. Logs go to stderr so
/// stdout carries only the JSON result.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A subscriber may already be installed when embedded in another binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_loading_is_logged() {
        let path = std::env::temp_dir().join(format!("stockpile-lib-{}.toml", std::process::id()));
        std::fs::write(&path, "[inventory]\nlow_stock_threshold = 9\n").unwrap();

        let cli = Cli::parse_from([
            "stockpile",
            "--config",
            path.to_str().unwrap(),
            "--db",
            "/tmp/override.db",
            "product",
            "list",
        ]);
        let captured = Captured::default();
        let writer = captured.clone();

        let config = load_config(&cli, EnvFilter::new("stockpile_cli=debug"), move || {
            writer.clone()
        })
        .unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.inventory.low_stock_threshold, 9);
        assert_eq!(
            config.database.path.as_deref(),
            Some(std::path::Path::new("/tmp/override.db"))
        );

        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Loading config from file"), "{}", logged);
    }
}
