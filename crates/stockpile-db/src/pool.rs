//! # Database Handle
//!
//! One [`Database`] per process. It owns the SQLite pool, brings the schema
//! up to date when it opens, and hands out the stores and services, which
//! are cheap clones over the same pool.
//!
//! ```text
//! DbConfig ──► Database::new ──► SqlitePool ──┬── products()  ProductRepository
//!               │                             ├── sales()     SaleRepository
//!               └── migrations::apply         ├── users()     UserRepository
//!                                             ├── checkout()  Checkout
//!                                             └── analytics() AnalyticsService
//! ```
//!
//! ## SQLite Settings
//! - WAL journal: readers never block the writer
//! - `synchronous = NORMAL`: durable at checkpoints, fast commits
//! - foreign keys on
//! - busy timeout: a second writer waits for the lock instead of failing

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::analytics::AnalyticsService;
use crate::checkout::Checkout;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;

const MEMORY_PATH: &str = ":memory:";

/// How to open the database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/stockpile/stockpile.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database file, created if missing. `:memory:` opens a private
    /// in-memory database.
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a free pooled connection.
    pub acquire_timeout: Duration,
    /// How long a writer waits for SQLite's write lock.
    pub busy_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    /// Apply pending migrations when opening.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            migrate: true,
        }
    }

    /// A private in-memory database for tests.
    ///
    /// Each in-memory connection is its own database, so the pool holds
    /// exactly one connection and never lets it go idle.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            idle_timeout: None,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn migrate(mut self, migrate: bool) -> Self {
        self.migrate = migrate;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

/// Process-wide database handle.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("stockpile.db")).await?;
///
/// db.products().insert(&product).await?;
/// let sale = db.checkout().sell(product.id, 2).await?;
/// let top = db.analytics().best_selling(5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime((!config.is_in_memory()).then(|| Duration::from_secs(30 * 60)))
            .connect_with(options)
            .await
            .map_err(|e| {
                DbError::ConnectionFailed(format!("{}: {}", config.path.display(), e))
            })?;

        info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Database opened"
        );

        let db = Database { pool };
        if config.migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Returns how many ran.
    pub async fn migrate(&self) -> DbResult<usize> {
        migrations::apply(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The catalog store.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// The sales ledger.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Atomic sale transactions.
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.pool.clone())
    }

    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.sales())
    }

    /// Closes every connection. Handles obtained earlier stop working.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Whether a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let db = Database::new(DbConfig::in_memory().migrate(false)).await.unwrap();
        assert!(!migrations::pending_versions(db.pool()).await.unwrap().is_empty());

        let applied = db.migrate().await.unwrap();
        assert_eq!(applied, migrations::MIGRATOR.iter().count());
        assert_eq!(db.migrate().await.unwrap(), 0);
        assert!(migrations::pending_versions(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_persists_between_opens() {
        let path = std::env::temp_dir().join(format!("stockpile-pool-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.users()
            .create("owner", "secret1", stockpile_core::Role::Admin)
            .await
            .unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.migrate().await.unwrap(), 0);
        assert!(reopened.users().get_by_username("owner").await.unwrap().is_some());
        reopened.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/stockpile-test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
