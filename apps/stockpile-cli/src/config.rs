//! Settings for the `stockpile` binary.
//!
//! Each source overrides the one before it:
//!
//! 1. built-in defaults
//! 2. the TOML file: `--config PATH` (must exist) or `config.toml` in the
//!    platform config directory (optional)
//! 3. `STOCKPILE_*` environment variables
//! 4. the `--db` flag
//!
//! A complete file:
//! ```toml
//! [database]
//! path = "/srv/stockpile/stockpile.db"
//! max_connections = 5
//!
//! [inventory]
//! low_stock_threshold = 5
//! best_sellers = 5
//!
//! [admin]
//! username = "admin"
//! password = "admin123"
//!
//! [logging]
//! filter = "warn,stockpile=info,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stockpile_core::{DEFAULT_BEST_SELLERS, DEFAULT_LOW_STOCK_THRESHOLD};
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn,stockpile=info,sqlx=warn";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Products at or below this quantity count as low stock.
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,

    /// How many products `analytics best-sellers` shows by default.
    #[serde(default = "default_best_sellers")]
    pub best_sellers: usize,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_best_sellers() -> usize {
    DEFAULT_BEST_SELLERS
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_threshold(),
            best_sellers: default_best_sellers(),
        }
    }
}

/// The account created on first start when it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Default for AdminSettings {
    fn default() -> Self {
        AdminSettings {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives. `RUST_LOG` wins over this.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockpileConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub admin: AdminSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl StockpileConfig {
    /// Layers defaults, the config file and the environment, then
    /// validates the result. The `--db` flag is applied by the caller.
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "No config file, using built-in settings");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> CliResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a TOML document; missing sections take their defaults.
    pub fn from_toml_str(contents: &str) -> CliResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.inventory.low_stock_threshold < 0 {
            return Err(CliError::config(
                "inventory.low_stock_threshold cannot be negative",
            ));
        }

        if self.inventory.best_sellers == 0 {
            return Err(CliError::config(
                "inventory.best_sellers must be greater than 0",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(CliError::config(
                "database.max_connections must be greater than 0",
            ));
        }

        if self.admin.username.trim().is_empty() {
            return Err(CliError::config("admin.username is required"));
        }

        Ok(())
    }

    /// Applies `STOCKPILE_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STOCKPILE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(threshold) = lookup("STOCKPILE_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<i64>() {
                Ok(t) => self.inventory.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring non-numeric low stock threshold"),
            }
        }

        if let Some(username) = lookup("STOCKPILE_ADMIN_USERNAME") {
            self.admin.username = username;
        }

        if let Some(password) = lookup("STOCKPILE_ADMIN_PASSWORD") {
            self.admin.password = password;
        }

        if let Some(filter) = lookup("STOCKPILE_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockpile", "stockpile")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolves the database file, creating the platform data directory
    /// when no path is configured.
    pub fn database_path(&self) -> CliResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "stockpile", "stockpile")
            .ok_or_else(|| CliError::config("Could not determine app data directory"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("stockpile.db"))
    }
}
