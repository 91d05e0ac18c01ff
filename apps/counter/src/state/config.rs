//! # Counter Configuration
//!
//! Where the counter keeps its files and how it starts up.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line flags (highest priority, applied by main)             │
//! │     --db ./agro.db   --receipts-dir ./receipts                         │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     AGRO_DB_PATH, AGRO_RECEIPTS_DIR,                                   │
//! │     AGRO_PAYMENT_METHOD, AGRO_LOG                                      │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/agrobilling/counter.toml (Linux)                         │
//! │     ~/Library/Application Support/com.agro.billing/counter.toml (macOS)│
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shop name, address and tax live in the database (`settings` command),
//! not here.
//!
//! ## Configuration File Format
//! ```toml
//! # counter.toml
//! database_path = "/srv/shop/agro.db"
//! receipts_dir = "/srv/shop/receipts"
//! default_payment_method = "cash"   # cash | card | upi | credit
//! log_filter = "info,agro=debug,sqlx=warn"
//! low_stock_threshold = 20
//! ```

use agro_core::{PaymentMethod, DEFAULT_LOW_STOCK_THRESHOLD};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default tracing directive.
pub const DEFAULT_LOG_FILTER: &str = "info,agro=debug,sqlx=warn";

const CONFIG_FILE: &str = "counter.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Counter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Folder that `export` writes `Bill_<invoice>.txt` files into.
    pub receipts_dir: PathBuf,

    /// Payment method a new bill starts with.
    pub default_payment_method: PaymentMethod,

    /// tracing-subscriber `EnvFilter` directive. `RUST_LOG` wins when set.
    pub log_filter: String,

    /// Items below this stock are listed as running low.
    pub low_stock_threshold: i64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        CounterConfig {
            database_path: data_dir.join("agro.db"),
            receipts_dir: data_dir.join("receipts"),
            default_payment_method: PaymentMethod::Cash,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl CounterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or counter.toml in the config folder)
    /// 3. Environment variables
    ///
    /// A missing file is not an error; an explicit `config_path` that does
    /// not exist is.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading counter config from file");
                config = Self::from_file(&path)?;
            } else if explicit {
                return Err(ConfigError::Invalid(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Reads a TOML file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Counter config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "low_stock_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Applies `AGRO_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("AGRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("AGRO_RECEIPTS_DIR") {
            self.receipts_dir = PathBuf::from(dir);
        }

        if let Some(method) = lookup("AGRO_PAYMENT_METHOD") {
            match method.parse() {
                Ok(parsed) => self.default_payment_method = parsed,
                Err(_) => warn!(method = %method, "Unknown payment method in environment"),
            }
        }

        if let Some(filter) = lookup("AGRO_LOG") {
            self.log_filter = filter;
        }
    }

    /// `counter.toml` in the platform config folder.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "agro", "billing")
}
