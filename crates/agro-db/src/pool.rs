//! # Database Handle
//!
//! Opens the shop's SQLite file (or a private in-memory database for tests)
//! and hands out repositories.
//!
//! ## One File, One Counter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Opening the Shop Database                          │
//! │                                                                         │
//! │  DbConfig::new("~/.local/share/agro/agro.db")                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config)                                                  │
//! │       ├── parent folder created if missing                             │
//! │       ├── file created if missing                                      │
//! │       ├── WAL journal, foreign keys on, 5 s busy timeout               │
//! │       └── embedded migrations applied                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.inventory() / db.bills() / db.reconciler() ...                     │
//! │       each repository holds a clone of the same small pool             │
//! │                                                                         │
//! │  DbConfig::in_memory()                                                  │
//! │       one connection that is never recycled, so the data lives         │
//! │       exactly as long as the Database                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::reconciler::BillReconciler;
use crate::repository::bill::BillRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::report::ReportRepository;
use crate::repository::settings::SettingsRepository;

/// Connections for a file database. The shell issues one statement at a
/// time, plus one for a read while a bill transaction is open.
const FILE_CONNECTIONS: u32 = 2;

/// How long a statement waits for another process's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Where the shop data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A SQLite file on disk.
    File(PathBuf),
    /// A private database dropped with the handle.
    Memory,
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./data/agro.db")).await?;
/// let test_db = Database::new(DbConfig::in_memory()).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: DbLocation,
}

impl DbConfig {
    /// A database file. The file and its folder are created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
        }
    }

    /// An empty, migrated database that exists only in memory.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the shop database.
///
/// Cloning is cheap; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./agro.db")).await?;
/// let urea = db.inventory().get_by_name("Urea (46-0-0)").await?;
/// let saved = db.reconciler().save_new(&draft, issued_at).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and applies pending migrations.
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - Folder or file could not be opened
    /// * `Err(DbError::MigrationFailed)` - Schema could not be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = match &config.location {
            DbLocation::File(path) => {
                info!(path = %path.display(), "Opening shop database");
                create_parent_dir(path)?;

                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .foreign_keys(true)
                    .busy_timeout(BUSY_TIMEOUT);

                SqlitePoolOptions::new()
                    .max_connections(FILE_CONNECTIONS)
                    .connect_with(options)
                    .await
            }
            DbLocation::Memory => {
                debug!("Opening in-memory database");
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                    .foreign_keys(true);

                // Every new connection would be a different empty database.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
            }
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        migrations::run_migrations(&pool).await?;
        info!("Database ready");

        Ok(Database { pool })
    }

    /// The underlying pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the inventory repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let low = db.inventory().low_stock(20).await?;
    /// ```
    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Returns the bill repository (read side).
    pub fn bills(&self) -> BillRepository {
        BillRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Returns the bill reconciler, which owns every write that touches
    /// both bills and stock.
    pub fn reconciler(&self) -> BillReconciler {
        BillReconciler::new(self.pool.clone())
    }

    /// Closes the pool. Every later repository call fails.
    pub async fn close(&self) {
        info!("Closing shop database");
        self.pool.close().await;
    }
}

fn create_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", parent.display(), e))),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
