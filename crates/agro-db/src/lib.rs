//! # agro-db: Database Layer for the Billing Counter
//!
//! SQLite storage for inventory, customers, bills and shop settings, using
//! sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Data Flow                                │
//! │                                                                         │
//! │  Counter command (save bill)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     agro-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ inventory     │    │  (embedded)  │  │   │
//! │  │   │               │    │ customer      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ bill          │    │ 001_initial  │  │   │
//! │  │   │               │    │ settings      │    │              │  │   │
//! │  │   │               │    │ report        │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                     ┌──────────▼──────────┐                    │   │
//! │  │                     │   BillReconciler    │                    │   │
//! │  │                     │  save / edit / delete in one tx          │   │
//! │  │                     └─────────────────────┘                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (agro.db)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`reconciler`] - Atomic bill writes with stock movements
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agro_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("agro.db")).await?;
//!
//! let urea = db.inventory().get_by_name("Urea (46-0-0)").await?;
//! let saved = db.reconciler().save_new(&draft, issued_at).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod reconciler;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use reconciler::{BillReconciler, DeleteOutcome, LoadedBill, SavedBill};

// Repository re-exports for convenience
pub use repository::bill::{BillRepository, BillSummary};
pub use repository::customer::CustomerRepository;
pub use repository::inventory::{InventoryRepository, InventorySummary};
pub use repository::report::{PeriodTotals, ReportRepository, SalesReport};
pub use repository::settings::SettingsRepository;
