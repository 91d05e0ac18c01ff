//! # State Module
//!
//! What the counter keeps in memory between commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │    Database      │  │ BillingSession   │  │   CounterConfig      │  │
//! │  │   (agro-db)      │  │                  │  │                      │  │
//! │  │  SQLite pool     │  │  cart, rates,    │  │  file locations,     │  │
//! │  │  repositories    │  │  payment,        │  │  defaults,           │  │
//! │  │  reconciler      │  │  customer,       │  │  log filter          │  │
//! │  │                  │  │  editing flag    │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  Each command takes only the pieces it needs:                          │
//! │    add_catalog_item(&Database, &mut BillingSession, ..)                │
//! │    clear_cart(&mut BillingSession)                                     │
//! │    sales_report(&Database, today)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::{ConfigError, CounterConfig, DEFAULT_LOG_FILTER};
pub use session::{BillingSession, EditingBill};
