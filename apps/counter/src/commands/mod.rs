//! # Counter Commands
//!
//! Everything the operator can do at the counter, as plain functions.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── cart.rs       ◄─── Lines, rates, payment method, customer
//! ├── bill.rs       ◄─── Preview, save, edit, delete, export
//! ├── inventory.rs  ◄─── Stock list and maintenance
//! ├── report.rs     ◄─── Sales totals
//! └── settings.rs   ◄─── Shop details and default tax
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Shell line                                                             │
//! │  ──────────                                                             │
//! │  add "DAP (18-46-0)" 2                                                  │
//! │         │                                                               │
//! │         │ (tokenize + clap)                                             │
//! │         ▼                                                               │
//! │  Command function                                                       │
//! │  ────────────────                                                       │
//! │  async fn add_catalog_item(                                             │
//! │      db: &Database,               ◄── only the state it needs          │
//! │      session: &mut BillingSession,                                     │
//! │      name: &str,                  ◄── typed text, parsed here          │
//! │      quantity: &str,                                                   │
//! │  ) -> ApiResult<CartView>                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Shell prints the view (or "Error: <message>")                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bill;
pub mod cart;
pub mod inventory;
pub mod report;
pub mod settings;
