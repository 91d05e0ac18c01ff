//! # Agro Counter Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Agro Billing Counter                             │
//! │                                                                         │
//! │  stdin ──► shell.rs ──► commands/ ──► agro-db ──► agro.db (SQLite)      │
//! │                │                                                        │
//! │                └──► stdout: carts, receipts, reports                    │
//! │                                                                         │
//! │  main.rs ────► parses flags, hands over to lib.rs                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! agro-counter                          # interactive shell
//! agro-counter --db ./shop.db report    # one command
//! ```

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = agro_counter::Cli::parse();

    if let Err(e) = agro_counter::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
