//! # Agro Counter Library
//!
//! The billing counter: configuration, the billing session, the commands
//! that act on it and the shell that reads them.
//!
//! ## Module Organization
//! ```text
//! agro_counter/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Bill being built, edit mode
//! │   └── config.rs   ◄─── counter.toml + AGRO_* overrides
//! ├── commands/
//! │   ├── cart.rs     ◄─── Lines, rates, payment, customer
//! │   ├── bill.rs     ◄─── Preview, save, edit, delete, export
//! │   ├── inventory.rs◄─── Stock maintenance
//! │   ├── report.rs   ◄─── Sales totals
//! │   └── settings.rs ◄─── Shop details
//! ├── shell.rs        ◄─── Line reader and text output
//! └── error.rs        ◄─── ApiError for commands
//! ```

pub mod commands;
pub mod error;
pub mod shell;
pub mod state;

use std::path::PathBuf;

use agro_db::{Database, DbConfig};
use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shell::{Shell, ShellOutput};
use state::{BillingSession, CounterConfig};

/// Command line of the `agro-counter` binary.
#[derive(Debug, Parser)]
#[command(name = "agro-counter", about = "Fertilizer shop billing counter", version)]
pub struct Cli {
    /// Config file (default: counter.toml in the platform config folder)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database file, overrides the config file and AGRO_DB_PATH
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Folder for exported receipts
    #[arg(long)]
    pub receipts_dir: Option<PathBuf>,

    /// Run one shell command and exit, e.g. `agro-counter report`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Runs the counter.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Counter Startup                                   │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults < counter.toml < AGRO_* env < command line               │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • RUST_LOG if set, else log_filter from config                      │
/// │     • Written to stderr, receipts go to stdout                          │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Start Session ────────────────────────────────────────────────────► │
/// │     • Default tax from shop settings                                    │
/// │     • Default payment method from config                                │
/// │                                                                         │
/// │  5. Run one command, or read commands from stdin ─────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CounterConfig::load(cli.config)?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(dir) = cli.receipts_dir {
        config.receipts_dir = dir;
    }

    init_tracing(&config.log_filter);
    info!(db = ?config.database_path, "Starting agro counter");

    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
    info!("Database connected and migrations applied");

    let settings = db.settings().get().await?;
    let session = BillingSession::new(settings.default_tax, config.default_payment_method);
    let mut shell = Shell::new(db.clone(), config, session);

    let mut stdout = tokio::io::stdout();
    if cli.command.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        shell.run(stdin, &mut stdout).await?;
    } else {
        let line = cli
            .command
            .iter()
            .map(|arg| quote(arg))
            .collect::<Vec<_>>()
            .join(" ");
        if let ShellOutput::Text(text) = shell.execute(&line).await {
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    db.close().await;
    info!("Counter closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=agro=trace` - Show trace for agro crates only
/// - Default: the config `log_filter` (`info,agro=debug,sqlx=warn`)
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Re-quotes an argument that the OS shell already split.
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}
