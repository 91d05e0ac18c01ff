//! # Counter Shell
//!
//! Line-oriented front end: one command per line, arguments separated by
//! spaces, double quotes around arguments that contain spaces.
//!
//! ## Session Example
//! ```text
//! agro> add "Urea (46-0-0)" 2
//! agro> add "DAP (18-46-0)" 1
//! agro> discount 10
//! agro> customer "Ramesh Kumar" --phone 9812345678
//! agro> preview
//! agro> save
//! Saved INV-20240115-0001
//! agro> edit INV-20240115-0001
//! agro> remove "DAP (18-46-0)"
//! agro> save
//! Updated INV-20240115-0001
//! agro> export INV-20240115-0001
//! agro> quit
//! ```

use std::fmt::Write as _;

use agro_core::{InventoryItem, Money};
use agro_db::{Database, DeleteOutcome, InventorySummary, SalesReport};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::commands::cart::{CartView, CustomerResponse, RemoveResponse};
use crate::commands::{bill, cart, inventory, report, settings};
use crate::error::ApiResult;
use crate::state::{BillingSession, CounterConfig};

const PROMPT: &str = "agro> ";

/// One parsed shell line.
#[derive(Debug, Parser)]
#[command(
    name = "agro",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "{subcommands}"
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// Add an inventory item to the bill
    Add { name: String, quantity: String },
    /// Add an item that is not in the inventory
    Custom {
        name: String,
        quantity: String,
        price: String,
    },
    /// Remove a line from the bill
    Remove { name: String },
    /// Show the current bill
    Cart,
    /// Empty the cart (rates and customer stay)
    Clear,
    /// Start a new bill
    New,
    /// Set the discount rate in percent
    Discount { rate: String },
    /// Set the tax rate in percent
    Tax { rate: String },
    /// Set the payment method: cash, card, upi, credit
    Pay { method: String },
    /// Set the customer; a known phone fills in the rest
    Customer {
        #[arg(default_value = "")]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Show the receipt without saving
    Preview,
    /// Save the bill (or the edit)
    Save,
    /// Load a saved bill for editing
    Edit { invoice: String },
    /// Show the receipt of a saved bill
    Show { invoice: String },
    /// Delete saved bills and return their stock
    Delete {
        #[arg(required = true)]
        invoices: Vec<String>,
    },
    /// Write a receipt to Bill_<invoice>.txt (current bill if no invoice)
    Export { invoice: Option<String> },
    /// List the inventory
    Items,
    /// Search the inventory by name
    Search { query: String },
    /// Add an item to the inventory
    ItemAdd {
        name: String,
        price: String,
        stock: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Set a new price and add stock
    Restock {
        name: String,
        price: String,
        quantity: String,
    },
    /// Add units to stock
    StockIn { name: String, quantity: String },
    /// Take units out of stock
    StockOut { name: String, quantity: String },
    /// Delete an inventory item
    ItemDelete { name: String },
    /// Items running low
    Low { threshold: Option<i64> },
    /// Inventory count and value
    Summary,
    /// Sales totals and recent bills
    Report,
    /// Show shop settings, or change one: settings <key> <value>
    Settings { key: Option<String>, value: Option<String> },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Result of one shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutput {
    Text(String),
    Quit,
}

/// Splits a line on whitespace, keeping double-quoted runs together.
///
/// ## Example
/// ```text
/// add "Urea (46-0-0)" 2   →  ["add", "Urea (46-0-0)", "2"]
/// customer "" --phone 98  →  ["customer", "", "--phone", "98"]
/// ```
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err("Unterminated quote".to_string());
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

/// The interactive counter.
pub struct Shell {
    db: Database,
    config: CounterConfig,
    session: BillingSession,
    clock: Box<dyn Fn() -> NaiveDateTime + Send + Sync>,
}

impl Shell {
    pub fn new(db: Database, config: CounterConfig, session: BillingSession) -> Self {
        Shell {
            db,
            config,
            session,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the shop-local clock used for invoice dates.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn session(&self) -> &BillingSession {
        &self.session
    }

    /// Reads commands until end of input or `quit`.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match self.execute(&line).await {
                ShellOutput::Quit => break,
                ShellOutput::Text(text) if text.is_empty() => {}
                ShellOutput::Text(text) => {
                    output.write_all(text.as_bytes()).await?;
                    if !text.ends_with('\n') {
                        output.write_all(b"\n").await?;
                    }
                }
            }
        }

        output.flush().await
    }

    /// Runs one line and returns what to print.
    pub async fn execute(&mut self, line: &str) -> ShellOutput {
        let tokens = match tokenize(line) {
            Ok(tokens) if tokens.is_empty() => return ShellOutput::Text(String::new()),
            Ok(tokens) => tokens,
            Err(e) => return ShellOutput::Text(format!("Error: {e}")),
        };

        let parsed = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed,
            Err(e) => return ShellOutput::Text(e.render().to_string()),
        };

        debug!(command = ?parsed.command, "Shell command");
        if matches!(parsed.command, ShellCommand::Quit) {
            return ShellOutput::Quit;
        }

        match self.dispatch(parsed.command).await {
            Ok(text) => ShellOutput::Text(text),
            Err(e) => ShellOutput::Text(format!("Error: {}", e.message)),
        }
    }

    async fn dispatch(&mut self, command: ShellCommand) -> ApiResult<String> {
        let db = &self.db;
        let session = &mut self.session;
        let now = (self.clock)();

        let text = match command {
            ShellCommand::Add { name, quantity } => {
                format_cart(&cart::add_catalog_item(db, session, &name, &quantity).await?)
            }
            ShellCommand::Custom {
                name,
                quantity,
                price,
            } => format_cart(&cart::add_custom_item(session, &name, &quantity, &price)?),
            ShellCommand::Remove { name } => format_removed(&cart::remove_item(session, &name)),
            ShellCommand::Cart => format_cart(&cart::get_cart(session)),
            ShellCommand::Clear => format_cart(&cart::clear_cart(session)),
            ShellCommand::New => format_cart(&cart::new_bill(session)),
            ShellCommand::Discount { rate } => format_cart(&cart::set_discount(session, &rate)?),
            ShellCommand::Tax { rate } => format_cart(&cart::set_tax(session, &rate)?),
            ShellCommand::Pay { method } => {
                format_cart(&cart::set_payment_method(session, &method)?)
            }
            ShellCommand::Customer {
                name,
                phone,
                address,
            } => format_customer(
                &cart::set_customer(db, session, &name, phone.as_deref(), address.as_deref())
                    .await?,
            ),
            ShellCommand::Preview => bill::preview_receipt(db, session, now).await?,
            ShellCommand::Save => {
                let saved = bill::save_bill(db, session, now).await?;
                let verb = if saved.edited { "Updated" } else { "Saved" };
                format!("{}{} {}", saved.receipt, verb, saved.invoice_number)
            }
            ShellCommand::Edit { invoice } => {
                let view = bill::load_bill_for_edit(db, session, &invoice).await?;
                format!("Editing {}\n{}", invoice.trim(), format_cart(&view))
            }
            ShellCommand::Show { invoice } => bill::show_bill(db, &invoice).await?,
            ShellCommand::Delete { invoices } => {
                format_deleted(&bill::delete_bills(db, session, &invoices).await?)
            }
            ShellCommand::Export { invoice } => {
                let exported = bill::export_receipt(
                    db,
                    session,
                    &self.config.receipts_dir,
                    invoice.as_deref(),
                    now,
                )
                .await?;
                format!("Wrote {}", exported.path.display())
            }
            ShellCommand::Items => format_items(&inventory::list_inventory(db).await?),
            ShellCommand::Search { query } => {
                format_items(&inventory::search_inventory(db, &query).await?)
            }
            ShellCommand::ItemAdd {
                name,
                price,
                stock,
                category,
                unit,
            } => {
                let item = inventory::add_inventory_item(
                    db,
                    &name,
                    &price,
                    &stock,
                    category.as_deref(),
                    unit.as_deref(),
                )
                .await?;
                format!("Added {}", format_item(&item))
            }
            ShellCommand::Restock {
                name,
                price,
                quantity,
            } => format_item(&inventory::restock_item(db, &name, &price, &quantity).await?),
            ShellCommand::StockIn { name, quantity } => {
                format_item(&inventory::add_stock(db, &name, &quantity).await?)
            }
            ShellCommand::StockOut { name, quantity } => {
                format_item(&inventory::decrease_stock(db, &name, &quantity).await?)
            }
            ShellCommand::ItemDelete { name } => {
                format!("Deleted {}", inventory::delete_item(db, &name).await?.name)
            }
            ShellCommand::Low { threshold } => {
                let threshold = threshold.unwrap_or(self.config.low_stock_threshold);
                format_items(&inventory::low_stock(db, threshold).await?)
            }
            ShellCommand::Summary => format_summary(
                &inventory::inventory_summary(db, self.config.low_stock_threshold).await?,
            ),
            ShellCommand::Report => format_report(&report::sales_report(db, now.date()).await?),
            ShellCommand::Settings { key, value } => {
                let shop = match (key, value) {
                    (Some(key), Some(value)) => {
                        settings::update_setting(db, session, &key, &value).await?
                    }
                    (Some(key), None) => {
                        return Err(crate::error::ApiError::validation(format!(
                            "settings {key} needs a value"
                        )))
                    }
                    _ => settings::get_settings(db).await?,
                };
                format_settings(&shop)
            }
            ShellCommand::Quit => String::new(),
        };

        Ok(text)
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn format_cart(view: &CartView) -> String {
    let mut out = String::new();

    if let Some(invoice) = &view.editing {
        let _ = writeln!(out, "[editing {invoice}]");
    }
    if view.lines.is_empty() {
        out.push_str("Cart is empty\n");
    }
    for line in &view.lines {
        let _ = writeln!(
            out,
            "{:<24} {:>4} x {:>10} = {:>10}",
            line.name, line.quantity, line.unit_price, line.line_total
        );
    }

    let _ = writeln!(out, "{:<24} {:>29}", "Subtotal", view.subtotal);
    if !view.discount_rate.is_zero() {
        let _ = writeln!(
            out,
            "{:<24} {:>29}",
            format!("Discount ({}%)", view.discount_rate),
            format!("-{}", view.discount_amount)
        );
    }
    if !view.tax_rate.is_zero() {
        let _ = writeln!(
            out,
            "{:<24} {:>29}",
            format!("GST ({}%)", view.tax_rate),
            format!("+{}", view.tax_amount)
        );
    }
    let _ = writeln!(out, "{:<24} {:>29}", "TOTAL", view.grand_total);
    let _ = write!(out, "Payment: {}", view.payment_method);
    if !view.customer.name.is_empty() {
        let _ = write!(out, "  Customer: {}", view.customer.name);
    }
    out
}

fn format_removed(response: &RemoveResponse) -> String {
    match &response.removed {
        Some(line) => format!("Removed {}\n{}", line.name, format_cart(&response.cart)),
        None => format!("Not in cart\n{}", format_cart(&response.cart)),
    }
}

fn format_customer(response: &CustomerResponse) -> String {
    let customer = &response.customer;
    if customer.name.is_empty() {
        return "No customer".to_string();
    }
    let mut out = format!("Customer: {}", customer.name);
    if let Some(phone) = &customer.phone {
        let _ = write!(out, " ({phone})");
    }
    if let Some(address) = &customer.address {
        let _ = write!(out, ", {address}");
    }
    if response.known {
        out.push_str(" [saved customer]");
    }
    out
}

fn format_deleted(outcome: &DeleteOutcome) -> String {
    let mut out = String::new();
    for invoice in &outcome.deleted {
        let _ = writeln!(out, "Deleted {invoice}");
    }
    for invoice in &outcome.missing {
        let _ = writeln!(out, "Not found {invoice}");
    }
    out
}

fn format_item(item: &InventoryItem) -> String {
    format!(
        "{:<24} {:>10} / {:<4} stock {:>5}",
        item.name, item.price, item.unit, item.stock
    )
}

fn format_items(items: &[InventoryItem]) -> String {
    if items.is_empty() {
        return "No items".to_string();
    }
    items.iter().map(format_item).collect::<Vec<_>>().join("\n")
}

fn format_summary(summary: &InventorySummary) -> String {
    format!(
        "Items: {}\nUnits in stock: {}\nStock value: {}\nRunning low: {}",
        summary.item_count,
        summary.units_in_stock,
        summary.stock_value.grouped(),
        summary.low_stock_count
    )
}

fn format_report(report: &SalesReport) -> String {
    let mut out = String::new();
    for (label, totals) in [
        ("Today", report.today),
        ("Last 7 days", report.last_7_days),
        ("This month", report.this_month),
        ("All time", report.all_time),
    ] {
        let _ = writeln!(
            out,
            "{:<12} {:>5} bills {:>14}",
            label,
            totals.bill_count,
            money(totals.total)
        );
    }

    if !report.recent.is_empty() {
        out.push('\n');
    }
    for bill in &report.recent {
        let _ = writeln!(
            out,
            "{}  {}  {:>12}  {}",
            bill.invoice_number,
            bill.created_at.format("%d-%m-%Y %H:%M"),
            money(bill.total_amount),
            bill.customer_name.as_deref().unwrap_or("-")
        );
    }
    out
}

fn format_settings(shop: &agro_core::ShopSettings) -> String {
    format!(
        "name     {}\naddress  {}\nphone    {}\ntax      {}%\ncurrency {}\ngst      {}\nlicence  {}",
        shop.shop_name,
        shop.shop_address,
        shop.shop_phone,
        shop.default_tax,
        shop.currency,
        shop.gst_number,
        shop.licence_number
    )
}

fn money(amount: Money) -> String {
    amount.grouped()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::{Percent, PaymentMethod};
    use agro_db::DbConfig;
    use chrono::NaiveDate;

    async fn shell() -> Shell {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dir = std::env::temp_dir().join("agro-shell-tests");
        let config = CounterConfig {
            receipts_dir: dir,
            ..CounterConfig::default()
        };
        let session = BillingSession::new(Percent::from_whole(18), PaymentMethod::Cash);
        Shell::new(db, config, session).with_clock(|| {
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        })
    }

    fn text(output: ShellOutput) -> String {
        match output {
            ShellOutput::Text(text) => text,
            ShellOutput::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"add "Urea (46-0-0)" 2"#).unwrap(),
            vec!["add", "Urea (46-0-0)", "2"]
        );
        assert_eq!(
            tokenize(r#"customer "" --phone 98"#).unwrap(),
            vec!["customer", "", "--phone", "98"]
        );
        assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
        assert!(tokenize(r#"add "Urea 2"#).is_err());
    }

    #[tokio::test]
    async fn test_bill_from_shell_lines() {
        let mut shell = shell().await;

        text(shell.execute(r#"item-add "Urea (46-0-0)" 350 100"#).await);
        let out = text(shell.execute(r#"add "Urea (46-0-0)" 2"#).await);
        assert!(out.contains("Urea (46-0-0)"));

        let out = text(shell.execute("save").await);
        assert!(out.ends_with("Saved INV-20240115-0001"));
        assert!(shell.session().cart().is_empty());

        let out = text(shell.execute("items").await);
        assert!(out.contains("stock    98"));

        let out = text(shell.execute("report").await);
        assert!(out.contains("INV-20240115-0001"));
    }

    #[tokio::test]
    async fn test_errors_are_printed() {
        let mut shell = shell().await;

        let out = text(shell.execute("add Gypsum 1").await);
        assert_eq!(out, "Error: Item not found: Gypsum");

        let out = text(shell.execute("save").await);
        assert_eq!(out, "Error: Cart is empty");

        let out = text(shell.execute("frobnicate").await);
        assert!(out.contains("frobnicate"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut shell = shell().await;
        assert_eq!(shell.execute("quit").await, ShellOutput::Quit);
        assert_eq!(shell.execute("exit").await, ShellOutput::Quit);
    }

    #[tokio::test]
    async fn test_run_reads_until_quit() {
        let mut shell = shell().await;
        let input = "custom Twine 2 15\ncart\nquit\ncart\n";
        let mut output = Vec::new();

        shell.run(input.as_bytes(), &mut output).await.unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Twine"));
        assert_eq!(printed.matches(PROMPT).count(), 3);
    }
}
