//! # Receipt Formatter
//!
//! Renders the 48-column plain-text invoice printed at the counter.
//!
//! ## Layout
//! ```text
//! ================================================
//!             Green Valley Fertilizers
//!               123 Farm Road, City
//!              Phone: +91 9876543210
//! ================================================
//! Date: 15-01-2024 10:30:00
//! Invoice: INV-20240115-0001
//! Customer: Ramesh Kumar
//! ------------------------------------------------
//! Item                    Qty     Price     Total
//! ------------------------------------------------
//! Urea (46-0-0)             2 Rs.350.00 Rs.700.00
//! ------------------------------------------------
//! Subtotal:                         Rs.  700.00
//! GST (18%):                        +Rs.  126.00
//! ================================================
//! GRAND TOTAL:                      Rs.  826.00
//! ================================================
//! Payment: Cash
//! ```
//!
//! Output depends only on the arguments: the same settings, lines, totals
//! and header always produce the same bytes. Lines are joined with `\n`
//! and the text ends with a trailing `\n`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::calculator::BillCalculation;
use crate::cart::LineItem;
use crate::types::{InvoiceNumber, PaymentMethod, ShopSettings};
use crate::RECEIPT_WIDTH;

/// Item names longer than this are cut in the item table.
const NAME_WIDTH: usize = 22;
/// Label column of the totals block.
const LABEL_WIDTH: usize = 33;
/// Address lines wrap at this many characters.
const ADDRESS_WIDTH: usize = RECEIPT_WIDTH - 6;

/// Per-bill metadata printed under the shop header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptHeader {
    pub invoice_number: InvoiceNumber,
    pub issued_at: NaiveDateTime,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Renders the receipt text.
///
/// Discount and tax lines are only printed for non-zero rates. Amounts in
/// the item table use thousands separators; amounts in the totals block
/// do not.
pub fn render_receipt(
    settings: &ShopSettings,
    header: &ReceiptHeader,
    lines: &[LineItem],
    totals: &BillCalculation,
) -> String {
    let currency = settings.currency.as_str();
    let double_rule = "=".repeat(RECEIPT_WIDTH);
    let single_rule = "-".repeat(RECEIPT_WIDTH);
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 32);

    // Shop block
    out.push(double_rule.clone());
    out.push(center(&settings.shop_name));
    if !settings.shop_address.is_empty() {
        out.extend(wrap(&settings.shop_address, ADDRESS_WIDTH).iter().map(|l| center(l)));
    }
    if !settings.shop_phone.is_empty() {
        out.push(center(&format!("Phone: {}", settings.shop_phone)));
    }
    out.push(double_rule.clone());
    if !settings.gst_number.is_empty() {
        out.push(center(&format!("GST No: {}", settings.gst_number)));
    }
    if !settings.licence_number.is_empty() {
        out.push(center(&format!("Licence No: {}", settings.licence_number)));
    }

    // Bill metadata
    out.push(format!("Date: {}", header.issued_at.format("%d-%m-%Y %H:%M:%S")));
    out.push(format!("Invoice: {}", header.invoice_number));
    if let Some(name) = header.customer_name.as_deref().filter(|n| !n.is_empty()) {
        out.push(format!("Customer: {name}"));
    }

    // Item table
    out.push(single_rule.clone());
    out.push(format!("{:<22} {:>4} {:>9} {:>9}", "Item", "Qty", "Price", "Total"));
    out.push(single_rule.clone());
    for line in lines {
        let name: String = line.name().chars().take(NAME_WIDTH).collect();
        out.push(format!(
            "{:<22} {:>4} {:>9} {:>9}",
            name,
            line.quantity(),
            format!("{currency}{}", line.unit_price().grouped()),
            format!("{currency}{}", line.line_total().grouped()),
        ));
    }
    out.push(single_rule);

    // Totals
    out.push(format!(
        "{:<LABEL_WIDTH$} {currency}{:>8}",
        "Subtotal:", totals.subtotal
    ));
    if totals.shows_discount() {
        out.push(format!(
            "{:<LABEL_WIDTH$} -{currency}{:>8}",
            format!("Discount ({}%):", totals.discount_rate),
            totals.discount_amount
        ));
    }
    if totals.shows_tax() {
        out.push(format!(
            "{:<LABEL_WIDTH$} +{currency}{:>8}",
            format!("GST ({}%):", totals.tax_rate),
            totals.tax_amount
        ));
    }
    out.push(double_rule.clone());
    out.push(format!(
        "{:<LABEL_WIDTH$} {currency}{:>8}",
        "GRAND TOTAL:", totals.grand_total
    ));
    out.push(double_rule.clone());

    // Footer
    out.push(format!("Payment: {}", header.payment_method));
    out.push(String::new());
    out.push(center("Thank you for your purchase!"));
    out.push(center("Visit Again Soon!"));
    out.push(double_rule);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Centers within the receipt width; an odd leftover space goes right.
fn center(text: &str) -> String {
    format!("{text:^RECEIPT_WIDTH$}")
}

/// Breaks text at the last space before `width`, or hard-cuts a word that
/// has no space to break at.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > width {
        let cut = rest[..width].iter().rposition(|c| *c == ' ').unwrap_or(width);
        lines.push(rest[..cut].iter().collect());
        let next = rest[cut..].iter().skip_while(|c| c.is_whitespace()).copied().collect();
        rest = next;
    }
    if !rest.is_empty() {
        lines.push(rest.into_iter().collect());
    }
    lines
}

// =============================================================================
// Unit Tests
// =============================================================================
