//! # Bill Commands
//!
//! Preview, save, edit, delete and export bills.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Save Flow                                            │
//! │                                                                         │
//! │  save                                                                   │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  session.draft() ──── empty cart ──► CART_ERROR (session unchanged)    │
//! │    │                                                                    │
//! │  settings read (before any write)                                      │
//! │    │                                                                    │
//! │    ├── not editing ──► reconciler.save_new(draft, now)                 │
//! │    │                      new invoice INV-YYYYMMDD-NNNN                │
//! │    │                                                                    │
//! │    └── editing ──────► reconciler.update(invoice, draft, now)          │
//! │                           same invoice, stock restored then deducted   │
//! │    │                                                                    │
//! │    ├── Err ──► session unchanged, nothing written                      │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  receipt rendered from the saved snapshot, session reset               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use agro_core::{
    render_receipt, Bill, BillItem, CoreError, InvoiceNumber, LineItem, ReceiptHeader, ShopSettings,
};
use agro_db::{Database, DeleteOutcome};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::commands::cart::CartView;
use crate::error::ApiResult;
use crate::state::BillingSession;

/// Response of [`save_bill`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub invoice_number: InvoiceNumber,
    /// True when an existing bill was replaced.
    pub edited: bool,
    pub receipt: String,
}

/// Response of [`export_receipt`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub invoice_number: InvoiceNumber,
    pub path: PathBuf,
}

/// Renders the receipt for the current session without saving.
///
/// A new bill shows the invoice number it would get if saved now; a bill
/// being edited shows its own number and original date.
pub async fn preview_receipt(
    db: &Database,
    session: &BillingSession,
    now: NaiveDateTime,
) -> ApiResult<String> {
    debug!("preview_receipt command");
    let (invoice_number, receipt) = render_session(db, session, now).await?;
    debug!(invoice = %invoice_number, "Receipt preview rendered");
    Ok(receipt)
}

/// Saves the session as a new bill, or replaces the bill being edited.
///
/// ## Returns
/// * `Ok(SaveResponse)` - Invoice number and receipt; the session is reset
/// * `Err(ApiError)` - Nothing was written and the session is unchanged
pub async fn save_bill(
    db: &Database,
    session: &mut BillingSession,
    now: NaiveDateTime,
) -> ApiResult<SaveResponse> {
    debug!(editing = session.editing().is_some(), "save_bill command");

    let draft = session.draft()?;
    let customer_name = draft.customer().map(|c| c.name.clone());
    // Nothing after the commit below may fail.
    let settings = db.settings().get().await?;

    let (saved, edited) = match session.editing() {
        Some(editing) => {
            let saved = db
                .reconciler()
                .update(&editing.invoice_number, &draft, now)
                .await?;
            (saved, true)
        }
        None => (db.reconciler().save_new(&draft, now).await?, false),
    };

    let receipt = receipt_for(&settings, &saved.bill, &saved.items, customer_name);

    session.new_bill();
    info!(invoice = %saved.bill.invoice_number, edited, "Bill saved from counter");

    Ok(SaveResponse {
        invoice_number: saved.bill.invoice_number,
        edited,
        receipt,
    })
}

/// Loads a saved bill into the session for editing.
///
/// Whatever was in the session before is discarded.
pub async fn load_bill_for_edit(
    db: &Database,
    session: &mut BillingSession,
    invoice: &str,
) -> ApiResult<CartView> {
    debug!(invoice = %invoice, "load_bill_for_edit command");

    let invoice = InvoiceNumber::parse(invoice)?;
    let loaded = db.reconciler().load_for_edit(&invoice).await?;
    session.begin_edit(&loaded);

    Ok(CartView::from(&*session))
}

/// Renders the receipt of a saved bill.
pub async fn show_bill(db: &Database, invoice: &str) -> ApiResult<String> {
    debug!(invoice = %invoice, "show_bill command");

    let invoice = InvoiceNumber::parse(invoice)?;
    let loaded = db.reconciler().load_for_edit(&invoice).await?;
    let settings = db.settings().get().await?;

    Ok(receipt_for(
        &settings,
        &loaded.bill,
        &loaded.items,
        loaded.customer.map(|c| c.name),
    ))
}

/// Deletes bills and returns their stock.
///
/// Every invoice number is checked before anything is deleted. If the bill
/// being edited is deleted, the session starts a fresh bill.
pub async fn delete_bills(
    db: &Database,
    session: &mut BillingSession,
    invoices: &[String],
) -> ApiResult<DeleteOutcome> {
    debug!(count = invoices.len(), "delete_bills command");

    let invoices = invoices
        .iter()
        .map(|text| InvoiceNumber::parse(text))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = db.reconciler().delete_many(&invoices).await?;

    let editing_deleted = session
        .editing()
        .is_some_and(|e| outcome.deleted.contains(&e.invoice_number));
    if editing_deleted {
        info!("Bill being edited was deleted, starting a new bill");
        session.new_bill();
    }

    Ok(outcome)
}

/// Writes a receipt to `Bill_<invoice>.txt` in `receipts_dir`.
///
/// With an invoice number the saved bill is exported; without one, the
/// current preview.
pub async fn export_receipt(
    db: &Database,
    session: &BillingSession,
    receipts_dir: &Path,
    invoice: Option<&str>,
    now: NaiveDateTime,
) -> ApiResult<ExportResponse> {
    debug!(invoice = ?invoice, dir = ?receipts_dir, "export_receipt command");

    let (invoice_number, receipt) = match invoice {
        Some(text) => {
            let invoice = InvoiceNumber::parse(text)?;
            let receipt = show_bill(db, invoice.as_str()).await?;
            (invoice, receipt)
        }
        None => render_session(db, session, now).await?,
    };

    tokio::fs::create_dir_all(receipts_dir).await?;
    let path = receipts_dir.join(format!("Bill_{}.txt", invoice_number));
    tokio::fs::write(&path, receipt.as_bytes()).await?;

    info!(invoice = %invoice_number, path = ?path, "Receipt exported");
    Ok(ExportResponse {
        invoice_number,
        path,
    })
}

// =============================================================================
// Helpers
// =============================================================================

async fn render_session(
    db: &Database,
    session: &BillingSession,
    now: NaiveDateTime,
) -> ApiResult<(InvoiceNumber, String)> {
    if session.cart().is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let (invoice_number, issued_at) = match session.editing() {
        Some(editing) => (editing.invoice_number.clone(), editing.issued_at),
        None => (db.bills().next_invoice_number(now.date()).await?, now),
    };

    let settings = db.settings().get().await?;
    let header = ReceiptHeader {
        invoice_number: invoice_number.clone(),
        issued_at,
        customer_name: session.customer().normalized().map(|c| c.name),
        payment_method: session.payment_method(),
    };
    let receipt = render_receipt(
        &settings,
        &header,
        session.cart().items(),
        &session.calculation(),
    );

    Ok((invoice_number, receipt))
}

/// Receipt of a saved bill, dated when it was first issued.
fn receipt_for(
    settings: &ShopSettings,
    bill: &Bill,
    items: &[BillItem],
    customer_name: Option<String>,
) -> String {
    let header = ReceiptHeader {
        invoice_number: bill.invoice_number.clone(),
        issued_at: bill.created_at,
        customer_name,
        payment_method: bill.payment_method,
    };
    let lines: Vec<LineItem> = items.iter().map(BillItem::to_line_item).collect();
    render_receipt(settings, &header, &lines, &bill.calculation())
}

// =============================================================================
// Unit Tests
// =============================================================================
