//! # Bill Reconciler
//!
//! Every write that touches both a bill and the inventory goes through here,
//! inside a single SQLite transaction.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Transaction Per Operation                       │
//! │                                                                         │
//! │  save_new(draft)                                                        │
//! │  ├── resolve customer (reuse by phone)                                  │
//! │  ├── next invoice number for the day                                    │
//! │  ├── insert header + lines                                              │
//! │  └── stock -= qty for every line                                        │
//! │                                                                         │
//! │  update(invoice, draft)                                                 │
//! │  ├── load header + old lines          (NotFound → nothing written)      │
//! │  ├── stock += old qty                                                   │
//! │  ├── delete old lines                                                   │
//! │  ├── rewrite header (same id, number, created_at)                       │
//! │  ├── insert new lines                                                   │
//! │  └── stock -= new qty                                                   │
//! │                                                                         │
//! │  delete(invoice)                                                        │
//! │  ├── load header + lines                                                │
//! │  ├── stock += qty                                                       │
//! │  └── delete lines, delete header                                        │
//! │                                                                         │
//! │  Any error → the transaction is dropped → ROLLBACK. Nothing partial.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock movements are matched by item name. Lines whose name is not in the
//! inventory (ad-hoc items, items deleted since) are skipped.
//!
//! The deduct at save time is unconditional: availability is checked when
//! items are added to the cart, and stock may go negative if the counter
//! oversells.

use agro_core::{Bill, BillDraft, BillItem, Customer, InvoiceNumber};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::bill::{header_from_draft, BillRepository};
use crate::repository::customer::CustomerRepository;
use crate::repository::generate_id;
use crate::repository::inventory::InventoryRepository;

/// A bill as written, header plus lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedBill {
    pub bill: Bill,
    pub items: Vec<BillItem>,
}

/// A saved bill with everything needed to put it back into the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedBill {
    pub bill: Bill,
    pub items: Vec<BillItem>,
    pub customer: Option<Customer>,
}

/// Result of deleting several bills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: Vec<InvoiceNumber>,
    /// Invoice numbers that did not exist.
    pub missing: Vec<InvoiceNumber>,
}

/// Atomic bill writer.
///
/// ## Usage
/// ```rust,ignore
/// let reconciler = db.reconciler();
///
/// let saved = reconciler.save_new(&draft, Local::now().naive_local()).await?;
/// println!("Saved {}", saved.bill.invoice_number);
///
/// reconciler.delete(&saved.bill.invoice_number).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BillReconciler {
    pool: SqlitePool,
}

impl BillReconciler {
    pub fn new(pool: SqlitePool) -> Self {
        BillReconciler { pool }
    }

    async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> DbResult<()> {
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Saves a new bill issued at `issued_at` (shop-local time).
    ///
    /// ## Returns
    /// * `Ok(SavedBill)` - Header with its new invoice number, and the lines
    /// * `Err(DbError)` - Nothing was written
    pub async fn save_new(&self, draft: &BillDraft, issued_at: NaiveDateTime) -> DbResult<SavedBill> {
        let mut tx = self.begin().await?;

        let customer_id = resolve_customer(&mut *tx, draft).await?;
        let invoice = BillRepository::next_invoice_number_in(&mut *tx, issued_at.date()).await?;
        let bill = header_from_draft(generate_id(), invoice, customer_id, draft, issued_at, issued_at);

        BillRepository::insert_header_in(&mut *tx, &bill).await?;
        let items = BillRepository::insert_items_in(&mut *tx, &bill.id, draft.lines()).await?;
        deduct_stock(&mut *tx, &items).await?;

        Self::commit(tx).await?;

        info!(
            invoice = %bill.invoice_number,
            lines = items.len(),
            total = %bill.total_amount,
            payment = %bill.payment_method,
            "Bill saved"
        );

        Ok(SavedBill { bill, items })
    }

    // =========================================================================
    // Edit
    // =========================================================================

    /// Replaces the lines and totals of an existing bill.
    ///
    /// The invoice number and `created_at` are kept; `updated_at` becomes
    /// `edited_at`. Stock for the old lines is restored before the new lines
    /// are deducted, so an unchanged cart leaves stock unchanged.
    pub async fn update(
        &self,
        invoice: &InvoiceNumber,
        draft: &BillDraft,
        edited_at: NaiveDateTime,
    ) -> DbResult<SavedBill> {
        let mut tx = self.begin().await?;

        let existing = BillRepository::find_by_invoice_in(&mut *tx, invoice)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", invoice.as_str()))?;

        let old_items = BillRepository::items_in(&mut *tx, &existing.id).await?;
        restore_stock(&mut *tx, &old_items).await?;
        BillRepository::delete_items_in(&mut *tx, &existing.id).await?;

        let customer_id = resolve_customer(&mut *tx, draft).await?;
        let bill = header_from_draft(
            existing.id,
            existing.invoice_number,
            customer_id,
            draft,
            existing.created_at,
            edited_at,
        );
        BillRepository::update_header_in(&mut *tx, &bill).await?;

        let items = BillRepository::insert_items_in(&mut *tx, &bill.id, draft.lines()).await?;
        deduct_stock(&mut *tx, &items).await?;

        Self::commit(tx).await?;

        info!(
            invoice = %bill.invoice_number,
            old_lines = old_items.len(),
            new_lines = items.len(),
            total = %bill.total_amount,
            "Bill updated"
        );

        Ok(SavedBill { bill, items })
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes a bill and puts its quantities back into stock.
    pub async fn delete(&self, invoice: &InvoiceNumber) -> DbResult<Bill> {
        let mut tx = self.begin().await?;

        let bill = BillRepository::find_by_invoice_in(&mut *tx, invoice)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", invoice.as_str()))?;

        let items = BillRepository::items_in(&mut *tx, &bill.id).await?;
        restore_stock(&mut *tx, &items).await?;
        BillRepository::delete_items_in(&mut *tx, &bill.id).await?;
        BillRepository::delete_header_in(&mut *tx, &bill.id).await?;

        Self::commit(tx).await?;

        info!(invoice = %bill.invoice_number, lines = items.len(), "Bill deleted");
        Ok(bill)
    }

    /// Deletes several bills, one transaction each.
    ///
    /// Unknown invoice numbers are reported in `missing`; any other error
    /// stops the run (bills deleted before it stay deleted).
    pub async fn delete_many(&self, invoices: &[InvoiceNumber]) -> DbResult<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();

        for invoice in invoices {
            match self.delete(invoice).await {
                Ok(_) => outcome.deleted.push(invoice.clone()),
                Err(DbError::NotFound { .. }) => {
                    warn!(invoice = %invoice, "Bill to delete not found");
                    outcome.missing.push(invoice.clone());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Loads a saved bill for editing.
    pub async fn load_for_edit(&self, invoice: &InvoiceNumber) -> DbResult<LoadedBill> {
        let bills = BillRepository::new(self.pool.clone());

        let bill = bills
            .get_by_invoice(invoice)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", invoice.as_str()))?;
        let items = bills.items(&bill.id).await?;

        let customer = match bill.customer_id.as_deref() {
            Some(id) => CustomerRepository::new(self.pool.clone()).get_by_id(id).await?,
            None => None,
        };

        debug!(invoice = %invoice, lines = items.len(), "Bill loaded for edit");
        Ok(LoadedBill {
            bill,
            items,
            customer,
        })
    }
}

async fn resolve_customer(conn: &mut SqliteConnection, draft: &BillDraft) -> DbResult<Option<String>> {
    match draft.customer() {
        Some(details) => Ok(Some(CustomerRepository::resolve_in(conn, details).await?)),
        None => Ok(None),
    }
}

async fn deduct_stock(conn: &mut SqliteConnection, items: &[BillItem]) -> DbResult<()> {
    for item in items {
        InventoryRepository::adjust_stock_in(conn, &item.item_name, -item.quantity).await?;
    }
    Ok(())
}

async fn restore_stock(conn: &mut SqliteConnection, items: &[BillItem]) -> DbResult<()> {
    for item in items {
        InventoryRepository::adjust_stock_in(conn, &item.item_name, item.quantity).await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
