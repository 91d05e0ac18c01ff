//! # Bill Repository
//!
//! Reads and row-level writes for bill headers and their lines.
//!
//! The write helpers (`*_in`) run on a borrowed connection and never open
//! their own transaction. They are only called by the
//! [`BillReconciler`](crate::reconciler::BillReconciler), which wraps them
//! together with the matching stock movements.
//!
//! ## Tables
//! ```text
//! bills                               bill_items
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │ id                       │◄───┐   │ id                       │
//! │ invoice_number (unique)  │    └───│ bill_id (cascade delete) │
//! │ customer_id              │        │ position                 │
//! │ subtotal .. total_amount │        │ item_name, quantity      │
//! │ payment_method           │        │ price, total             │
//! │ created_at, updated_at   │        └──────────────────────────┘
//! └──────────────────────────┘
//! ```

use agro_core::{
    Bill, BillDraft, BillItem, CoreError, InvoiceNumber, LineItem, Money, PaymentMethod,
    ValidationError,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{generate_id, money_text, parse_money, parse_percent, percent_text};
use crate::error::{DbError, DbResult};

const BILL_COLUMNS: &str = r#"
    SELECT id, invoice_number, customer_id, subtotal, discount_rate, discount_amount,
           tax_rate, tax_amount, total_amount, payment_method, created_at, updated_at
    FROM bills
"#;

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: String,
    invoice_number: String,
    customer_id: Option<String>,
    subtotal: String,
    discount_rate: String,
    discount_amount: String,
    tax_rate: String,
    tax_amount: String,
    total_amount: String,
    payment_method: PaymentMethod,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<BillRow> for Bill {
    type Error = DbError;

    fn try_from(row: BillRow) -> DbResult<Self> {
        Ok(Bill {
            invoice_number: InvoiceNumber::parse(&row.invoice_number)
                .map_err(|e| DbError::invalid_data("bills.invoice_number", e))?,
            subtotal: parse_money("bills.subtotal", &row.subtotal)?,
            discount_rate: parse_percent("bills.discount_rate", &row.discount_rate)?,
            discount_amount: parse_money("bills.discount_amount", &row.discount_amount)?,
            tax_rate: parse_percent("bills.tax_rate", &row.tax_rate)?,
            tax_amount: parse_money("bills.tax_amount", &row.tax_amount)?,
            total_amount: parse_money("bills.total_amount", &row.total_amount)?,
            id: row.id,
            customer_id: row.customer_id,
            payment_method: row.payment_method,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillItemRow {
    id: String,
    bill_id: String,
    position: i64,
    item_name: String,
    quantity: i64,
    price: String,
    total: String,
}

impl TryFrom<BillItemRow> for BillItem {
    type Error = DbError;

    fn try_from(row: BillItemRow) -> DbResult<Self> {
        Ok(BillItem {
            unit_price: parse_money("bill_items.price", &row.price)?,
            line_total: parse_money("bill_items.total", &row.total)?,
            id: row.id,
            bill_id: row.bill_id,
            position: row.position,
            item_name: row.item_name,
            quantity: row.quantity,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillSummaryRow {
    invoice_number: String,
    customer_name: Option<String>,
    total_amount: String,
    payment_method: PaymentMethod,
    created_at: NaiveDateTime,
    item_count: i64,
}

/// One row of the recent-bills list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillSummary {
    pub invoice_number: InvoiceNumber,
    pub customer_name: Option<String>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub created_at: NaiveDateTime,
    pub item_count: i64,
}

impl TryFrom<BillSummaryRow> for BillSummary {
    type Error = DbError;

    fn try_from(row: BillSummaryRow) -> DbResult<Self> {
        Ok(BillSummary {
            invoice_number: InvoiceNumber::parse(&row.invoice_number)
                .map_err(|e| DbError::invalid_data("bills.invoice_number", e))?,
            customer_name: row.customer_name,
            total_amount: parse_money("bills.total_amount", &row.total_amount)?,
            payment_method: row.payment_method,
            created_at: row.created_at,
            item_count: row.item_count,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Read access to saved bills, plus the row writers used by the reconciler.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    pub async fn get_by_invoice(&self, invoice: &InvoiceNumber) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_invoice_in(&mut conn, invoice).await
    }

    /// Lines of a bill in their original order.
    pub async fn items(&self, bill_id: &str) -> DbResult<Vec<BillItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::items_in(&mut conn, bill_id).await
    }

    /// Most recent bills first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        let rows: Vec<BillSummaryRow> = sqlx::query_as(
            r#"
            SELECT b.invoice_number,
                   c.name AS customer_name,
                   b.total_amount,
                   b.payment_method,
                   b.created_at,
                   (SELECT COUNT(*) FROM bill_items i WHERE i.bill_id = b.id) AS item_count
            FROM bills b
            LEFT JOIN customers c ON c.id = b.customer_id
            ORDER BY b.created_at DESC, b.invoice_number DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BillSummary::try_from).collect()
    }

    /// The number the next bill of `date` would get.
    ///
    /// Only a preview: the reconciler computes the real number inside its
    /// transaction.
    pub async fn next_invoice_number(&self, date: NaiveDate) -> DbResult<InvoiceNumber> {
        let mut conn = self.pool.acquire().await?;
        Self::next_invoice_number_in(&mut conn, date).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Connection-level helpers
    // =========================================================================

    /// Highest sequence used on `date`, plus one.
    ///
    /// Gaps left by deleted bills are not reused; a deleted last bill frees
    /// its number for the next save.
    pub async fn next_invoice_number_in(
        conn: &mut SqliteConnection,
        date: NaiveDate,
    ) -> DbResult<InvoiceNumber> {
        let pattern = format!("{}%", InvoiceNumber::day_prefix(date));
        let last: Option<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM bills WHERE invoice_number LIKE ?1 ORDER BY invoice_number DESC LIMIT 1",
        )
        .bind(pattern)
        .fetch_optional(&mut *conn)
        .await?;

        let last_sequence = match last {
            Some(number) => InvoiceNumber::parse(&number)
                .ok()
                .and_then(|n| n.sequence())
                .ok_or_else(|| DbError::invalid_data("bills.invoice_number", number))?,
            None => 0,
        };

        if last_sequence >= InvoiceNumber::MAX_SEQUENCE {
            return Err(CoreError::from(ValidationError::OutOfRange {
                field: "invoice sequence".to_string(),
                min: 1,
                max: i64::from(InvoiceNumber::MAX_SEQUENCE),
            })
            .into());
        }

        Ok(InvoiceNumber::new(date, last_sequence + 1))
    }

    pub async fn find_by_invoice_in(
        conn: &mut SqliteConnection,
        invoice: &InvoiceNumber,
    ) -> DbResult<Option<Bill>> {
        let row: Option<BillRow> = sqlx::query_as(&format!("{BILL_COLUMNS} WHERE invoice_number = ?1"))
            .bind(invoice.as_str())
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Bill::try_from).transpose()
    }

    pub async fn items_in(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Vec<BillItem>> {
        let rows: Vec<BillItemRow> = sqlx::query_as(
            r#"
            SELECT id, bill_id, position, item_name, quantity, price, total
            FROM bill_items
            WHERE bill_id = ?1
            ORDER BY position
            "#,
        )
        .bind(bill_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(BillItem::try_from).collect()
    }

    pub async fn insert_header_in(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                id, invoice_number, customer_id, subtotal, discount_rate, discount_amount,
                tax_rate, tax_amount, total_amount, payment_method, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&bill.id)
        .bind(bill.invoice_number.as_str())
        .bind(&bill.customer_id)
        .bind(money_text(bill.subtotal))
        .bind(percent_text(bill.discount_rate))
        .bind(money_text(bill.discount_amount))
        .bind(percent_text(bill.tax_rate))
        .bind(money_text(bill.tax_amount))
        .bind(money_text(bill.total_amount))
        .bind(bill.payment_method)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(invoice = %bill.invoice_number, "Bill header inserted");
        Ok(())
    }

    /// Rewrites totals, payment, customer and `updated_at`.
    ///
    /// `id`, `invoice_number` and `created_at` never change.
    pub async fn update_header_in(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills SET
                customer_id = ?2,
                subtotal = ?3,
                discount_rate = ?4,
                discount_amount = ?5,
                tax_rate = ?6,
                tax_amount = ?7,
                total_amount = ?8,
                payment_method = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.customer_id)
        .bind(money_text(bill.subtotal))
        .bind(percent_text(bill.discount_rate))
        .bind(money_text(bill.discount_amount))
        .bind(percent_text(bill.tax_rate))
        .bind(money_text(bill.tax_amount))
        .bind(money_text(bill.total_amount))
        .bind(bill.payment_method)
        .bind(bill.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill", bill.invoice_number.as_str()));
        }
        Ok(())
    }

    /// Writes the draft's lines in cart order.
    pub async fn insert_items_in(
        conn: &mut SqliteConnection,
        bill_id: &str,
        lines: &[LineItem],
    ) -> DbResult<Vec<BillItem>> {
        let mut items = Vec::with_capacity(lines.len());

        for (position, line) in lines.iter().enumerate() {
            let item = BillItem {
                id: generate_id(),
                bill_id: bill_id.to_string(),
                position: position as i64,
                item_name: line.name().to_string(),
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                line_total: line.line_total(),
            };

            sqlx::query(
                r#"
                INSERT INTO bill_items (id, bill_id, position, item_name, quantity, price, total)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.bill_id)
            .bind(item.position)
            .bind(&item.item_name)
            .bind(item.quantity)
            .bind(money_text(item.unit_price))
            .bind(money_text(item.line_total))
            .execute(&mut *conn)
            .await?;

            items.push(item);
        }

        Ok(items)
    }

    pub async fn delete_items_in(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM bill_items WHERE bill_id = ?1")
            .bind(bill_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_header_in(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM bills WHERE id = ?1")
            .bind(bill_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Builds the header row for a draft.
pub(crate) fn header_from_draft(
    id: String,
    invoice_number: InvoiceNumber,
    customer_id: Option<String>,
    draft: &BillDraft,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
) -> Bill {
    let totals = draft.calculation();
    Bill {
        id,
        invoice_number,
        customer_id,
        subtotal: totals.subtotal,
        discount_rate: totals.discount_rate,
        discount_amount: totals.discount_amount,
        tax_rate: totals.tax_rate,
        tax_amount: totals.tax_amount,
        total_amount: totals.grand_total,
        payment_method: draft.payment_method(),
        created_at,
        updated_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use agro_core::{Cart, Percent};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn draft() -> BillDraft {
        let mut cart = Cart::new();
        cart.add_custom("Urea (46-0-0)", 2, Money::from_cents(35000)).unwrap();
        cart.add_custom("DAP (18-46-0)", 1, Money::from_cents(135000)).unwrap();
        BillDraft::new(
            &cart,
            Percent::from_whole(10),
            Percent::from_whole(18),
            PaymentMethod::Upi,
            None,
        )
        .unwrap()
    }

    async fn insert(db: &Database, invoice: InvoiceNumber) -> Bill {
        let at = day().and_hms_opt(10, 30, 0).unwrap();
        let bill = header_from_draft(generate_id(), invoice, None, &draft(), at, at);
        let mut conn = db.pool().acquire().await.unwrap();
        BillRepository::insert_header_in(&mut conn, &bill).await.unwrap();
        BillRepository::insert_items_in(&mut conn, &bill.id, draft().lines())
            .await
            .unwrap();
        bill
    }

    #[tokio::test]
    async fn test_first_invoice_of_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let next = db.bills().next_invoice_number(day()).await.unwrap();
        assert_eq!(next.as_str(), "INV-20240115-0001");
    }

    #[tokio::test]
    async fn test_sequence_is_per_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert(&db, InvoiceNumber::new(day(), 1)).await;
        insert(&db, InvoiceNumber::new(day(), 2)).await;

        let next = db.bills().next_invoice_number(day()).await.unwrap();
        assert_eq!(next.as_str(), "INV-20240115-0003");

        let tomorrow = day().succ_opt().unwrap();
        let next = db.bills().next_invoice_number(tomorrow).await.unwrap();
        assert_eq!(next.as_str(), "INV-20240116-0001");
    }

    #[tokio::test]
    async fn test_header_round_trip_is_exact() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stored = insert(&db, InvoiceNumber::new(day(), 1)).await;

        let loaded = db
            .bills()
            .get_by_invoice(&stored.invoice_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.total_amount, Money::from_cents(217710));
        assert_eq!(loaded.payment_method, PaymentMethod::Upi);

        let items = db.bills().items(&loaded.id).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, ["Urea (46-0-0)", "DAP (18-46-0)"]);
        assert_eq!(items[0].line_total, Money::from_cents(70000));
    }

    #[tokio::test]
    async fn test_recent_lists_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert(&db, InvoiceNumber::new(day(), 1)).await;
        insert(&db, InvoiceNumber::new(day(), 2)).await;

        let recent = db.bills().recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].invoice_number.as_str(), "INV-20240115-0002");
        assert_eq!(recent[0].item_count, 2);
        assert_eq!(recent[0].customer_name, None);
    }

    #[tokio::test]
    async fn test_deleting_header_cascades_to_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bill = insert(&db, InvoiceNumber::new(day(), 1)).await;

        let mut conn = db.pool().acquire().await.unwrap();
        BillRepository::delete_header_in(&mut conn, &bill.id).await.unwrap();
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_items")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(left, 0);
        assert_eq!(db.bills().count().await.unwrap(), 0);
    }
}
