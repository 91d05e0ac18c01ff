//! # Report Repository
//!
//! Sales totals over fixed periods, computed from the saved bill headers.
//!
//! ```text
//! today          created_at ≥ today 00:00
//! last 7 days    created_at ≥ (today - 6 days) 00:00
//! this month     created_at ≥ 1st of the month 00:00
//! all time       every bill
//! ```
//!
//! Totals are summed as decimals in Rust: the amounts are TEXT columns and
//! SQLite's `SUM` would go through floating point.

use agro_core::Money;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::SqlitePool;

use super::bill::{BillRepository, BillSummary};
use super::parse_money;
use crate::error::DbResult;

/// Bill count and takings for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodTotals {
    pub bill_count: i64,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub today: PeriodTotals,
    pub last_7_days: PeriodTotals,
    pub this_month: PeriodTotals,
    pub all_time: PeriodTotals,
    pub recent: Vec<BillSummary>,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Bills listed under the totals.
    pub const RECENT_LIMIT: u32 = 10;

    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the report as seen on `today` (shop-local date).
    pub async fn sales_report(&self, today: NaiveDate) -> DbResult<SalesReport> {
        let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);

        Ok(SalesReport {
            today: self.totals_since(Some(start_of(today))).await?,
            last_7_days: self.totals_since(Some(start_of(week_start))).await?,
            this_month: self.totals_since(Some(start_of(month_start))).await?,
            all_time: self.totals_since(None).await?,
            recent: BillRepository::new(self.pool.clone())
                .recent(Self::RECENT_LIMIT)
                .await?,
        })
    }

    /// Totals of bills created at or after `since` (all bills for `None`).
    pub async fn totals_since(&self, since: Option<NaiveDateTime>) -> DbResult<PeriodTotals> {
        let amounts: Vec<String> = match since {
            Some(since) => {
                sqlx::query_scalar("SELECT total_amount FROM bills WHERE created_at >= ?1")
                    .bind(since)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT total_amount FROM bills")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut totals = PeriodTotals::default();
        for amount in &amounts {
            totals.total += parse_money("bills.total_amount", amount)?;
            totals.bill_count += 1;
        }
        Ok(totals)
    }
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::bill::header_from_draft;
    use crate::repository::generate_id;
    use crate::{Database, DbConfig};
    use agro_core::{BillDraft, Cart, InvoiceNumber, Percent, PaymentMethod};

    async fn bill_on(db: &Database, day: NaiveDate, sequence: u32, price_cents: i64) {
        let mut cart = Cart::new();
        cart.add_custom("Urea (46-0-0)", 1, Money::from_cents(price_cents)).unwrap();
        let draft = BillDraft::new(&cart, Percent::zero(), Percent::zero(), PaymentMethod::Cash, None).unwrap();
        let at = day.and_hms_opt(9, 15, 0).unwrap();
        let bill = header_from_draft(generate_id(), InvoiceNumber::new(day, sequence), None, &draft, at, at);

        let mut conn = db.pool().acquire().await.unwrap();
        BillRepository::insert_header_in(&mut conn, &bill).await.unwrap();
    }

    #[tokio::test]
    async fn test_period_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        bill_on(&db, today, 1, 10050).await;
        bill_on(&db, today, 2, 20025).await;
        bill_on(&db, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), 1, 100000).await;
        bill_on(&db, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 1, 50000).await;
        bill_on(&db, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(), 1, 70000).await;

        let report = db.reports().sales_report(today).await.unwrap();

        assert_eq!(report.today, PeriodTotals { bill_count: 2, total: Money::from_cents(30075) });
        assert_eq!(report.last_7_days.bill_count, 3);
        assert_eq!(report.last_7_days.total, Money::from_cents(130075));
        assert_eq!(report.this_month.bill_count, 4);
        assert_eq!(report.all_time.bill_count, 5);
        assert_eq!(report.all_time.total, Money::from_cents(250075));
        assert_eq!(report.recent.len(), 5);
        assert_eq!(report.recent[0].invoice_number.as_str(), "INV-20240310-0002");
    }

    #[tokio::test]
    async fn test_empty_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let report = db.reports().sales_report(today).await.unwrap();

        assert_eq!(report.all_time, PeriodTotals::default());
        assert!(report.recent.is_empty());
    }
}
