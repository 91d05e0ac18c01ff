//! # Report Commands

use agro_db::{Database, SalesReport};
use chrono::NaiveDate;
use tracing::debug;

use crate::error::ApiResult;

/// Sales totals for today, the last 7 days, this month and all time, plus
/// the most recent bills.
///
/// ## Report Layout
/// ```text
/// ┌────────────────────────────────────────────┐
/// │  Today            3 bills    Rs.4,350.00   │
/// │  Last 7 days     21 bills   Rs.38,120.50   │
/// │  This month      40 bills   Rs.71,004.00   │
/// │  All time       912 bills Rs.1,604,210.75  │
/// │                                            │
/// │  INV-20240115-0003  10:41  Rs.1,593.00     │
/// │  INV-20240115-0002  10:12  Rs.413.00       │
/// │  ...                                       │
/// └────────────────────────────────────────────┘
/// ```
pub async fn sales_report(db: &Database, today: NaiveDate) -> ApiResult<SalesReport> {
    debug!(%today, "sales_report command");
    Ok(db.reports().sales_report(today).await?)
}
