//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Counter command                                                       │
//! │       │                                                                 │
//! │       │  db.inventory().get_by_name("Urea (46-0-0)")                   │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                   │
//! │  ├── pool methods         &self, one statement each                    │
//! │  └── *_in(conn, ..)       take a borrowed connection so the            │
//! │                           reconciler can run them inside its           │
//! │                           transaction                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`](inventory::InventoryRepository) - Catalogue and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers by phone
//! - [`BillRepository`](bill::BillRepository) - Bill headers and lines
//! - [`SettingsRepository`](settings::SettingsRepository) - Shop settings row
//! - [`ReportRepository`](report::ReportRepository) - Sales summaries

pub mod bill;
pub mod customer;
pub mod inventory;
pub mod report;
pub mod settings;

use agro_core::{Money, Percent};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new primary key.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a TEXT money column.
pub(crate) fn parse_money(column: &str, value: &str) -> DbResult<Money> {
    Money::from_str(value).map_err(|e| DbError::invalid_data(column, e))
}

/// Parses a TEXT rate column.
pub(crate) fn parse_percent(column: &str, value: &str) -> DbResult<Percent> {
    let decimal = Decimal::from_str(value.trim()).map_err(|e| DbError::invalid_data(column, e))?;
    Percent::new(decimal).map_err(|e| DbError::invalid_data(column, e))
}

/// Renders an amount for a TEXT column, exact and without trailing zeros.
pub(crate) fn money_text(value: Money) -> String {
    value.amount().normalize().to_string()
}

pub(crate) fn percent_text(value: Percent) -> String {
    value.value().normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_text_is_exact() {
        let value = Money::new(Decimal::new(574875, 5));
        assert_eq!(money_text(value), "5.74875");
        assert_eq!(parse_money("total", &money_text(value)).unwrap(), value);
        assert_eq!(money_text(Money::from_cents(135000)), "1350");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_money("price", "twelve"),
            Err(DbError::InvalidData { .. })
        ));
        assert!(matches!(
            parse_percent("tax_rate", "140"),
            Err(DbError::InvalidData { .. })
        ));
    }
}
