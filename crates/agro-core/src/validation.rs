//! # Validation Module
//!
//! Parsing and range checks for what the user types at the counter.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Counter shell                                                │
//! │  └── THIS MODULE: text → number, range checks                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart / BillDraft                                             │
//! │  └── stock availability, line and quantity caps                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE item name, phone, invoice number                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use agro_core::validation::{parse_quantity, parse_rate};
//!
//! assert_eq!(parse_quantity("5").unwrap(), 5);
//! assert!(parse_quantity("five").is_err());
//! assert_eq!(parse_rate("discount", "12.5").unwrap().to_string(), "12.5");
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{Money, Percent};
use crate::{MAX_ITEM_QUANTITY, MAX_STOCK, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted item name.
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name (catalogue or ad-hoc).
///
/// ## Rules
/// - Must not be blank
/// - At most 100 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "item name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "item name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a customer phone number.
///
/// Digits plus `+`, `-` and spaces, at least 5 digits.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "only digits, spaces, '+' and '-' are allowed".to_string(),
        });
    }
    if phone.chars().filter(char::is_ascii_digit).count() < 5 {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "too short".to_string(),
        });
    }
    Ok(())
}

/// Trims a search query, max 100 characters.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (9999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a selling price.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_UNIT_PRICE (10,000,000)
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if price.amount() > Decimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates a stock level (opening stock, restock amount).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

// =============================================================================
// Text Parsers
// =============================================================================

/// Parses a quantity typed by the user.
///
/// ## User Workflow
/// ```text
/// "5"    → Ok(5)
/// "0"    → Err(MustBePositive)
/// "2.5"  → Err(NotANumber)        whole units only
/// "abc"  → Err(NotANumber)
/// ```
pub fn parse_quantity(text: &str) -> ValidationResult<i64> {
    let qty = text
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field: "quantity".to_string(),
            value: text.trim().to_string(),
        })?;
    validate_quantity(qty)?;
    Ok(qty)
}

/// Parses a unit price typed by the user. Must be greater than zero.
pub fn parse_price(text: &str) -> ValidationResult<Money> {
    let price = Money::from_str(text).map_err(|_| ValidationError::NotANumber {
        field: "price".to_string(),
        value: text.trim().to_string(),
    })?;
    validate_unit_price(price)?;
    Ok(price)
}

/// Parses a discount or tax rate in percent (`0..=100`).
pub fn parse_rate(field: &str, text: &str) -> ValidationResult<Percent> {
    let value = Decimal::from_str(text.trim().trim_end_matches('%')).map_err(|_| {
        ValidationError::NotANumber {
            field: field.to_string(),
            value: text.trim().to_string(),
        }
    })?;
    Percent::new(value).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: 100,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
