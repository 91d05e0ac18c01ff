//! # Error Types
//!
//! Domain-specific error types for agro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  agro-core errors (this file)                                          │
//! │  ├── CoreError        - Cart and bill rule violations                  │
//! │  └── ValidationError  - Bad form input (non-numeric, out of range)     │
//! │                                                                         │
//! │  agro-db errors (separate crate)                                       │
//! │  └── DbError          - Store and transaction failures                 │
//! │                                                                         │
//! │  Counter app errors                                                    │
//! │  └── ApiError         - What the shell prints                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Shell        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and billing rule errors.
///
/// Every variant leaves the cart untouched: the operation that produced it
/// is aborted before any state changes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory item cannot be found by name.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Not enough stock to put the requested quantity in the cart.
    ///
    /// ## When This Occurs
    /// ```text
    /// Add "Urea" (qty: 5)
    ///      │
    ///      ▼
    /// stock 100, already in cart 97
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Urea", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Shell prints: "Only 3 units of Urea available"
    /// ```
    #[error("Only {available} units of {name} available (requested {requested})")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Removal referenced a line the cart does not hold.
    #[error("No line for '{0}' in the cart")]
    LineNotFound(String),

    /// Bill cannot be found by invoice number.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Saving or printing needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Text that should have been a number.
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    /// Invalid format (e.g., malformed invoice number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., item name already in the catalogue).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Urea (46-0-0)".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Only 3 units of Urea (46-0-0) available (requested 5)"
        );
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::NotANumber {
            field: "quantity".to_string(),
            value: "two".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be a number, got 'two'");

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
