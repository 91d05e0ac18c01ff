//! # Counter Error Type
//!
//! One error type for every counter command.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow at the Counter                            │
//! │                                                                         │
//! │  Shell line: add "Urea (46-0-0)" 500                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │         │                                                        │  │
//! │  │         ├── ValidationError ──► ApiError { VALIDATION_ERROR }    │  │
//! │  │         ├── CoreError ────────► ApiError { INSUFFICIENT_STOCK }  │  │
//! │  │         ├── DbError ──────────► ApiError { DATABASE_ERROR }      │  │
//! │  │         │                         (details logged, not shown)    │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Shell prints: "Error: Only 100 units of Urea (46-0-0) available       │
//! │                 (requested 500)"                                        │
//! │  Cart, stock and bills are unchanged.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use agro_core::{CoreError, ValidationError};
use agro_db::DbError;
use serde::Serialize;

use crate::state::ConfigError;

/// Error returned from counter commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Bill not found: INV-20240115-0009"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Message shown to the operator
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Item or bill does not exist
    NotFound,

    /// Input rejected before anything changed
    ValidationError,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Cart rule broken (empty, too many lines)
    CartError,

    /// Database operation failed
    DatabaseError,

    /// Receipt file or config file could not be read or written
    IoError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Domain(e) => e.into(),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(
                    ErrorCode::DatabaseError,
                    "Bill not saved, nothing was changed",
                )
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::InvalidData { column, reason } => {
                tracing::error!(%column, %reason, "Unreadable stored value");
                ApiError::new(ErrorCode::DatabaseError, "Stored data is damaged")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(name) => ApiError::not_found("Item", &name),
            CoreError::BillNotFound(invoice) => ApiError::not_found("Bill", &invoice),
            e @ CoreError::LineNotFound(_) => ApiError::cart(e.to_string()),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::EmptyCart | CoreError::CartTooLarge { .. }) => {
                ApiError::cart(e.to_string())
            }
            e @ CoreError::QuantityTooLarge { .. } => ApiError::validation(e.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("File operation failed: {}", err);
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for counter commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_keeps_message() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            name: "Urea (46-0-0)".to_string(),
            available: 3,
            requested: 5,
        })
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Only 3 units of Urea (46-0-0) available (requested 5)"
        );
    }

    #[test]
    fn test_query_failure_is_generic() {
        let err: ApiError = DbError::QueryFailed("no such table: bills".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("bills"));
    }

    #[test]
    fn test_empty_cart_is_cart_error() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(err.to_string(), "[CartError] Cart is empty");
    }

    #[test]
    fn test_serializes_screaming_code() {
        let err = ApiError::not_found("Bill", "INV-20240115-0009");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Bill not found: INV-20240115-0009");
    }
}
