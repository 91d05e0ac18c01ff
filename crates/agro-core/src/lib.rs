//! # agro-core: Pure Billing Logic
//!
//! This crate holds the billing rules of the shop counter as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Agro Billing Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Counter shell (apps/counter)                   │   │
//! │  │    add / remove / discount / tax / save / edit / delete         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ agro-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │   cart    │  │ calculator │  │  receipt  │  │   money   │ │   │
//! │  │   │ LineItem  │  │  discount  │  │  48-col   │  │  Money    │ │   │
//! │  │   │  merging  │  │  then tax  │  │  layout   │  │  Percent  │ │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    agro-db (Database Layer)                     │   │
//! │  │       SQLite repositories, bill save/edit/delete reconciler     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (decimal, full precision) and `Percent`
//! - [`types`] - Inventory, customer, bill and settings records
//! - [`cart`] - Line items with merge-on-duplicate semantics
//! - [`calculator`] - Cascading discount-then-tax arithmetic
//! - [`receipt`] - Fixed-width plain-text invoice
//! - [`validation`] - Form input parsing and range checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use agro_core::{calculate, Cart, Money, Percent};
//!
//! let mut cart = Cart::new();
//! cart.add_custom("Urea (46-0-0)", 2, Money::from_cents(35000)).unwrap();
//! cart.add_custom("DAP (18-46-0)", 1, Money::from_cents(135000)).unwrap();
//!
//! let bill = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
//! assert_eq!(bill.grand_total.to_string(), "2177.10");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod cart;
pub mod error;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{calculate, BillCalculation};
pub use cart::{Cart, LineItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent};
pub use receipt::{render_receipt, ReceiptHeader};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// The receipt quantity column is four characters wide.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Highest unit price accepted, in whole currency units.
///
/// Keeps `price × quantity` and `price × stock` well inside `Decimal` range.
pub const MAX_UNIT_PRICE: i64 = 10_000_000;

/// Highest stock level accepted for a single item.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Character width of the printed receipt.
pub const RECEIPT_WIDTH: usize = 48;

/// Stock level below which an item is reported as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 20;
