//! # Cart
//!
//! Ordered collection of line items, one line per distinct item name.
//!
//! ## Merge-on-Duplicate
//! ```text
//! add("Urea", 2, 350.00)        add("Urea", 3, 999.00)
//!        │                              │
//!        ▼                              ▼
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │ Urea   2 × 350.00    │ ───► │ Urea   5 × 350.00    │  quantity accumulates,
//! └──────────────────────┘      └──────────────────────┘  first price is kept
//! ```
//!
//! `line_total` is never stored: it is always `quantity × unit_price`.
//!
//! Every operation validates first and mutates last, so an error leaves the
//! cart exactly as it was.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::InventoryItem;
use crate::validation::{validate_item_name, validate_quantity, validate_unit_price};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One product on the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    name: String,
    quantity: i64,
    unit_price: Money,
}

impl LineItem {
    /// Rebuilds a line from stored values without re-validating them.
    pub(crate) fn restore(name: &str, quantity: i64, unit_price: Money) -> Self {
        LineItem {
            name: name.to_string(),
            quantity,
            unit_price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// `quantity × unit_price`, exact.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The lines of the bill being built at the counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from saved lines, merging any repeated names.
    pub fn from_lines(lines: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            match cart.position(&line.name) {
                Some(index) => cart.items[index].quantity += line.quantity,
                None => cart.items.push(line),
            }
        }
        cart
    }

    /// Adds an ad-hoc item that is not in the inventory.
    ///
    /// ## Rules
    /// - name required
    /// - quantity > 0
    /// - unit price > 0
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::{Cart, Money};
    ///
    /// let mut cart = Cart::new();
    /// cart.add_custom("Spray pump hire", 1, Money::from_cents(15000)).unwrap();
    /// assert!(cart.add_custom("Free sample", 1, Money::zero()).is_err());
    /// ```
    pub fn add_custom(&mut self, name: &str, quantity: i64, unit_price: Money) -> CoreResult<&LineItem> {
        validate_item_name(name)?;
        validate_quantity(quantity)?;
        validate_unit_price(unit_price)?;
        self.merge(name.trim(), quantity, unit_price)
    }

    /// Adds an inventory item at its current price.
    ///
    /// `available` is the stock the counter may still sell. The quantity
    /// already in the cart plus `quantity` must not exceed it.
    ///
    /// ## User Workflow
    /// ```text
    /// stock 100, cart has 60
    ///      │
    ///      ├── add 40 → cart 100            OK
    ///      │
    ///      └── add 41 → InsufficientStock { available: 40, requested: 41 }
    /// ```
    pub fn add_stocked(&mut self, item: &InventoryItem, quantity: i64, available: i64) -> CoreResult<&LineItem> {
        validate_quantity(quantity)?;
        validate_unit_price(item.price)?;

        let in_cart = self.quantity_of(&item.name);
        if in_cart + quantity > available {
            return Err(CoreError::InsufficientStock {
                name: item.name.clone(),
                available: (available - in_cart).max(0),
                requested: quantity,
            });
        }

        self.merge(&item.name, quantity, item.price)
    }

    fn merge(&mut self, name: &str, quantity: i64, unit_price: Money) -> CoreResult<&LineItem> {
        match self.position(name) {
            Some(index) => {
                let merged = self.items[index].quantity + quantity;
                if merged > MAX_ITEM_QUANTITY {
                    return Err(CoreError::QuantityTooLarge {
                        requested: merged,
                        max: MAX_ITEM_QUANTITY,
                    });
                }
                self.items[index].quantity = merged;
                Ok(&self.items[index])
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.items.push(LineItem::restore(name, quantity, unit_price));
                Ok(&self.items[self.items.len() - 1])
            }
        }
    }

    /// Removes the line for `name`.
    ///
    /// Returns `None`, leaving the cart unchanged, when there is no such line.
    pub fn remove(&mut self, name: &str) -> Option<LineItem> {
        self.position(name.trim()).map(|index| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&LineItem> {
        self.position(name).map(|index| &self.items[index])
    }

    /// Quantity of `name` in the cart, 0 when absent.
    pub fn quantity_of(&self, name: &str) -> i64 {
        self.get(name).map_or(0, LineItem::quantity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(LineItem::quantity).sum()
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|line| line.name == name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::Utc;

    fn stocked(name: &str, price_cents: i64, stock: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: format!("id-{name}"),
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock,
            category: None,
            unit: "kg".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_appends_in_order() {
        let urea = stocked("Urea (46-0-0)", 35000, 100);
        let dap = stocked("DAP (18-46-0)", 135000, 80);
        let mut cart = Cart::new();

        cart.add_stocked(&urea, 2, urea.stock).unwrap();
        cart.add_stocked(&dap, 1, dap.stock).unwrap();

        let names: Vec<&str> = cart.items().iter().map(LineItem::name).collect();
        assert_eq!(names, ["Urea (46-0-0)", "DAP (18-46-0)"]);
        assert_eq!(cart.subtotal(), Money::from_cents(205000));
    }

    #[test]
    fn test_duplicate_add_merges_quantity() {
        let urea = stocked("Urea (46-0-0)", 35000, 100);
        let mut cart = Cart::new();

        cart.add_stocked(&urea, 2, urea.stock).unwrap();
        let line = cart.add_stocked(&urea, 3, urea.stock).unwrap();

        assert_eq!(line.quantity(), 5);
        assert_eq!(line.line_total(), Money::from_cents(175000));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_duplicate_add_keeps_first_price() {
        let mut cart = Cart::new();
        cart.add_custom("Bag", 1, Money::from_cents(1000)).unwrap();
        let line = cart.add_custom("Bag", 2, Money::from_cents(9999)).unwrap();

        assert_eq!(line.unit_price(), Money::from_cents(1000));
        assert_eq!(line.line_total(), Money::from_cents(3000));
    }

    #[test]
    fn test_stock_check_counts_cart_quantity() {
        let mop = stocked("MOP (0-0-60)", 85000, 10);
        let mut cart = Cart::new();
        cart.add_stocked(&mop, 6, mop.stock).unwrap();

        let err = cart.add_stocked(&mop, 5, mop.stock).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 4, requested: 5, .. }
        ));
        assert_eq!(cart.quantity_of("MOP (0-0-60)"), 6);

        cart.add_stocked(&mop, 4, mop.stock).unwrap();
        assert_eq!(cart.quantity_of("MOP (0-0-60)"), 10);
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let urea = stocked("Urea (46-0-0)", 35000, 100);
        let mut cart = Cart::new();
        assert!(cart.add_stocked(&urea, 0, 100).is_err());
        assert!(cart.add_stocked(&urea, -3, 100).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_custom_item_validation() {
        let mut cart = Cart::new();
        assert!(cart.add_custom("", 1, Money::from_cents(100)).is_err());
        assert!(cart.add_custom("Twine", 1, Money::zero()).is_err());
        assert!(cart.add_custom("Twine", 0, Money::from_cents(100)).is_err());
        assert!(cart.is_empty());

        cart.add_custom("  Twine  ", 2, Money::from_cents(100)).unwrap();
        assert_eq!(cart.items()[0].name(), "Twine");
    }

    #[test]
    fn test_price_above_limit_rejected() {
        use rust_decimal::Decimal;
        use std::str::FromStr;

        let mut cart = Cart::new();
        let huge = Money::new(Decimal::from_str("79228162514264337593543950335").unwrap());
        let err = cart.add_custom("Bulk order", 2, huge).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        let mut damaged = stocked("Urea (46-0-0)", 0, 100);
        damaged.price = huge;
        assert!(cart.add_stocked(&damaged, 1, damaged.stock).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_cap_applies_to_merged_line() {
        let mut cart = Cart::new();
        cart.add_custom("Compost", MAX_ITEM_QUANTITY, Money::from_cents(100)).unwrap();
        let err = cart.add_custom("Compost", 1, Money::from_cents(100)).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(cart.quantity_of("Compost"), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_line_cap() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_custom(&format!("Item {i}"), 1, Money::from_cents(100)).unwrap();
        }
        let err = cart.add_custom("One more", 1, Money::from_cents(100)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
        // Merging into an existing line is still allowed
        assert!(cart.add_custom("Item 0", 1, Money::from_cents(100)).is_ok());
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add_custom("Zinc Sulphate", 1, Money::from_cents(12000)).unwrap();
        cart.add_custom("Neem Cake", 2, Money::from_cents(2500)).unwrap();

        let removed = cart.remove("Zinc Sulphate").unwrap();
        assert_eq!(removed.quantity(), 1);
        assert_eq!(cart.len(), 1);

        assert!(cart.remove("Zinc Sulphate").is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_custom("Neem Cake", 2, Money::from_cents(2500)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }

    #[test]
    fn test_from_lines_merges() {
        let cart = Cart::from_lines([
            LineItem::restore("Urea", 2, Money::from_cents(35000)),
            LineItem::restore("DAP", 1, Money::from_cents(135000)),
            LineItem::restore("Urea", 1, Money::from_cents(35000)),
        ]);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of("Urea"), 3);
        assert_eq!(cart.total_quantity(), 4);
    }
}
