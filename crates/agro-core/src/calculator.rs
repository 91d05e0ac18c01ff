//! # Bill Calculator
//!
//! Cascading discount-then-tax arithmetic.
//!
//! ```text
//! subtotal            = Σ line_total
//! discount_amount     = subtotal × discount% / 100
//! discounted_subtotal = subtotal − discount_amount
//! tax_amount          = discounted_subtotal × tax% / 100     ◄── post-discount
//! grand_total         = discounted_subtotal + tax_amount
//! ```
//!
//! Nothing is rounded here. Call [`BillCalculation::rounded`] or format the
//! amounts for display.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::{Money, Percent};

/// Totals of one bill, derived from the cart and the two rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillCalculation {
    pub subtotal: Money,
    pub discount_rate: Percent,
    pub discount_amount: Money,
    pub discounted_subtotal: Money,
    pub tax_rate: Percent,
    pub tax_amount: Money,
    pub grand_total: Money,
}

impl BillCalculation {
    /// Every amount rounded to two places, for showing to the user.
    pub fn rounded(&self) -> Self {
        BillCalculation {
            subtotal: self.subtotal.rounded(),
            discount_amount: self.discount_amount.rounded(),
            discounted_subtotal: self.discounted_subtotal.rounded(),
            tax_amount: self.tax_amount.rounded(),
            grand_total: self.grand_total.rounded(),
            ..*self
        }
    }

    /// Whether the receipt prints a discount line.
    pub fn shows_discount(&self) -> bool {
        !self.discount_rate.is_zero()
    }

    /// Whether the receipt prints a tax line.
    pub fn shows_tax(&self) -> bool {
        !self.tax_rate.is_zero()
    }
}

/// Computes the bill totals.
///
/// Pure and idempotent: the cart is only read.
///
/// ## Example
/// ```rust
/// use agro_core::{calculate, Cart, Money, Percent};
///
/// let mut cart = Cart::new();
/// cart.add_custom("Urea", 2, Money::from_cents(35000)).unwrap();
/// cart.add_custom("DAP", 1, Money::from_cents(135000)).unwrap();
///
/// let bill = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
/// assert_eq!(bill.subtotal.to_string(), "2050.00");
/// assert_eq!(bill.discount_amount.to_string(), "205.00");
/// assert_eq!(bill.discounted_subtotal.to_string(), "1845.00");
/// assert_eq!(bill.tax_amount.to_string(), "332.10");
/// assert_eq!(bill.grand_total.to_string(), "2177.10");
/// ```
pub fn calculate(cart: &Cart, discount_rate: Percent, tax_rate: Percent) -> BillCalculation {
    calculate_subtotal(cart.subtotal(), discount_rate, tax_rate)
}

/// Same cascade starting from an already summed subtotal.
pub fn calculate_subtotal(subtotal: Money, discount_rate: Percent, tax_rate: Percent) -> BillCalculation {
    let discount_amount = discount_rate.of(subtotal);
    let discounted_subtotal = subtotal - discount_amount;
    let tax_amount = tax_rate.of(discounted_subtotal);

    BillCalculation {
        subtotal,
        discount_rate,
        discount_amount,
        discounted_subtotal,
        tax_rate,
        tax_amount,
        grand_total: discounted_subtotal + tax_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn shop_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_custom("Urea (46-0-0)", 2, Money::from_cents(35000)).unwrap();
        cart.add_custom("DAP (18-46-0)", 1, Money::from_cents(135000)).unwrap();
        cart
    }

    #[test]
    fn test_discount_then_tax() {
        let bill = calculate(&shop_cart(), Percent::from_whole(10), Percent::from_whole(18));

        assert_eq!(bill.subtotal, Money::from_cents(205000));
        assert_eq!(bill.discount_amount, Money::from_cents(20500));
        assert_eq!(bill.discounted_subtotal, Money::from_cents(184500));
        assert_eq!(bill.tax_amount, Money::from_cents(33210));
        assert_eq!(bill.grand_total, Money::from_cents(217710));
    }

    #[test]
    fn test_tax_is_not_on_raw_subtotal() {
        let bill = calculate(&shop_cart(), Percent::from_whole(10), Percent::from_whole(18));
        let additive = Money::from_cents(205000) - Money::from_cents(20500) + Money::from_cents(36900);
        assert_ne!(bill.grand_total, additive);
    }

    #[test]
    fn test_zero_rates() {
        let bill = calculate(&shop_cart(), Percent::zero(), Percent::zero());
        assert_eq!(bill.grand_total, bill.subtotal);
        assert!(!bill.shows_discount());
        assert!(!bill.shows_tax());
    }

    #[test]
    fn test_largest_accepted_cart_stays_exact() {
        let top_price = Money::new(Decimal::from(crate::MAX_UNIT_PRICE));
        let mut cart = Cart::new();
        for i in 0..crate::MAX_CART_ITEMS {
            cart.add_custom(&format!("Item {i}"), crate::MAX_ITEM_QUANTITY, top_price)
                .unwrap();
        }

        let bill = calculate(&cart, Percent::new(Decimal::new(125, 1)).unwrap(), Percent::from_whole(28));
        let expected_subtotal = Decimal::from(crate::MAX_UNIT_PRICE)
            * Decimal::from(crate::MAX_ITEM_QUANTITY)
            * Decimal::from(crate::MAX_CART_ITEMS as i64);
        assert_eq!(bill.subtotal.amount(), expected_subtotal);
        assert!(bill.grand_total > bill.discounted_subtotal);
    }

    #[test]
    fn test_empty_cart() {
        let bill = calculate(&Cart::new(), Percent::from_whole(10), Percent::from_whole(18));
        assert_eq!(bill.grand_total, Money::zero());
    }

    #[test]
    fn test_full_discount() {
        let bill = calculate(&shop_cart(), Percent::from_whole(100), Percent::from_whole(18));
        assert_eq!(bill.discounted_subtotal, Money::zero());
        assert_eq!(bill.tax_amount, Money::zero());
        assert_eq!(bill.grand_total, Money::zero());
    }

    #[test]
    fn test_precision_kept_until_rounded() {
        let mut cart = Cart::new();
        cart.add_custom("Vermicompost", 3, Money::from_cents(1533)).unwrap();
        let rate = Percent::new(Decimal::new(125, 1)).unwrap(); // 12.5%

        let bill = calculate(&cart, rate, Percent::from_whole(5));
        // 45.99 × 12.5% = 5.74875
        assert_eq!(bill.discount_amount.amount(), Decimal::new(574875, 5));
        assert_eq!(bill.rounded().discount_amount, Money::from_cents(575));
        assert_eq!(bill.rounded().discount_rate, rate);
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let cart = shop_cart();
        let first = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
        let second = calculate(&cart, Percent::from_whole(10), Percent::from_whole(18));
        assert_eq!(first, second);
        assert_eq!(cart, shop_cart());
    }
}
