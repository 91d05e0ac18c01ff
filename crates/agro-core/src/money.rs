//! # Money Module
//!
//! Provides `Money` for monetary values and `Percent` for discount and tax
//! rates.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  Rounding every intermediate value to paise compounds the error:        │
//! │    discount rounded, then tax on the rounded figure, then again ...    │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, full precision, round on display       │
//! │    1845 × 18 / 100 = 332.1 exactly                                      │
//! │    shown as 332.10, stored as 332.1                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use agro_core::money::{Money, Percent};
//!
//! let price = Money::from_cents(135000); // 1350.00
//! let total = price.multiply_quantity(2);
//! assert_eq!(total.to_string(), "2700.00");
//! assert_eq!(total.grouped(), "2,700.00");
//!
//! let gst = Percent::from_whole(18).of(total);
//! assert_eq!(gst.to_string(), "486.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// Decimal places shown on receipts and screens.
pub const DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the shop currency.
///
/// ## Design Decisions
/// - **Decimal, not cents**: discount and tax percentages produce fractions
///   of a paisa; those are kept until the value is shown
/// - **No currency field**: the shop works in a single currency, the symbol
///   lives in the shop settings
/// - **Display rounds**: `to_string()` gives two places, `amount()` gives
///   the exact value
///
/// ## Where Money is Used
/// ```text
/// InventoryItem.price ──► LineItem.unit_price ──► LineItem.line_total()
///                                                        │
///              subtotal ◄────────────────────────────────┘
///                 │
///                 ├──► discount_amount ──► discounted_subtotal
///                 │                               │
///                 │                 tax_amount ◄──┘
///                 ▼
///            grand_total ──► Bill snapshot ──► receipt "2177.10"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from the smallest currency unit (paise).
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::money::Money;
    ///
    /// let price = Money::from_cents(35000);
    /// assert_eq!(price.to_string(), "350.00");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DISPLAY_DECIMALS))
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(35000);
    /// assert_eq!(unit_price.multiply_quantity(2), Money::from_cents(70000));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Multiplies by a quantity, `None` when the result leaves `Decimal` range.
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Rounds to two decimal places, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let tax = Money::new(Decimal::new(1125, 3)); // 1.125
    /// assert_eq!(tax.rounded(), Money::from_cents(113));
    /// ```
    pub fn rounded(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats with thousands separators, as used in the receipt item table.
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(135000).grouped(), "1,350.00");
    /// assert_eq!(Money::from_cents(35000).grouped(), "350.00");
    /// ```
    pub fn grouped(&self) -> String {
        let plain = self.display_string();
        let (sign, digits) = match plain.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", plain.as_str()),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

        let mut out = String::with_capacity(plain.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{sign}{out}.{fraction}")
    }

    fn display_string(&self) -> String {
        let mut value = self.rounded().0;
        value.rescale(DISPLAY_DECIMALS);
        if value.is_zero() {
            value.set_sign_positive(true);
        }
        value.to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two decimal places, no currency symbol. Honors width and alignment flags.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.display_string())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Percent Type
// =============================================================================

/// A discount or tax rate between 0 and 100 percent.
///
/// Fractional rates are allowed (`2.5`). Displayed without trailing zeros,
/// so a rate entered as `18.0` prints as `18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a rate, rejecting anything outside `0..=100`.
    ///
    /// ## Example
    /// ```rust
    /// use agro_core::money::Percent;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(Percent::new(Decimal::new(25, 1)).is_ok()); // 2.5%
    /// assert!(Percent::new(Decimal::from(101)).is_err());
    /// assert!(Percent::new(Decimal::from(-1)).is_err());
    /// ```
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Percent(value))
    }

    /// Creates a whole-number rate; values above 100 are capped at 100.
    pub fn from_whole(value: u32) -> Self {
        Percent(Decimal::from(value.min(100)))
    }

    /// A rate of zero.
    #[inline]
    pub const fn zero() -> Self {
        Percent(Decimal::ZERO)
    }

    /// Returns the rate as a number of percent (18 for 18%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Applies the rate to an amount: `amount × rate / 100`, unrounded.
    pub fn of(&self, amount: Money) -> Money {
        Money(amount.0 * self.0 / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.normalize().to_string())
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percent::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(rate: Percent) -> Self {
        rate.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
