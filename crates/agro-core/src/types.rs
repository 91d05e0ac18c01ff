//! # Domain Types
//!
//! Records shared between the billing logic, the store and the counter app.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │      Bill       │   │    BillItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name (unique)  │   │  invoice_number │   │  bill_id (FK)   │       │
//! │  │  price, stock   │   │  totals snapshot│   │  name, qty,     │       │
//! │  │  category, unit │   │  payment_method │   │  price, total   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │  ShopSettings   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  name, address  │   │  Cash  Card     │       │
//! │  │  phone (unique) │   │  default_tax    │   │  UPI   Credit   │       │
//! │  └─────────────────┘   │  currency, GST  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every stored entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: item name, customer phone, invoice number

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calculator::{calculate, BillCalculation};
use crate::cart::{Cart, LineItem};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Percent};
use crate::validation;

// =============================================================================
// Inventory
// =============================================================================

/// A product held in the shop's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across the inventory. Also the cart key.
    pub name: String,

    /// Selling price per unit.
    pub price: Money,

    /// Units on hand.
    pub stock: i64,

    /// Nitrogen, Phosphorus, Organic, ...
    pub category: Option<String>,

    /// Unit of sale ("kg", "bag", "litre").
    pub unit: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Checks if the requested quantity is on hand.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Value of the stock on hand at the current price.
    ///
    /// `None` when the product does not fit in a `Decimal`.
    pub fn stock_value(&self) -> Option<Money> {
        self.price.checked_multiply_quantity(self.stock)
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

/// Input for adding an item to the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub category: Option<String>,
    pub unit: String,
    pub description: Option<String>,
}

impl NewInventoryItem {
    /// Default unit when none is given.
    pub const DEFAULT_UNIT: &'static str = "kg";

    /// Checks name, price and opening stock.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_item_name(&self.name)?;
        validation::validate_unit_price(self.price)?;
        validation::validate_stock(self.stock)?;
        Ok(())
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer known to the shop, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Customer fields as typed at the counter.
///
/// Blank fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerDetails {
    pub fn new(name: impl Into<String>) -> Self {
        CustomerDetails {
            name: name.into(),
            phone: None,
            address: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Trims every field and drops the blank ones.
    ///
    /// Returns `None` when no name was entered: a bill without a customer
    /// name carries no customer reference.
    pub fn normalized(&self) -> Option<CustomerDetails> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(CustomerDetails {
            name: name.to_string(),
            phone: clean(&self.phone),
            address: clean(&self.address),
        })
    }
}

impl From<&Customer> for CustomerDetails {
    fn from(customer: &Customer) -> Self {
        CustomerDetails {
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    /// Goods on account, settled later.
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::Credit,
    ];

    /// Label printed on the receipt.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Credit => "Credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "credit" => Ok(PaymentMethod::Credit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.label().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Invoice Number
// =============================================================================

/// Human-readable bill number: `INV-YYYYMMDD-NNNN`.
///
/// `NNNN` is the 1-based sequence of bills issued on that calendar day,
/// zero padded to four digits.
///
/// ## Example
/// ```rust
/// use agro_core::InvoiceNumber;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(InvoiceNumber::new(day, 1).as_str(), "INV-20240115-0001");
/// assert_eq!(InvoiceNumber::new(day, 2).as_str(), "INV-20240115-0002");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    const PREFIX: &'static str = "INV-";

    /// Highest sequence that fits the four-digit field.
    pub const MAX_SEQUENCE: u32 = 9999;

    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        InvoiceNumber(format!("{}{:04}", Self::day_prefix(date), sequence))
    }

    /// The `INV-YYYYMMDD-` prefix shared by every bill of one day.
    pub fn day_prefix(date: NaiveDate) -> String {
        format!("{}{}-", Self::PREFIX, date.format("%Y%m%d"))
    }

    /// Validates an invoice number typed by the user or read from the store.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "invoice number".to_string(),
            reason: reason.to_string(),
        };

        let rest = value
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| invalid("must start with INV-"))?;
        let (date, sequence) = rest
            .split_once('-')
            .ok_or_else(|| invalid("expected INV-YYYYMMDD-NNNN"))?;
        if date.len() != 8 || sequence.len() != 4 {
            return Err(invalid("expected INV-YYYYMMDD-NNNN"));
        }
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid("bad date"))?;
        if !sequence.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("sequence must be digits"));
        }

        Ok(InvoiceNumber(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar day encoded in the number.
    pub fn date(&self) -> Option<NaiveDate> {
        let digits = self.0.get(4..12)?;
        NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
    }

    /// Per-day sequence encoded in the number.
    pub fn sequence(&self) -> Option<u32> {
        self.0.get(13..)?.parse().ok()
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        InvoiceNumber::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.0
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A saved bill header.
///
/// Amounts are the exact calculation snapshot taken at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub invoice_number: InvoiceNumber,
    pub customer_id: Option<String>,
    pub subtotal: Money,
    pub discount_rate: Percent,
    pub discount_amount: Money,
    pub tax_rate: Percent,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    /// Shop-local time the bill was first issued.
    pub created_at: NaiveDateTime,
    /// Shop-local time of the last edit (equals `created_at` if never edited).
    pub updated_at: NaiveDateTime,
}

impl Bill {
    /// Rebuilds the calculation snapshot stored on the header.
    pub fn calculation(&self) -> BillCalculation {
        BillCalculation {
            subtotal: self.subtotal,
            discount_rate: self.discount_rate,
            discount_amount: self.discount_amount,
            discounted_subtotal: self.subtotal - self.discount_amount,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            grand_total: self.total_amount,
        }
    }
}

/// A saved line of a bill.
///
/// Name and price are frozen at save time; later inventory price changes
/// do not touch saved bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub id: String,
    pub bill_id: String,
    /// Position of the line on the bill (0-based).
    pub position: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl BillItem {
    /// Converts back into a cart line, for editing a saved bill.
    pub fn to_line_item(&self) -> LineItem {
        LineItem::restore(&self.item_name, self.quantity, self.unit_price)
    }
}

/// A bill ready to be written: cart lines plus a consistent calculation.
///
/// Built only through [`BillDraft::new`], so the snapshot always matches
/// the lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillDraft {
    lines: Vec<LineItem>,
    calculation: BillCalculation,
    payment_method: PaymentMethod,
    customer: Option<CustomerDetails>,
}

impl BillDraft {
    /// Freezes the cart and rates into a draft.
    ///
    /// ## Errors
    /// `CoreError::EmptyCart` if the cart holds no lines.
    pub fn new(
        cart: &Cart,
        discount_rate: Percent,
        tax_rate: Percent,
        payment_method: PaymentMethod,
        customer: Option<&CustomerDetails>,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        Ok(BillDraft {
            lines: cart.items().to_vec(),
            calculation: calculate(cart, discount_rate, tax_rate),
            payment_method,
            customer: customer.and_then(CustomerDetails::normalized),
        })
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn calculation(&self) -> &BillCalculation {
        &self.calculation
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn customer(&self) -> Option<&CustomerDetails> {
        self.customer.as_ref()
    }
}

// =============================================================================
// Shop Settings
// =============================================================================

/// Shop identity printed on every receipt, plus counter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSettings {
    pub shop_name: String,
    pub shop_address: String,
    pub shop_phone: String,
    /// Tax rate a new bill starts with.
    pub default_tax: Percent,
    /// Currency symbol prefixed to amounts ("Rs.").
    pub currency: String,
    pub gst_number: String,
    pub licence_number: String,
}

impl ShopSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.shop_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "shop name".to_string(),
            });
        }
        if self.currency.chars().count() > 5 {
            return Err(ValidationError::TooLong {
                field: "currency".to_string(),
                max: 5,
            });
        }
        Ok(())
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            shop_name: "Green Valley Fertilizers".to_string(),
            shop_address: "123 Farm Road, City".to_string(),
            shop_phone: "+91 9876543210".to_string(),
            default_tax: Percent::from_whole(18),
            currency: "Rs.".to_string(),
            gst_number: String::new(),
            licence_number: String::new(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
