//! # Billing Session
//!
//! Everything the counter holds between commands: the cart being built, the
//! two rates, payment method, customer details and whether a saved bill is
//! being edited.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Lifecycle                                    │
//! │                                                                         │
//! │  ┌──────────┐  add / remove   ┌──────────┐   save ok    ┌──────────┐   │
//! │  │  Empty   │───────────────►│ Building │─────────────►│  Empty   │   │
//! │  │  (new)   │                 │          │              │  (new)   │   │
//! │  └──────────┘                 └──────────┘              └──────────┘   │
//! │       ▲                            │  ▲                                  │
//! │       │                  save fails│  │                                  │
//! │       │                 (unchanged)└──┘                                  │
//! │       │                                                                  │
//! │       │ new_bill        ┌──────────┐  load INV-..                        │
//! │       └─────────────────│ Editing  │◄─────────── (any state)             │
//! │                         │ INV-..   │                                     │
//! │                         └──────────┘                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use agro_core::{
    calculate, BillCalculation, BillDraft, Cart, CoreResult, CustomerDetails, InventoryItem,
    InvoiceNumber, LineItem, Money, Percent, PaymentMethod,
};
use agro_db::LoadedBill;
use chrono::NaiveDateTime;
use serde::Serialize;

/// The saved bill currently loaded into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditingBill {
    pub invoice_number: InvoiceNumber,
    /// When the bill was first issued. Printed on previews while editing.
    pub issued_at: NaiveDateTime,
    /// Quantity per item name as saved. These units go back into stock when
    /// the edit is saved, so the counter may sell them again.
    pub original_quantities: HashMap<String, i64>,
}

/// The bill being built at the counter.
#[derive(Debug, Clone)]
pub struct BillingSession {
    cart: Cart,
    discount_rate: Percent,
    tax_rate: Percent,
    payment_method: PaymentMethod,
    customer: CustomerDetails,
    editing: Option<EditingBill>,
    default_tax: Percent,
    default_payment: PaymentMethod,
}

impl BillingSession {
    /// Creates an empty session with the shop's default tax and payment.
    pub fn new(default_tax: Percent, default_payment: PaymentMethod) -> Self {
        BillingSession {
            cart: Cart::new(),
            discount_rate: Percent::zero(),
            tax_rate: default_tax,
            payment_method: default_payment,
            customer: CustomerDetails::default(),
            editing: None,
            default_tax,
            default_payment,
        }
    }

    /// Drops everything and starts a fresh bill.
    pub fn new_bill(&mut self) {
        *self = BillingSession::new(self.default_tax, self.default_payment);
    }

    /// Changes the tax a new bill starts with. The current bill keeps its rate.
    pub fn set_default_tax(&mut self, tax: Percent) {
        self.default_tax = tax;
    }

    // =========================================================================
    // Cart
    // =========================================================================

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Stock the counter may still sell of `item`.
    ///
    /// While editing, the quantity the saved bill already holds counts as
    /// available.
    pub fn available_for(&self, item: &InventoryItem) -> i64 {
        let held = self
            .editing
            .as_ref()
            .and_then(|e| e.original_quantities.get(&item.name))
            .copied()
            .unwrap_or(0);
        item.stock + held
    }

    pub fn add_stocked(&mut self, item: &InventoryItem, quantity: i64) -> CoreResult<LineItem> {
        let available = self.available_for(item);
        self.cart.add_stocked(item, quantity, available).cloned()
    }

    pub fn add_custom(&mut self, name: &str, quantity: i64, unit_price: Money) -> CoreResult<LineItem> {
        self.cart.add_custom(name, quantity, unit_price).cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<LineItem> {
        self.cart.remove(name)
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    // =========================================================================
    // Bill fields
    // =========================================================================

    pub fn discount_rate(&self) -> Percent {
        self.discount_rate
    }

    pub fn set_discount_rate(&mut self, rate: Percent) {
        self.discount_rate = rate;
    }

    pub fn tax_rate(&self) -> Percent {
        self.tax_rate
    }

    pub fn set_tax_rate(&mut self, rate: Percent) {
        self.tax_rate = rate;
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn set_customer(&mut self, customer: CustomerDetails) {
        self.customer = customer;
    }

    pub fn editing(&self) -> Option<&EditingBill> {
        self.editing.as_ref()
    }

    /// Totals of the current cart and rates, unrounded.
    pub fn calculation(&self) -> BillCalculation {
        calculate(&self.cart, self.discount_rate, self.tax_rate)
    }

    /// Freezes the session into a draft for saving.
    pub fn draft(&self) -> CoreResult<BillDraft> {
        BillDraft::new(
            &self.cart,
            self.discount_rate,
            self.tax_rate,
            self.payment_method,
            Some(&self.customer),
        )
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Replaces the session with a saved bill.
    pub fn begin_edit(&mut self, loaded: &LoadedBill) {
        let mut original_quantities = HashMap::new();
        for item in &loaded.items {
            *original_quantities.entry(item.item_name.clone()).or_insert(0) += item.quantity;
        }

        self.cart = Cart::from_lines(loaded.items.iter().map(|i| i.to_line_item()));
        self.discount_rate = loaded.bill.discount_rate;
        self.tax_rate = loaded.bill.tax_rate;
        self.payment_method = loaded.bill.payment_method;
        self.customer = loaded
            .customer
            .as_ref()
            .map(CustomerDetails::from)
            .unwrap_or_default();
        self.editing = Some(EditingBill {
            invoice_number: loaded.bill.invoice_number.clone(),
            issued_at: loaded.bill.created_at,
            original_quantities,
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::{Bill, BillItem, CoreError, Customer};
    use chrono::{NaiveDate, Utc};

    fn session() -> BillingSession {
        BillingSession::new(Percent::from_whole(18), PaymentMethod::Cash)
    }

    fn urea(stock: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: "urea".to_string(),
            name: "Urea (46-0-0)".to_string(),
            price: Money::from_cents(35000),
            stock,
            category: None,
            unit: "kg".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn loaded_bill() -> LoadedBill {
        let at = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        LoadedBill {
            bill: Bill {
                id: "bill-1".to_string(),
                invoice_number: InvoiceNumber::new(at.date(), 1),
                customer_id: Some("cust-1".to_string()),
                subtotal: Money::from_cents(70000),
                discount_rate: Percent::from_whole(10),
                discount_amount: Money::from_cents(7000),
                tax_rate: Percent::from_whole(5),
                tax_amount: Money::from_cents(3150),
                total_amount: Money::from_cents(66150),
                payment_method: PaymentMethod::Upi,
                created_at: at,
                updated_at: at,
            },
            items: vec![BillItem {
                id: "line-1".to_string(),
                bill_id: "bill-1".to_string(),
                position: 0,
                item_name: "Urea (46-0-0)".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(35000),
                line_total: Money::from_cents(70000),
            }],
            customer: Some(Customer {
                id: "cust-1".to_string(),
                name: "Ramesh Kumar".to_string(),
                phone: Some("9812345678".to_string()),
                address: None,
                created_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = session();
        assert!(session.cart().is_empty());
        assert_eq!(session.tax_rate(), Percent::from_whole(18));
        assert!(session.discount_rate().is_zero());
        assert_eq!(session.payment_method(), PaymentMethod::Cash);
        assert!(session.editing().is_none());
    }

    #[test]
    fn test_begin_edit_loads_bill() {
        let mut session = session();
        session.begin_edit(&loaded_bill());

        assert_eq!(session.cart().quantity_of("Urea (46-0-0)"), 2);
        assert_eq!(session.discount_rate(), Percent::from_whole(10));
        assert_eq!(session.tax_rate(), Percent::from_whole(5));
        assert_eq!(session.payment_method(), PaymentMethod::Upi);
        assert_eq!(session.customer().name, "Ramesh Kumar");
        assert_eq!(
            session.editing().unwrap().invoice_number.as_str(),
            "INV-20240115-0001"
        );
        assert_eq!(session.calculation().grand_total, Money::from_cents(66150));
    }

    #[test]
    fn test_editing_counts_original_quantity_as_available() {
        let mut session = session();
        session.begin_edit(&loaded_bill());

        // Stock shows 1 left, but the bill being edited already holds 2.
        let item = urea(1);
        assert_eq!(session.available_for(&item), 3);
        session.add_stocked(&item, 1).unwrap();
        assert_eq!(session.cart().quantity_of("Urea (46-0-0)"), 3);

        let err = session.add_stocked(&item, 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
    }

    #[test]
    fn test_new_bill_resets_everything() {
        let mut session = session();
        session.begin_edit(&loaded_bill());
        session.set_default_tax(Percent::from_whole(12));

        session.new_bill();

        assert!(session.cart().is_empty());
        assert!(session.editing().is_none());
        assert_eq!(session.tax_rate(), Percent::from_whole(12));
        assert_eq!(session.payment_method(), PaymentMethod::Cash);
        assert_eq!(session.customer(), &CustomerDetails::default());
    }

    #[test]
    fn test_draft_needs_lines() {
        let mut session = session();
        assert!(matches!(session.draft(), Err(CoreError::EmptyCart)));

        session.add_custom("Twine", 1, Money::from_cents(500)).unwrap();
        let draft = session.draft().unwrap();
        assert!(draft.customer().is_none());
    }
}
