//! # Cart Commands
//!
//! Commands that change the bill being built: lines, rates, payment method
//! and customer.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Preview  │────►│  Saved   │       │
//! │  │  Cart    │     │          │     │ receipt  │     │  Bill    │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                  │             │
//! │              add_catalog_item                        save_bill         │
//! │              add_custom_item                         (bill.rs)         │
//! │              remove_item                                  │             │
//! │              set_discount / set_tax                       ▼             │
//! │                        │                            session reset      │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numeric arguments arrive as typed text and are parsed here, so a bad
//! entry is rejected before the session changes.

use agro_core::validation::{parse_price, parse_quantity, parse_rate};
use agro_core::{CoreError, CustomerDetails, InvoiceNumber, LineItem, Money, Percent, PaymentMethod};
use agro_db::Database;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::BillingSession;

/// One cart line as shown at the counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&LineItem> for CartLineView {
    fn from(line: &LineItem) -> Self {
        CartLineView {
            name: line.name().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
            line_total: line.line_total().rounded(),
        }
    }
}

/// Cart response including lines, rates and rounded totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
    pub discount_rate: Percent,
    pub discount_amount: Money,
    pub tax_rate: Percent,
    pub tax_amount: Money,
    pub grand_total: Money,
    pub payment_method: PaymentMethod,
    pub customer: CustomerDetails,
    /// Invoice number of the saved bill being edited, if any.
    pub editing: Option<InvoiceNumber>,
}

impl From<&BillingSession> for CartView {
    fn from(session: &BillingSession) -> Self {
        let totals = session.calculation().rounded();
        CartView {
            lines: session.cart().items().iter().map(CartLineView::from).collect(),
            subtotal: totals.subtotal,
            discount_rate: totals.discount_rate,
            discount_amount: totals.discount_amount,
            tax_rate: totals.tax_rate,
            tax_amount: totals.tax_amount,
            grand_total: totals.grand_total,
            payment_method: session.payment_method(),
            customer: session.customer().clone(),
            editing: session.editing().map(|e| e.invoice_number.clone()),
        }
    }
}

/// Response of [`remove_item`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    /// The removed line, `None` if the name was not in the cart.
    pub removed: Option<CartLineView>,
    pub cart: CartView,
}

/// Response of [`set_customer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub customer: CustomerDetails,
    /// True when the phone belongs to a saved customer and blank fields
    /// were filled from that record.
    pub known: bool,
}

/// Gets the current cart contents.
///
/// ## Returns
/// Current lines with rounded totals
pub fn get_cart(session: &BillingSession) -> CartView {
    debug!("get_cart command");
    CartView::from(session)
}

/// Adds an inventory item to the cart.
///
/// ## Behavior
/// - If the item is already in the cart: quantity increases
/// - If not: added as a new line at the current inventory price
/// - Quantity already in the cart plus `quantity` may not exceed stock
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  add "Urea (46-0-0)" 2                                                 │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  ┌────────────────────────────────────────────────────────────────┐    │
/// │  │  1. Parse quantity ("2" → 2, "abc" → VALIDATION_ERROR)         │    │
/// │  │  2. Look the item up by name (NOT_FOUND if absent)             │    │
/// │  │  3. Check stock (+ quantity held by a bill being edited)       │    │
/// │  │  4. Merge into an existing line or append a new one            │    │
/// │  └────────────────────────────────────────────────────────────────┘    │
/// │                    │                                                    │
/// │                    ▼                                                    │
/// │  Updated cart                                                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn add_catalog_item(
    db: &Database,
    session: &mut BillingSession,
    name: &str,
    quantity: &str,
) -> ApiResult<CartView> {
    debug!(name = %name, quantity = %quantity, "add_catalog_item command");

    let quantity = parse_quantity(quantity)?;
    let item = db
        .inventory()
        .get_by_name(name)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(name.trim().to_string()))?;

    let line = session.add_stocked(&item, quantity)?;
    debug!(name = %line.name(), quantity = line.quantity(), "Cart line updated");

    Ok(CartView::from(&*session))
}

/// Adds an item that is not in the inventory.
///
/// Custom lines never touch stock.
pub fn add_custom_item(
    session: &mut BillingSession,
    name: &str,
    quantity: &str,
    unit_price: &str,
) -> ApiResult<CartView> {
    debug!(name = %name, quantity = %quantity, price = %unit_price, "add_custom_item command");

    let quantity = parse_quantity(quantity)?;
    let price = parse_price(unit_price)?;
    session.add_custom(name, quantity, price)?;

    Ok(CartView::from(&*session))
}

/// Removes the line with the given name.
///
/// Removing a name that is not in the cart changes nothing and is only
/// logged.
pub fn remove_item(session: &mut BillingSession, name: &str) -> RemoveResponse {
    debug!(name = %name, "remove_item command");

    let removed = session.remove(name.trim());
    if removed.is_none() {
        warn!(name = %name, "Remove requested for a line not in the cart");
    }

    RemoveResponse {
        removed: removed.as_ref().map(CartLineView::from),
        cart: CartView::from(&*session),
    }
}

/// Empties the cart. Rates, payment method and customer stay.
pub fn clear_cart(session: &mut BillingSession) -> CartView {
    debug!("clear_cart command");
    session.clear_cart();
    CartView::from(&*session)
}

/// Starts a fresh bill, leaving edit mode.
pub fn new_bill(session: &mut BillingSession) -> CartView {
    debug!("new_bill command");
    session.new_bill();
    CartView::from(&*session)
}

/// Sets the discount rate in percent.
pub fn set_discount(session: &mut BillingSession, rate: &str) -> ApiResult<CartView> {
    debug!(rate = %rate, "set_discount command");
    session.set_discount_rate(parse_rate("discount", rate)?);
    Ok(CartView::from(&*session))
}

/// Sets the tax rate in percent.
pub fn set_tax(session: &mut BillingSession, rate: &str) -> ApiResult<CartView> {
    debug!(rate = %rate, "set_tax command");
    session.set_tax_rate(parse_rate("tax", rate)?);
    Ok(CartView::from(&*session))
}

/// Sets the payment method (cash, card, upi, credit).
pub fn set_payment_method(session: &mut BillingSession, method: &str) -> ApiResult<CartView> {
    debug!(method = %method, "set_payment_method command");
    session.set_payment_method(method.parse()?);
    Ok(CartView::from(&*session))
}

/// Sets the customer for the bill.
///
/// ## Behavior
/// When the phone belongs to a saved customer, a blank name or address is
/// filled in from that customer.
///
/// ```text
/// set customer "" 9812345678
///      │
///      ▼
/// customers: 9812345678 → Ramesh Kumar, Village Rampur
///      │
///      ▼
/// session customer = Ramesh Kumar / 9812345678 / Village Rampur
/// ```
pub async fn set_customer(
    db: &Database,
    session: &mut BillingSession,
    name: &str,
    phone: Option<&str>,
    address: Option<&str>,
) -> ApiResult<CustomerResponse> {
    debug!(name = %name, phone = ?phone, "set_customer command");

    let mut details = CustomerDetails {
        name: name.trim().to_string(),
        phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
        address: address.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
    };

    let existing = match details.phone.as_deref() {
        Some(phone) => db.customers().find_by_phone(phone).await?,
        None => None,
    };

    if let Some(customer) = &existing {
        info!(phone = ?customer.phone, name = %customer.name, "Known customer");
        if details.name.is_empty() {
            details.name = customer.name.clone();
        }
        if details.address.is_none() {
            details.address = customer.address.clone();
        }
    }

    if details.name.is_empty() && details.phone.is_some() {
        return Err(ApiError::validation("Customer name is required"));
    }

    session.set_customer(details.clone());

    Ok(CustomerResponse {
        customer: details,
        known: existing.is_some(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use agro_core::NewInventoryItem;
    use agro_db::DbConfig;

    async fn setup() -> (Database, BillingSession) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.inventory()
            .insert(&NewInventoryItem {
                name: "Urea (46-0-0)".to_string(),
                price: Money::from_cents(35000),
                stock: 5,
                category: Some("Nitrogen".to_string()),
                unit: "kg".to_string(),
                description: None,
            })
            .await
            .unwrap();
        (db, BillingSession::new(Percent::from_whole(18), PaymentMethod::Cash))
    }

    #[tokio::test]
    async fn test_add_catalog_item_merges() {
        let (db, mut session) = setup().await;

        add_catalog_item(&db, &mut session, "Urea (46-0-0)", "2").await.unwrap();
        let view = add_catalog_item(&db, &mut session, "Urea (46-0-0)", "1").await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
        assert_eq!(view.subtotal, Money::from_cents(105000));
        // 1050 + 18% = 1239
        assert_eq!(view.grand_total, Money::from_cents(123900));
    }

    #[tokio::test]
    async fn test_add_catalog_item_checks_stock() {
        let (db, mut session) = setup().await;
        add_catalog_item(&db, &mut session, "Urea (46-0-0)", "4").await.unwrap();

        let err = add_catalog_item(&db, &mut session, "Urea (46-0-0)", "2")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(session.cart().quantity_of("Urea (46-0-0)"), 4);
    }

    #[tokio::test]
    async fn test_add_unknown_item() {
        let (db, mut session) = setup().await;
        let err = add_catalog_item(&db, &mut session, "Gypsum", "1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_bad_quantity_rejected() {
        let (db, mut session) = setup().await;
        let err = add_catalog_item(&db, &mut session, "Urea (46-0-0)", "two")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_custom_item_and_remove() {
        let mut session = BillingSession::new(Percent::zero(), PaymentMethod::Cash);
        add_custom_item(&mut session, "Sprayer hire", "1", "150").unwrap();

        let missing = remove_item(&mut session, "Tractor");
        assert!(missing.removed.is_none());
        assert_eq!(missing.cart.lines.len(), 1);

        let removed = remove_item(&mut session, "Sprayer hire");
        assert_eq!(removed.removed.unwrap().line_total, Money::from_cents(15000));
        assert!(removed.cart.lines.is_empty());
    }

    #[test]
    fn test_custom_item_needs_positive_price() {
        let mut session = BillingSession::new(Percent::zero(), PaymentMethod::Cash);
        let err = add_custom_item(&mut session, "Twine", "1", "0").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_rates_and_payment() {
        let mut session = BillingSession::new(Percent::from_whole(18), PaymentMethod::Cash);
        add_custom_item(&mut session, "Twine", "2", "100").unwrap();

        set_discount(&mut session, "10").unwrap();
        set_tax(&mut session, "5%").unwrap();
        let view = set_payment_method(&mut session, "UPI").unwrap();

        // 200 - 20 = 180, + 9 = 189
        assert_eq!(view.grand_total, Money::from_cents(18900));
        assert_eq!(view.payment_method, PaymentMethod::Upi);

        assert!(set_tax(&mut session, "120").is_err());
        assert!(set_payment_method(&mut session, "cheque").is_err());
        assert_eq!(session.tax_rate(), Percent::from_whole(5));
    }

    #[test]
    fn test_clear_keeps_rates() {
        let mut session = BillingSession::new(Percent::from_whole(18), PaymentMethod::Cash);
        add_custom_item(&mut session, "Twine", "2", "100").unwrap();
        set_discount(&mut session, "10").unwrap();

        let view = clear_cart(&mut session);
        assert!(view.lines.is_empty());
        assert_eq!(view.discount_rate, Percent::from_whole(10));

        let view = new_bill(&mut session);
        assert!(view.discount_rate.is_zero());
    }

    #[tokio::test]
    async fn test_set_customer_fills_from_phone() {
        let (db, mut session) = setup().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            agro_db::CustomerRepository::resolve_in(
                &mut conn,
                &CustomerDetails::new("Ramesh Kumar")
                    .with_phone("9812345678")
                    .with_address("Village Rampur"),
            )
            .await
            .unwrap();
        }

        let response = set_customer(&db, &mut session, "", Some("9812345678"), None)
            .await
            .unwrap();

        assert!(response.known);
        assert_eq!(session.customer().name, "Ramesh Kumar");
        assert_eq!(session.customer().address.as_deref(), Some("Village Rampur"));
    }

    #[tokio::test]
    async fn test_set_customer_unknown_phone_needs_name() {
        let (db, mut session) = setup().await;
        let err = set_customer(&db, &mut session, " ", Some("9000000000"), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let ok = set_customer(&db, &mut session, "Sita", Some("9000000000"), None)
            .await
            .unwrap();
        assert!(!ok.known);
    }
}
