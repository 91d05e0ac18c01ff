//! # Inventory Commands
//!
//! Stock list, search and maintenance. Items are addressed by name, the
//! same way the counter adds them to a bill.

use agro_core::validation::{parse_price, parse_quantity, validate_search_query};
use agro_core::{CoreError, InventoryItem, NewInventoryItem, ValidationError};
use agro_db::{Database, InventorySummary};
use tracing::{debug, info};

use crate::error::ApiResult;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Lists every item, by name.
pub async fn list_inventory(db: &Database) -> ApiResult<Vec<InventoryItem>> {
    debug!("list_inventory command");
    Ok(db.inventory().list().await?)
}

/// Finds items whose name contains `query`.
///
/// ## Example
/// ```text
/// search urea  → [Urea (46-0-0)]
/// search ""    → VALIDATION_ERROR
/// ```
pub async fn search_inventory(db: &Database, query: &str) -> ApiResult<Vec<InventoryItem>> {
    debug!(query = %query, "search_inventory command");
    let query = validate_search_query(query)?;
    Ok(db.inventory().search(&query, DEFAULT_SEARCH_LIMIT).await?)
}

/// Adds a new item to the catalogue.
pub async fn add_inventory_item(
    db: &Database,
    name: &str,
    price: &str,
    stock: &str,
    category: Option<&str>,
    unit: Option<&str>,
) -> ApiResult<InventoryItem> {
    debug!(name = %name, price = %price, stock = %stock, "add_inventory_item command");

    let item = NewInventoryItem {
        name: name.to_string(),
        price: parse_price(price)?,
        stock: parse_stock(stock)?,
        category: category.map(str::to_string),
        unit: unit
            .unwrap_or(NewInventoryItem::DEFAULT_UNIT)
            .to_string(),
        description: None,
    };

    let created = db.inventory().insert(&item).await?;
    info!(name = %created.name, stock = created.stock, "Inventory item added");
    Ok(created)
}

/// Sets a new price and adds stock in one step.
pub async fn restock_item(
    db: &Database,
    name: &str,
    price: &str,
    add_stock: &str,
) -> ApiResult<InventoryItem> {
    debug!(name = %name, price = %price, add = %add_stock, "restock_item command");

    let price = parse_price(price)?;
    let add_stock = parse_stock(add_stock)?;
    let item = find(db, name).await?;

    Ok(db
        .inventory()
        .update_price_and_restock(&item.id, price, add_stock)
        .await?)
}

/// Adds units to an item's stock.
pub async fn add_stock(db: &Database, name: &str, quantity: &str) -> ApiResult<InventoryItem> {
    debug!(name = %name, quantity = %quantity, "add_stock command");
    let quantity = parse_quantity(quantity)?;
    let item = find(db, name).await?;
    db.inventory().add_stock(&item.id, quantity).await?;
    find(db, &item.name).await
}

/// Takes units out of stock (damaged, returned to supplier).
///
/// Refused when the item holds fewer units than `quantity`.
pub async fn decrease_stock(db: &Database, name: &str, quantity: &str) -> ApiResult<InventoryItem> {
    debug!(name = %name, quantity = %quantity, "decrease_stock command");
    let quantity = parse_quantity(quantity)?;
    let item = find(db, name).await?;
    db.inventory().decrease_stock(&item.id, quantity).await?;
    find(db, &item.name).await
}

/// Deletes an item from the catalogue. Saved bills keep their lines.
pub async fn delete_item(db: &Database, name: &str) -> ApiResult<InventoryItem> {
    debug!(name = %name, "delete_item command");
    let item = find(db, name).await?;
    db.inventory().delete(&item.id).await?;
    info!(name = %item.name, "Inventory item deleted");
    Ok(item)
}

/// Items with stock below `threshold`, lowest first.
pub async fn low_stock(db: &Database, threshold: i64) -> ApiResult<Vec<InventoryItem>> {
    debug!(threshold, "low_stock command");
    Ok(db.inventory().low_stock(threshold).await?)
}

/// Item count, units and value of the stock on hand.
pub async fn inventory_summary(db: &Database, threshold: i64) -> ApiResult<InventorySummary> {
    debug!(threshold, "inventory_summary command");
    Ok(db.inventory().summary(threshold).await?)
}

async fn find(db: &Database, name: &str) -> ApiResult<InventoryItem> {
    db.inventory()
        .get_by_name(name)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(name.trim().to_string()).into())
}

/// Stock figures are whole units and may be zero.
fn parse_stock(text: &str) -> Result<i64, ValidationError> {
    let stock = text
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field: "stock".to_string(),
            value: text.trim().to_string(),
        })?;
    agro_core::validation::validate_stock(stock)?;
    Ok(stock)
}
