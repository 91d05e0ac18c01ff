//! # Inventory Repository
//!
//! Database operations for the shop catalogue and its stock levels.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Changes Stock                                    │
//! │                                                                         │
//! │  Shop keeper                          Bill reconciler (transaction)     │
//! │  ───────────                          ─────────────────────────────     │
//! │  add_stock        stock + n           save    stock - qty per line      │
//! │  decrease_stock   stock - n           edit    + old lines, - new lines  │
//! │                   (only if stock ≥ n) delete  + qty per line            │
//! │                                                                         │
//! │  Every change is a delta (stock = stock ± n), never an absolute set.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use agro_core::validation::{validate_search_query, validate_stock, validate_unit_price};
use agro_core::{CoreError, InventoryItem, Money, NewInventoryItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, money_text, parse_money};
use crate::error::{DbError, DbResult};

const SELECT_COLUMNS: &str =
    "SELECT id, name, price, stock, category, unit, description, created_at, updated_at FROM inventory";

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: String,
    name: String,
    price: String,
    stock: i64,
    category: Option<String>,
    unit: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> DbResult<Self> {
        Ok(InventoryItem {
            price: parse_money("inventory.price", &row.price)?,
            id: row.id,
            name: row.name,
            stock: row.stock,
            category: row.category,
            unit: row.unit,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_items(rows: Vec<InventoryRow>) -> DbResult<Vec<InventoryItem>> {
    rows.into_iter().map(InventoryItem::try_from).collect()
}

/// Totals shown under the inventory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub item_count: i64,
    pub units_in_stock: i64,
    /// Σ price × stock
    pub stock_value: Money,
    pub low_stock_count: i64,
}

/// Repository for inventory database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = InventoryRepository::new(pool);
///
/// let urea = repo.get_by_name("Urea (46-0-0)").await?;
/// repo.add_stock(&urea.unwrap().id, 50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// All items ordered by name.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let rows: Vec<InventoryRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;
        into_items(rows)
    }

    /// Items whose name contains `query` (case-insensitive for ASCII).
    ///
    /// An empty query returns the first `limit` items.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        let pattern = format!("%{}%", query.replace('%', "").replace('_', ""));

        debug!(query = %query, limit = limit, "Searching inventory");

        let rows: Vec<InventoryRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE name LIKE ?1 ORDER BY name LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        into_items(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let row: Option<InventoryRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(InventoryItem::try_from).transpose()
    }

    /// Looks an item up by its exact name (the cart key).
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<InventoryItem>> {
        let row: Option<InventoryRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE name = ?1"))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(InventoryItem::try_from).transpose()
    }

    /// Adds a new item to the catalogue.
    ///
    /// ## Returns
    /// * `Ok(InventoryItem)` - The stored item
    /// * `Err(DbError::UniqueViolation)` - Name already in the catalogue
    /// * `Err(DbError::Domain)` - Blank name, price ≤ 0, negative stock
    pub async fn insert(&self, item: &NewInventoryItem) -> DbResult<InventoryItem> {
        item.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let stored = InventoryItem {
            id: generate_id(),
            name: item.name.trim().to_string(),
            price: item.price,
            stock: item.stock,
            category: item.category.clone().filter(|c| !c.trim().is_empty()),
            unit: if item.unit.trim().is_empty() {
                NewInventoryItem::DEFAULT_UNIT.to_string()
            } else {
                item.unit.trim().to_string()
            },
            description: item.description.clone().filter(|d| !d.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        debug!(name = %stored.name, "Inserting inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, name, price, stock, category, unit, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.name)
        .bind(money_text(stored.price))
        .bind(stored.stock)
        .bind(&stored.category)
        .bind(&stored.unit)
        .bind(&stored.description)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &stored.name),
            other => other,
        })?;

        info!(name = %stored.name, stock = stored.stock, "Inventory item added");
        Ok(stored)
    }

    /// Sets a new price and adds `add_stock` units in one statement.
    pub async fn update_price_and_restock(
        &self,
        id: &str,
        price: Money,
        add_stock: i64,
    ) -> DbResult<InventoryItem> {
        validate_unit_price(price).map_err(CoreError::from)?;
        validate_stock(add_stock).map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE inventory SET price = ?2, stock = stock + ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(money_text(price))
        .bind(add_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        info!(id = %id, price = %price, added = add_stock, "Inventory price updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory item", id))
    }

    /// Adds units to an item's stock.
    pub async fn add_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        if quantity <= 0 {
            return Err(CoreError::from(agro_core::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })
            .into());
        }
        validate_stock(quantity).map_err(CoreError::from)?;

        let result = sqlx::query("UPDATE inventory SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        info!(id = %id, quantity = quantity, "Stock added");
        Ok(())
    }

    /// Removes units from an item's stock (damaged bags, returns to supplier).
    ///
    /// Refuses to go below zero.
    pub async fn decrease_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        if quantity <= 0 {
            return Err(CoreError::from(agro_core::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })
            .into());
        }

        let result = sqlx::query(
            "UPDATE inventory SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let item = self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Inventory item", id))?;
            return Err(CoreError::InsufficientStock {
                name: item.name,
                available: item.stock,
                requested: quantity,
            }
            .into());
        }

        info!(id = %id, quantity = quantity, "Stock decreased");
        Ok(())
    }

    /// Deletes an item. Saved bills keep their own copy of the name and price.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        info!(id = %id, "Inventory item deleted");
        Ok(())
    }

    /// Items with stock below `threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<InventoryItem>> {
        let rows: Vec<InventoryRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE stock < ?1 ORDER BY stock, name"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        into_items(rows)
    }

    /// Item count, units on hand and stock value.
    pub async fn summary(&self, low_stock_threshold: i64) -> DbResult<InventorySummary> {
        let items = self.list().await?;
        let stock_value = items
            .iter()
            .try_fold(Money::zero(), |total, item| {
                item.stock_value().and_then(|value| total.checked_add(value))
            })
            .ok_or_else(|| DbError::invalid_data("inventory.stock", "stock value out of range"))?;

        Ok(InventorySummary {
            item_count: items.len() as i64,
            units_in_stock: items.iter().map(|i| i.stock).sum(),
            stock_value,
            low_stock_count: items
                .iter()
                .filter(|i| i.is_low_stock(low_stock_threshold))
                .count() as i64,
        })
    }

    /// Counts catalogue items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Transaction helpers
    // =========================================================================

    /// Applies a stock delta by item name on a borrowed connection.
    ///
    /// No lower bound is enforced. Returns `false` when no inventory item has
    /// that name (ad-hoc lines, or an item deleted since the bill was saved).
    pub async fn adjust_stock_in(conn: &mut SqliteConnection, name: &str, delta: i64) -> DbResult<bool> {
        let result = sqlx::query("UPDATE inventory SET stock = stock + ?2, updated_at = ?3 WHERE name = ?1")
            .bind(name)
            .bind(delta)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        let matched = result.rows_affected() > 0;
        debug!(name = %name, delta = delta, matched = matched, "Stock adjusted");
        Ok(matched)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_item(name: &str, price_cents: i64, stock: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            stock,
            category: Some("Nitrogen".to_string()),
            unit: String::new(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = setup().await;
        let repo = db.inventory();

        let stored = repo.insert(&new_item("Urea (46-0-0)", 35000, 100)).await.unwrap();
        assert_eq!(stored.unit, "kg");

        let found = repo.get_by_name("Urea (46-0-0)").await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert_eq!(found.price, Money::from_cents(35000));
        assert_eq!(found.stock, 100);
        assert!(repo.get_by_name("Urea").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = setup().await;
        let repo = db.inventory();
        repo.insert(&new_item("DAP (18-46-0)", 135000, 80)).await.unwrap();

        let err = repo.insert(&new_item("DAP (18-46-0)", 1, 1)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "DAP (18-46-0)"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_item_rejected() {
        let db = setup().await;
        let err = db.inventory().insert(&new_item("Free", 0, 10)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
        assert_eq!(db.inventory().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_and_list_order() {
        let db = setup().await;
        let repo = db.inventory();
        repo.insert(&new_item("Vermicompost", 1500, 150)).await.unwrap();
        repo.insert(&new_item("Organic Compost", 20000, 200)).await.unwrap();
        repo.insert(&new_item("Urea (46-0-0)", 35000, 100)).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["Organic Compost", "Urea (46-0-0)", "Vermicompost"]);

        let hits = repo.search("compost", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_update_price_and_restock() {
        let db = setup().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("MOP (0-0-60)", 85000, 60)).await.unwrap();

        let updated = repo
            .update_price_and_restock(&item.id, Money::from_cents(90000), 15)
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_cents(90000));
        assert_eq!(updated.stock, 75);
    }

    #[tokio::test]
    async fn test_decrease_stock_guarded() {
        let db = setup().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Zinc Sulphate", 12000, 5)).await.unwrap();

        let err = repo.decrease_stock(&item.id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 5, requested: 6, .. })
        ));

        repo.decrease_stock(&item.id, 5).await.unwrap();
        assert_eq!(repo.get_by_id(&item.id).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_add_stock_and_delete() {
        let db = setup().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Neem Cake", 2500, 10)).await.unwrap();

        repo.add_stock(&item.id, 40).await.unwrap();
        assert_eq!(repo.get_by_id(&item.id).await.unwrap().unwrap().stock, 50);
        assert!(repo.add_stock(&item.id, 0).await.is_err());

        repo.delete(&item.id).await.unwrap();
        assert!(matches!(
            repo.delete(&item.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_low_stock_and_summary() {
        let db = setup().await;
        let repo = db.inventory();
        repo.insert(&new_item("Zinc Sulphate", 12000, 5)).await.unwrap();
        repo.insert(&new_item("Calcium Nitrate", 6500, 19)).await.unwrap();
        repo.insert(&new_item("Urea (46-0-0)", 35000, 100)).await.unwrap();

        let low: Vec<String> = repo.low_stock(20).await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(low, ["Zinc Sulphate", "Calcium Nitrate"]);

        let summary = repo.summary(20).await.unwrap();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.units_in_stock, 124);
        // 120×5 + 65×19 + 350×100
        assert_eq!(summary.stock_value, Money::from_cents(3_683_500));
        assert_eq!(summary.low_stock_count, 2);
    }

    #[tokio::test]
    async fn test_stock_limits_enforced() {
        let db = setup().await;
        let repo = db.inventory();
        let item = repo.insert(&new_item("Gypsum", 50000, 10)).await.unwrap();

        assert!(repo.add_stock(&item.id, agro_core::MAX_STOCK + 1).await.is_err());
        assert!(repo
            .update_price_and_restock(&item.id, Money::from_cents(1_000_000_001), 1)
            .await
            .is_err());
        assert!(repo.insert(&new_item("Lime", 100, agro_core::MAX_STOCK + 1)).await.is_err());

        let reloaded = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 10);
        assert_eq!(reloaded.price, Money::from_cents(50000));
    }

    #[tokio::test]
    async fn test_adjust_stock_in_by_name() {
        let db = setup().await;
        let repo = db.inventory();
        repo.insert(&new_item("SSP (0-16-0)", 40000, 70)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(InventoryRepository::adjust_stock_in(&mut conn, "SSP (0-16-0)", -3).await.unwrap());
        assert!(!InventoryRepository::adjust_stock_in(&mut conn, "Custom twine", -1).await.unwrap());
        drop(conn);

        assert_eq!(repo.get_by_name("SSP (0-16-0)").await.unwrap().unwrap().stock, 67);
    }
}
