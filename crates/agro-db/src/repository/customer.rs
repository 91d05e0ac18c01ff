//! # Customer Repository
//!
//! Customers are identified by phone number. A bill saved with a phone that
//! is already known reuses that customer; anything else creates a new row.

use agro_core::validation::validate_search_query;
use agro_core::{CoreError, Customer, CustomerDetails};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::generate_id;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks a customer up by phone, used to auto-fill name and address.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(None);
        }

        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, name, phone, address, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, name, phone, address, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Customers whose name or phone contains `query`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        let pattern = format!("%{query}%");

        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, address, created_at
            FROM customers
            WHERE name LIKE ?1 OR phone LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    // =========================================================================
    // Transaction helpers
    // =========================================================================

    /// Returns the id of the customer for `details`, creating one if needed.
    ///
    /// ```text
    /// phone given and known   → existing id (stored name/address untouched)
    /// phone given, unknown    → new customer
    /// no phone                → new customer (names are not unique)
    /// ```
    ///
    /// `details` must already be normalized (non-blank name).
    pub async fn resolve_in(conn: &mut SqliteConnection, details: &CustomerDetails) -> DbResult<String> {
        if let Some(phone) = details.phone.as_deref() {
            let existing: Option<String> = sqlx::query_scalar("SELECT id FROM customers WHERE phone = ?1")
                .bind(phone)
                .fetch_optional(&mut *conn)
                .await?;

            if let Some(id) = existing {
                debug!(customer_id = %id, "Reusing customer by phone");
                return Ok(id);
            }
        }

        let id = generate_id();
        sqlx::query(
            "INSERT INTO customers (id, name, phone, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.address)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        info!(customer_id = %id, name = %details.name, "Customer created");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_resolve_reuses_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let details = CustomerDetails::new("Ramesh Kumar")
            .with_phone("9812345678")
            .with_address("Village Kheri");

        let mut conn = db.pool().acquire().await.unwrap();
        let first = CustomerRepository::resolve_in(&mut conn, &details).await.unwrap();
        let renamed = CustomerDetails::new("Ramesh K").with_phone("9812345678");
        let second = CustomerRepository::resolve_in(&mut conn, &renamed).await.unwrap();
        drop(conn);

        assert_eq!(first, second);
        let stored = db.customers().find_by_phone("9812345678").await.unwrap().unwrap();
        assert_eq!(stored.name, "Ramesh Kumar");
        assert_eq!(stored.address.as_deref(), Some("Village Kheri"));
    }

    #[tokio::test]
    async fn test_resolve_without_phone_creates_each_time() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let details = CustomerDetails::new("Walk-in");

        let mut conn = db.pool().acquire().await.unwrap();
        let a = CustomerRepository::resolve_in(&mut conn, &details).await.unwrap();
        let b = CustomerRepository::resolve_in(&mut conn, &details).await.unwrap();
        drop(conn);

        assert_ne!(a, b);
        assert_eq!(db.customers().search("walk", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_blank_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.customers().find_by_phone("  ").await.unwrap().is_none());
    }
}
