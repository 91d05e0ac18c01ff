//! # Settings Repository
//!
//! The single `settings` row holding the shop identity.

use agro_core::{CoreError, ShopSettings};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{parse_percent, percent_text};
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    shop_name: String,
    shop_address: String,
    shop_phone: String,
    default_tax: String,
    currency: String,
    gst_number: String,
    licence_number: String,
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Current settings, or the defaults if the row is missing.
    pub async fn get(&self) -> DbResult<ShopSettings> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT shop_name, shop_address, shop_phone, default_tax, currency,
                   gst_number, licence_number
            FROM settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            warn!("Settings row missing, using defaults");
            return Ok(ShopSettings::default());
        };

        Ok(ShopSettings {
            default_tax: parse_percent("settings.default_tax", &row.default_tax)?,
            shop_name: row.shop_name,
            shop_address: row.shop_address,
            shop_phone: row.shop_phone,
            currency: row.currency,
            gst_number: row.gst_number,
            licence_number: row.licence_number,
        })
    }

    /// Replaces the settings row.
    pub async fn update(&self, settings: &ShopSettings) -> DbResult<()> {
        settings.validate().map_err(CoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO settings (
                id, shop_name, shop_address, shop_phone, default_tax, currency,
                gst_number, licence_number
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                shop_name = excluded.shop_name,
                shop_address = excluded.shop_address,
                shop_phone = excluded.shop_phone,
                default_tax = excluded.default_tax,
                currency = excluded.currency,
                gst_number = excluded.gst_number,
                licence_number = excluded.licence_number
            "#,
        )
        .bind(settings.shop_name.trim())
        .bind(settings.shop_address.trim())
        .bind(settings.shop_phone.trim())
        .bind(percent_text(settings.default_tax))
        .bind(settings.currency.trim())
        .bind(settings.gst_number.trim())
        .bind(settings.licence_number.trim())
        .execute(&self.pool)
        .await?;

        info!(shop = %settings.shop_name, "Shop settings updated");
        Ok(())
    }
}
