//! # Settings Commands
//!
//! Shop details printed on every receipt, and the default tax rate.
//!
//! ## Keys
//! ```text
//! name      shop name (required)
//! address   shop address, wrapped on the receipt
//! phone     shop phone
//! tax       default tax for new bills, 0-100
//! currency  symbol before amounts (max 5 characters)
//! gst       GST number
//! licence   fertilizer licence number
//! ```

use agro_core::validation::parse_rate;
use agro_core::{ShopSettings, ValidationError};
use agro_db::Database;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::BillingSession;

/// Setting names accepted by [`update_setting`].
pub const SETTING_KEYS: [&str; 7] = ["name", "address", "phone", "tax", "currency", "gst", "licence"];

pub async fn get_settings(db: &Database) -> ApiResult<ShopSettings> {
    debug!("get_settings command");
    Ok(db.settings().get().await?)
}

/// Changes one setting.
///
/// A new default tax applies to the next bill; the bill being built keeps
/// its rate.
pub async fn update_setting(
    db: &Database,
    session: &mut BillingSession,
    key: &str,
    value: &str,
) -> ApiResult<ShopSettings> {
    debug!(key = %key, value = %value, "update_setting command");

    let mut settings = db.settings().get().await?;
    let value = value.trim().to_string();

    match key.trim().to_lowercase().as_str() {
        "name" => settings.shop_name = value,
        "address" => settings.shop_address = value,
        "phone" => settings.shop_phone = value,
        "tax" => settings.default_tax = parse_rate("default tax", &value)?,
        "currency" => settings.currency = value,
        "gst" => settings.gst_number = value,
        "licence" | "license" => settings.licence_number = value,
        _ => {
            return Err(ValidationError::NotAllowed {
                field: "setting".to_string(),
                allowed: SETTING_KEYS.iter().map(|k| k.to_string()).collect(),
            }
            .into())
        }
    }

    db.settings().update(&settings).await?;
    session.set_default_tax(settings.default_tax);

    info!(key = %key, "Shop setting updated");
    Ok(settings)
}
