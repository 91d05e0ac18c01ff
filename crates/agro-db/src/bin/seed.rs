//! # Sample Catalogue Loader
//!
//! Fills a database with the shop's starter fertilizer catalogue.
//!
//! ## Usage
//! ```bash
//! # Default database file
//! cargo run -p agro-db --bin seed
//!
//! # Specify database path
//! cargo run -p agro-db --bin seed -- --db ./data/agro.db
//! ```
//!
//! Items whose name is already in the inventory are skipped, so running the
//! loader twice changes nothing.

use agro_core::{Money, NewInventoryItem};
use agro_db::{Database, DbConfig, DbError};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// name, price (whole rupees), stock, category, description
const CATALOGUE: &[(&str, i64, i64, &str, &str)] = &[
    ("Urea (46-0-0)", 350, 100, "Nitrogen", "High nitrogen fertilizer for leafy growth"),
    ("DAP (18-46-0)", 1350, 80, "Phosphorus", "Di-ammonium phosphate for root development"),
    ("MOP (0-0-60)", 850, 60, "Potassium", "Muriate of potash for fruit and grain quality"),
    ("NPK 10-26-26", 1200, 50, "Complex", "Balanced complex fertilizer for sowing"),
    ("SSP (0-16-0)", 400, 70, "Phosphorus", "Single super phosphate with sulphur and calcium"),
    ("Zinc Sulphate", 120, 40, "Micronutrient", "Corrects zinc deficiency in paddy and wheat"),
    ("Organic Compost", 200, 200, "Organic", "Farm yard compost for soil structure"),
    ("Vermicompost", 15, 150, "Organic", "Earthworm compost rich in nutrients"),
    ("Neem Cake", 25, 100, "Organic", "Neem seed cake, soil conditioner and pest repellent"),
    ("Calcium Nitrate", 65, 45, "Calcium", "Water soluble calcium and nitrate nitrogen"),
];

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Load the sample fertilizer catalogue")]
struct Args {
    /// Database file path
    #[arg(short, long, env = "AGRO_DB_PATH", default_value = "./agro_dev.db")]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("Agro Billing Sample Catalogue");
    println!("=============================");
    println!("Database: {}", args.db.display());
    println!();

    let db = Database::new(DbConfig::new(args.db.clone())).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let mut added = 0;
    let mut skipped = 0;

    for (name, rupees, stock, category, description) in CATALOGUE {
        let item = NewInventoryItem {
            name: name.to_string(),
            price: Money::from_cents(rupees * 100),
            stock: *stock,
            category: Some(category.to_string()),
            unit: NewInventoryItem::DEFAULT_UNIT.to_string(),
            description: Some(description.to_string()),
        };

        match db.inventory().insert(&item).await {
            Ok(_) => {
                println!("  + {name}");
                added += 1;
            }
            Err(DbError::UniqueViolation { .. }) => {
                println!("  = {name} (already present)");
                skipped += 1;
            }
            Err(e) => {
                eprintln!("Failed to insert {name}: {e}");
            }
        }
    }

    println!();
    println!("✓ Added {added} items, skipped {skipped}");
    println!("  Inventory now holds {} items", db.inventory().count().await?);

    db.close().await;
    Ok(())
}
