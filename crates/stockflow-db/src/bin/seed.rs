//! # Seed Data Generator
//!
//! Populates the database with a demo tenant for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./stockflow.db)
//! cargo run -p stockflow-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockflow-db --bin seed -- --db ./data/stockflow.db
//! ```
//!
//! ## Generated Data
//! - One tenant with one warehouse and three locations (A-1, A-2, A-3)
//! - A handful of products with varying low-stock thresholds
//! - Opening stock via Add movements, one Move, one Reconcile
//! - Prints the resulting low-stock report

use std::env;

use stockflow_core::MovementRequest;
use stockflow_db::{Database, DbConfig};

/// Fixed tenant for seeded data; real tenants come from the identity
/// collaborator.
const SEED_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";
const SEED_ACTOR_ID: &str = "seed";

/// (sku, name, low_stock_threshold, opening_stock)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("WIDGET-STD", "Standard Widget", 10, 120),
    ("WIDGET-XL", "Oversize Widget", 5, 40),
    ("GASKET-9MM", "9mm Gasket", 50, 30),
    ("BOLT-M6", "M6 Hex Bolt", 200, 5000),
    ("LABEL-ROLL", "Thermal Label Roll", 0, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./stockflow.db".to_string());
    println!("Seeding database at {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let catalog = db.catalog();
    let engine = db.engine();

    let warehouse = catalog
        .create_warehouse(SEED_TENANT_ID, "Main Warehouse")
        .await?;

    let mut locations = Vec::new();
    for name in ["A-1", "A-2", "A-3"] {
        locations.push(catalog.create_location(&warehouse.id, name).await?);
    }

    for (sku, name, threshold, opening) in PRODUCTS {
        let product = catalog
            .create_product(SEED_TENANT_ID, sku, name, Some(*threshold))
            .await?;

        if *opening > 0 {
            engine
                .record_movement(
                    SEED_TENANT_ID,
                    SEED_ACTOR_ID,
                    &MovementRequest::add(&product.id, &locations[0].id, *opening),
                )
                .await?;
        }

        println!("  seeded {} ({} on hand)", sku, opening);
    }

    // Exercise the other movement kinds so the ledger has some texture
    let widget = catalog
        .create_product(SEED_TENANT_ID, "WIDGET-DEMO", "Demo Widget", Some(10))
        .await?;
    engine
        .record_movement(
            SEED_TENANT_ID,
            SEED_ACTOR_ID,
            &MovementRequest::add(&widget.id, &locations[0].id, 100),
        )
        .await?;
    engine
        .record_movement(
            SEED_TENANT_ID,
            SEED_ACTOR_ID,
            &MovementRequest::transfer(&widget.id, &locations[0].id, &locations[1].id, 25),
        )
        .await?;
    engine
        .record_movement(
            SEED_TENANT_ID,
            SEED_ACTOR_ID,
            &MovementRequest::reconcile(&widget.id, &locations[2].id, 12),
        )
        .await?;

    let low = engine.low_stock(SEED_TENANT_ID, &warehouse.id).await?;
    println!("\nLow stock ({} products):", low.len());
    for item in low {
        println!(
            "  {:<12} on hand {:>5} (threshold {})",
            item.sku, item.on_hand, item.low_stock_threshold
        );
    }

    db.close().await;
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
