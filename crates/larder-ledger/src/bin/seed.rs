//! # Demo Data Seeder
//!
//! Populates a database with one demo location and runs a day of trading
//! through the ledger.
//!
//! ## Usage
//! ```bash
//! # Default database from larder.toml / LARDER_DB_PATH
//! cargo run -p larder-ledger --bin seed
//!
//! # Explicit database or config file
//! cargo run -p larder-ledger --bin seed -- --db ./data/larder.db
//! cargo run -p larder-ledger --bin seed -- --config ./larder.toml
//! ```
//!
//! ## Generated Data
//! - Location "Demo Kitchen" with a manager and a cook
//! - Ingredients: Lettuce, Tomato, Cucumber, Carrot (kg), Chicken Breast (kg)
//! - Recipe "Garden Chicken Salad" on the menu at $12.50
//! - Deliveries for every ingredient, a sale of 4 salads, an end-of-day count

use std::env;
use std::path::PathBuf;

use larder_cache::RequestKey;
use larder_core::{Money, MovementFilter, Quantity, ReportSummary};
use larder_db::{Database, NewIngredient, NewLocation, NewMenuItem, NewRecipe, NewStaff};
use larder_ledger::{
    telemetry, DeliveryRequest, LarderConfig, LedgerService, ReportService, SaleRequest,
    StockCountRequest,
};

/// (name, unit, opening cost in cents, delivered quantity in milli-units,
/// delivered unit cost in cents)
const INGREDIENTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Lettuce", "kg", 250, 8_000, 240),
    ("Tomato", "kg", 300, 6_000, 320),
    ("Cucumber", "kg", 175, 4_000, 175),
    ("Carrot", "kg", 150, 5_000, 140),
    ("Chicken Breast", "kg", 500, 10_000, 720),
];

/// Milli-units of each ingredient in one salad, in `INGREDIENTS` order.
const SALAD: &[i64] = &[120, 80, 60, 40, 180];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Larder Demo Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   Config file (default: platform config dir)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LarderConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    config.validate()?;
    telemetry::init_tracing(&config.logging);

    println!("Larder Demo Seeder");
    println!("==================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.database.to_db_config()).await?;
    let reports = ReportService::new(db.clone());

    let existing = reports.locations().await?;
    if !existing.is_empty() {
        println!("Database already has {} location(s)", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Reference data
    let location = db
        .locations()
        .create(&NewLocation::new("Demo Kitchen", "12 Market Street").phone("555-0100"))
        .await?;
    let manager = db
        .staff()
        .create(&NewStaff::new(location.id, "Morgan").role("manager"))
        .await?;
    let cook = db
        .staff()
        .create(&NewStaff::new(location.id, "Sam").role("cook"))
        .await?;
    println!("Created location '{}' with 2 staff", location.name);

    let mut ingredient_ids = Vec::with_capacity(INGREDIENTS.len());
    for (name, unit, cost, _, _) in INGREDIENTS {
        let ingredient = db
            .ingredients()
            .create(&NewIngredient::new(*name, Money::from_cents(*cost)).unit(*unit))
            .await?;
        db.inventory().provision(location.id, ingredient.id).await?;
        ingredient_ids.push(ingredient.id);
    }
    println!("Created and stocked {} ingredients", ingredient_ids.len());

    let recipe = ingredient_ids
        .iter()
        .zip(SALAD)
        .fold(
            NewRecipe::new("Garden Chicken Salad").description("House salad with grilled chicken"),
            |recipe, (id, milli)| recipe.line(*id, Quantity::from_milli(*milli)),
        );
    let recipe = db.recipes().create(&recipe).await?;
    let menu_item = db
        .menu_items()
        .create(&NewMenuItem::new(
            location.id,
            recipe.id,
            "Garden Chicken Salad",
            Money::from_cents(1250),
        ))
        .await?;
    println!("Created menu item '{}' at {}", menu_item.name, menu_item.price());

    // A day of trading
    let ledger = LedgerService::new(db.clone(), config.ledger.clone());

    println!();
    println!("Receiving deliveries...");
    for (id, (name, _, _, delivered, cost)) in ingredient_ids.iter().zip(INGREDIENTS) {
        let movement = ledger
            .accept_delivery(
                &DeliveryRequest::new(
                    location.id,
                    manager.id,
                    *id,
                    Quantity::from_milli(*delivered),
                    Money::from_cents(*cost),
                )
                .reference(format!("DEMO-{id:04}")),
            )
            .await?;
        println!("  {:<16} +{}", name, movement.quantity());
    }

    let sold = ledger
        .sell_item(&SaleRequest::recipe(location.id, cook.id, recipe.id, 4).notes("lunch service"))
        .await?;
    println!("Sold 4 × {} ({} ingredient movements)", menu_item.name, sold.len());

    // Half a kilo of lettuce went limp overnight.
    let lettuce = ingredient_ids[0];
    let lettuce_left = Quantity::from_milli(INGREDIENTS[0].3 - 4 * SALAD[0] - 500);
    let counted = ledger
        .take_stock(
            &StockCountRequest::new(location.id, manager.id, lettuce, lettuce_left)
                .notes("end of day count"),
        )
        .await?;
    println!("Counted lettuce: {} {}", counted.movement_type, counted.quantity());

    // Report, read the way the HTTP layer reads it
    let cache = config.cache.read_cache::<ReportSummary>();
    let key = RequestKey::get(format!("/locations/{}/reports/summary", location.id));
    let everything = MovementFilter::all();
    for _ in 0..2 {
        let (summary, status) = cache
            .fetch(&key, || reports.report_summary(location.id, &everything))
            .await?;
        println!();
        println!("Report summary [{}]", status.as_header());
        println!("  Delivery cost:    {}", summary.total_delivery_cost);
        println!("  Sales revenue:    {}", summary.total_sales_revenue);
        println!("  Waste cost:       {}", summary.total_waste_cost);
        println!("  Inventory value:  {}", summary.total_inventory_value);
    }

    let drifted = reports.reconcile(location.id).await?;
    println!();
    if drifted.is_empty() {
        println!("Ledger reconciles with inventory");
    } else {
        println!("{} inventory row(s) disagree with the ledger", drifted.len());
    }

    db.close().await;
    println!();
    println!("Seed complete!");
    Ok(())
}
