//! # Sample Catalog Seeder
//!
//! Populates the database with the sample categories and items used during
//! development. Every item gets a barcode from the allocator.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (SHELF_DB_PATH or the platform data dir)
//! cargo run -p shelf-db --bin seed
//!
//! # Specify database path
//! cargo run -p shelf-db --bin seed -- --db ./data/shelf.db
//!
//! # Wipe the catalog first
//! cargo run -p shelf-db --bin seed -- --reset
//! ```

use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shelf_core::{Category, Item};
use shelf_db::{Database, DbConfig, DbResult};

const SAMPLE_THUMBNAIL: &str = "src/assets/items/spoon.png";

/// (id, name)
const CATEGORIES: &[(&str, &str)] = &[
    ("1", "Utensils"),
    ("2", "Wearables"),
    ("3", "Tools"),
    ("4", "Accessories"),
];

/// (id, name, price in whole units, category id)
const ITEMS: &[(&str, &str, i64, &str)] = &[
    ("1a", "Spoon", 10, "1"),
    ("2b", "Fork", 20, "1"),
    ("3c", "Knife", 30, "1"),
    ("4d", "Watch", 40, "2"),
    ("5e", "Socks", 50, "2"),
    ("6f", "T-shirt", 60, "2"),
    ("7g", "Hammer", 70, "3"),
    ("8h", "Nails", 80, "3"),
    ("9i", "Screwdriver", 90, "3"),
    ("10j", "Bracelet", 100, "4"),
    ("11k", "Necklace", 110, "4"),
    ("12l", "Ring", 120, "4"),
];

struct Args {
    db_path: Option<String>,
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(args) = parse_args() else {
        print_help();
        return Ok(());
    };

    let config = match args.db_path {
        Some(path) => DbConfig::new(path).allocator(shelf_db::AllocatorConfig::from_env()),
        None => DbConfig::from_env()?,
    };

    println!("Shelf POS Sample Catalog");
    println!("========================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if args.reset {
        reset_catalog(&db).await?;
        println!("✓ Catalog cleared");
    }

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Run with --reset to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let added = seed_categories(&db).await?;
    println!(
        "✓ Inserted {} categories ({} already present)",
        added,
        CATEGORIES.len() - added
    );

    let allocator = db.barcodes();
    let mut inserted = 0;

    for (id, name, price, category_id) in ITEMS {
        let mut item = Item::new(*name, price * 100)
            .with_category(*category_id)
            .with_thumbnail(SAMPLE_THUMBNAIL);
        item.id = id.to_string();

        match db.items().insert_with_generated_barcode(&item, &allocator).await {
            Ok(item) => {
                inserted += 1;
                println!(
                    "  {:<12} {:>8}  {}",
                    item.display_name,
                    item.price().to_string(),
                    item.barcode.as_deref().unwrap_or("-")
                );
            }
            Err(e) => {
                warn!(id = %item.id, error = %e, "Failed to insert sample item");
                eprintln!("Failed to insert {}: {}", item.display_name, e);
            }
        }
    }

    info!(inserted, elapsed = ?start.elapsed(), "Seed complete");
    println!();
    println!("✓ Inserted {} items in {:?}", inserted, start.elapsed());

    Ok(())
}

/// Returns `None` when help was requested.
fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        db_path: None,
        reset: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    parsed.db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--reset" => parsed.reset = true,
            "--help" | "-h" => return None,
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    Some(parsed)
}

fn print_help() {
    println!("Shelf POS Sample Catalog");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file path (default: $SHELF_DB_PATH or data dir)");
    println!("      --reset        Delete all items and categories first");
    println!("  -h, --help         Show this help message");
}

/// Inserts the sample categories that are not stored yet.
///
/// A store can hold the categories without any items (an earlier run whose
/// item inserts all failed), so existing ids are skipped. Returns how many
/// were inserted.
async fn seed_categories(db: &Database) -> DbResult<usize> {
    let mut added = 0;

    for (id, name) in CATEGORIES {
        if db.categories().get_by_id(id).await?.is_some() {
            info!(id = %id, "Sample category already present");
            continue;
        }

        let mut category = Category::new(*name).with_thumbnail(SAMPLE_THUMBNAIL);
        category.id = id.to_string();
        db.categories().insert(&category).await?;
        added += 1;
    }

    Ok(added)
}

/// Deletes every item and category.
async fn reset_catalog(db: &Database) -> DbResult<()> {
    let mut tx = db.pool().begin().await?;
    sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
    tx.commit().await?;

    warn!("Catalog reset");
    Ok(())
}

/// Log level from `RUST_LOG`, default `info,shelf=debug,sqlx=warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shelf=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_seed_categories_inserts_all() {
        let db = setup().await;

        assert_eq!(seed_categories(&db).await.unwrap(), CATEGORIES.len());
        assert_eq!(db.categories().count().await.unwrap(), CATEGORIES.len() as i64);
    }

    #[tokio::test]
    async fn test_seed_categories_rerun_without_items() {
        let db = setup().await;
        seed_categories(&db).await.unwrap();
        assert_eq!(db.items().count().await.unwrap(), 0);

        // Second run: categories exist, items don't. Must not hit a duplicate id.
        assert_eq!(seed_categories(&db).await.unwrap(), 0);
        assert_eq!(db.categories().count().await.unwrap(), CATEGORIES.len() as i64);
    }

    #[tokio::test]
    async fn test_seed_categories_fills_gaps() {
        let db = setup().await;
        seed_categories(&db).await.unwrap();
        db.categories().delete("3").await.unwrap();

        assert_eq!(seed_categories(&db).await.unwrap(), 1);
        let tools = db.categories().get_by_id("3").await.unwrap().unwrap();
        assert_eq!(tools.display_name, "Tools");
    }

    #[tokio::test]
    async fn test_reset_catalog() {
        let db = setup().await;
        seed_categories(&db).await.unwrap();
        db.items()
            .insert(&Item::new("Spoon", 1000).with_category("1"))
            .await
            .unwrap();

        reset_catalog(&db).await.unwrap();

        assert_eq!(db.items().count().await.unwrap(), 0);
        assert_eq!(db.categories().count().await.unwrap(), 0);
    }
}
