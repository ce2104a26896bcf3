//! Barcode allocation against a real SQLite store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use shelf_core::{BarcodeSource, Clock, Item};
use shelf_db::{AllocatorConfig, BarcodeAllocator, Database, DbConfig, DbError};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn item_with_barcode(name: &str, code: &str) -> Item {
    let mut item = Item::new(name, 1000);
    item.barcode = Some(code.to_string());
    item
}

#[tokio::test]
async fn allocates_twelve_digit_code_on_empty_store() {
    let db = setup().await;

    let code = db.barcodes().generate_unique_barcode().await;

    assert_eq!(code.len(), 12);
    assert!(code.bytes().all(|b| b.is_ascii_digit()));
    assert!(!code.starts_with('0'));
}

#[tokio::test]
async fn generated_items_get_distinct_barcodes() {
    let db = setup().await;
    let allocator = db.barcodes();

    let mut codes = HashSet::new();
    for i in 0..25 {
        let item = db
            .items()
            .insert_with_generated_barcode(&Item::new(format!("Item {i}"), 100), &allocator)
            .await
            .unwrap();
        assert!(codes.insert(item.barcode.unwrap()));
    }

    assert_eq!(db.items().count().await.unwrap(), 25);
}

#[tokio::test]
async fn falls_back_to_timestamp_after_random_collision() {
    let db = setup().await;
    let clock = Arc::new(FixedClock(Utc.timestamp_millis_opt(1_718_000_123_456).unwrap()));

    // One random attempt, and that attempt is forced to collide by seeding
    // the store with the exact code the seeded generator draws first.
    let reference = BarcodeAllocator::new(db.items()).with_seed(42);
    let first_draw = reference.generate_unique_barcode().await;
    db.items()
        .insert(&item_with_barcode("Spoon", &first_draw))
        .await
        .unwrap();

    let allocator = BarcodeAllocator::new(db.items())
        .with_seed(42)
        .with_max_attempts(1)
        .with_clock(clock);
    let allocated = allocator.allocate().await;

    assert_eq!(allocated.source, BarcodeSource::Timestamp);
    assert!(allocated.verified);
    assert_eq!(allocated.code.as_str(), "718000123456");
}

#[tokio::test]
async fn unchecked_fallback_when_timestamp_is_taken() {
    let db = setup().await;
    let clock = Arc::new(FixedClock(Utc.timestamp_millis_opt(1_718_000_123_456).unwrap()));

    let reference = BarcodeAllocator::new(db.items()).with_seed(9);
    let first_draw = reference.generate_unique_barcode().await;
    db.items()
        .insert(&item_with_barcode("Spoon", &first_draw))
        .await
        .unwrap();
    db.items()
        .insert(&item_with_barcode("Fork", "718000123456"))
        .await
        .unwrap();

    let allocator = BarcodeAllocator::new(db.items())
        .with_seed(9)
        .with_max_attempts(1)
        .with_clock(clock);
    let allocated = allocator.allocate().await;

    assert_eq!(allocated.source, BarcodeSource::Unchecked);
    assert!(!allocated.verified);
    assert_eq!(allocated.code.as_str().len(), 12);
    assert!(allocated.code.as_str().starts_with("00123456"));
}

#[tokio::test]
async fn closed_pool_fails_open() {
    let db = setup().await;
    let allocator = db.barcodes();
    db.close().await;

    let allocated = allocator.allocate().await;

    assert_eq!(allocated.source, BarcodeSource::Random { attempt: 1 });
    assert!(!allocated.verified);
    assert_eq!(allocated.code.as_str().len(), 12);
}

#[tokio::test]
async fn write_conflict_is_retried() {
    let db = setup().await;

    // The allocator's witness never sees stored codes (separate database),
    // so its seeded first draw is "free" at check time but taken at write.
    let blind = Database::new(DbConfig::in_memory()).await.unwrap();
    let reference = BarcodeAllocator::new(blind.items()).with_seed(77);
    let first_draw = reference.generate_unique_barcode().await;
    db.items()
        .insert(&item_with_barcode("Spoon", &first_draw))
        .await
        .unwrap();

    let allocator = BarcodeAllocator::new(blind.items()).with_seed(77);
    let item = db
        .items()
        .insert_with_generated_barcode(&Item::new("Fork", 2000), &allocator)
        .await
        .unwrap();

    let code = item.barcode.unwrap();
    assert_ne!(code, first_draw);
    assert!(db.items().exists_by_barcode(&code).await.unwrap());
}

#[tokio::test]
async fn write_conflict_surfaces_after_last_attempt() {
    let db = setup().await;
    let blind = Database::new(DbConfig::in_memory()).await.unwrap();

    let reference = BarcodeAllocator::new(blind.items()).with_seed(5);
    let first_draw = reference.generate_unique_barcode().await;
    db.items()
        .insert(&item_with_barcode("Spoon", &first_draw))
        .await
        .unwrap();

    let config = AllocatorConfig::default().write_attempts(1);
    let allocator = BarcodeAllocator::new(blind.items())
        .with_config(&config)
        .with_seed(5);
    let err = db
        .items()
        .insert_with_generated_barcode(&Item::new("Fork", 2000), &allocator)
        .await
        .unwrap_err();

    assert!(err.is_unique_violation_on("barcode"));
    assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if *value == first_draw));
}

#[tokio::test]
async fn duplicate_item_id_is_not_retried() {
    let db = setup().await;
    let allocator = db.barcodes();

    let item = Item::new("Spoon", 1000);
    db.items()
        .insert_with_generated_barcode(&item, &allocator)
        .await
        .unwrap();

    let err = db
        .items()
        .insert_with_generated_barcode(&item, &allocator)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on("id"));
}
