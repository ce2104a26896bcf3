//! # Item Repository
//!
//! Database operations for items.
//!
//! ## Key Operations
//! - CRUD operations
//! - Barcode lookup and existence check (the allocator's witness)
//! - Category membership via SQLite JSON functions
//! - Insert with a freshly allocated barcode, retried on write conflicts
//!
//! ## Storage Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items                                                                  │
//! │  ┌──────────┬──────────────┬─────────────┬──────────────┬────────────┐ │
//! │  │ id       │ display_name │ price_cents │ barcode      │ categories │ │
//! │  ├──────────┼──────────────┼─────────────┼──────────────┼────────────┤ │
//! │  │ 6c1e...  │ Spoon        │ 1000        │ 483920175562 │ ["1"]      │ │
//! │  │ 91ab...  │ Hammer       │ 7000        │ NULL         │ ["3"]      │ │
//! │  └──────────┴──────────────┴─────────────┴──────────────┴────────────┘ │
//! │                               UNIQUE ──────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::barcode::{BarcodeAllocator, BarcodeWitness};
use crate::error::{DbError, DbResult};
use shelf_core::validation::validate_item;
use shelf_core::Item;

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `items` row. `categories` is the JSON-encoded id list.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    display_name: String,
    price_cents: i64,
    thumbnail: Option<String>,
    barcode: Option<String>,
    categories: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        let category_ids = decode_category_ids(&row.id, &row.categories);
        Item {
            id: row.id,
            display_name: row.display_name,
            price_cents: row.price_cents,
            thumbnail: row.thumbnail,
            barcode: row.barcode,
            category_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tolerant decode: an unreadable list is treated as "no categories".
fn decode_category_ids(item_id: &str, raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(item_id = %item_id, error = %err, "Unreadable category list, treating as empty");
        Vec::new()
    })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// let items = repo.list().await?;
/// let scanned = repo.get_by_barcode("590123412345").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists all items ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, display_name, price_cents, thumbnail, barcode,
                   categories, created_at, updated_at
            FROM items
            ORDER BY display_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed items");
        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Lists items whose category list contains `category_id`.
    ///
    /// Rows with an unreadable category list are skipped rather than failing
    /// the whole query.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, display_name, price_cents, thumbnail, barcode,
                   categories, created_at, updated_at
            FROM items
            WHERE CASE
                WHEN json_valid(items.categories) THEN EXISTS (
                    SELECT 1 FROM json_each(items.categories) AS c
                    WHERE c.value = ?1
                )
                ELSE 0
            END
            ORDER BY display_name, id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(category_id = %category_id, count = rows.len(), "Listed items by category");
        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, display_name, price_cents, thumbnail, barcode,
                   categories, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    /// Gets an item by its barcode (exact match).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, display_name, price_cents, thumbnail, barcode,
                   categories, created_at, updated_at
            FROM items
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    /// Checks whether any item already carries `barcode`.
    pub async fn exists_by_barcode(&self, barcode: &str) -> DbResult<bool> {
        let found: i64 =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM items WHERE barcode = ?1)")
                .bind(barcode)
                .fetch_one(&self.pool)
                .await?;

        debug!(barcode = %barcode, exists = found != 0, "Barcode existence check");
        Ok(found != 0)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Inserted item
    /// * `Err(DbError::Validation)` - Item failed validation
    /// * `Err(DbError::UniqueViolation)` - id or barcode already taken
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        validate_item(item)?;
        debug!(id = %item.id, barcode = ?item.barcode, "Inserting item");

        let categories = serde_json::to_string(&item.category_ids)?;

        sqlx::query(
            r#"
            INSERT INTO items (
                id, display_name, price_cents, thumbnail, barcode,
                categories, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.display_name)
        .bind(item.price_cents)
        .bind(&item.thumbnail)
        .bind(&item.barcode)
        .bind(categories)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_conflicting_value(DbError::from(e), item))?;

        Ok(item.clone())
    }

    /// Updates an existing item.
    ///
    /// `updated_at` is set to now; `created_at` is left untouched.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Item doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New barcode already taken
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        validate_item(item)?;
        debug!(id = %item.id, "Updating item");

        let categories = serde_json::to_string(&item.category_ids)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                display_name = ?2,
                price_cents = ?3,
                thumbnail = ?4,
                barcode = ?5,
                categories = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.display_name)
        .bind(item.price_cents)
        .bind(&item.thumbnail)
        .bind(&item.barcode)
        .bind(categories)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_conflicting_value(DbError::from(e), item))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Deletes an item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Counts items (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts `item` with a newly allocated barcode.
    ///
    /// ## Write-Time Conflict Handling
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  allocate()  ── read-time check: "is this code free?"              │
    /// │       │                                                             │
    /// │       │   ← another writer may insert the same code here (TOCTOU)  │
    /// │       ▼                                                             │
    /// │  INSERT ... barcode = code                                          │
    /// │       │                                                             │
    /// │       ├── OK ──────────────────────────────► return item            │
    /// │       │                                                             │
    /// │       └── UNIQUE(items.barcode) ──► allocate again                  │
    /// │                                     (up to write_attempts)          │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Any barcode already set on `item` is replaced. Other errors (including
    /// a duplicate id) are returned immediately.
    pub async fn insert_with_generated_barcode<W: BarcodeWitness>(
        &self,
        item: &Item,
        allocator: &BarcodeAllocator<W>,
    ) -> DbResult<Item> {
        let write_attempts = allocator.write_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let allocated = allocator.allocate().await;
            let source = allocated.source;

            let mut candidate = item.clone();
            candidate.barcode = Some(allocated.code.into_inner());

            match self.insert(&candidate).await {
                Ok(inserted) => return Ok(inserted),
                Err(err) if err.is_unique_violation_on("barcode") && attempt < write_attempts => {
                    warn!(
                        id = %item.id,
                        attempt,
                        ?source,
                        barcode = ?candidate.barcode,
                        "Barcode taken at write time, allocating another"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Fills in the offending value of a UNIQUE violation.
fn with_conflicting_value(err: DbError, item: &Item) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } => {
            let value = if err_column(&field) == "barcode" {
                item.barcode.clone().unwrap_or_default()
            } else {
                item.id.clone()
            };
            DbError::UniqueViolation { field, value }
        }
        other => other,
    }
}

fn err_column(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

#[async_trait]
impl BarcodeWitness for ItemRepository {
    async fn exists_by_barcode(&self, code: &str) -> DbResult<bool> {
        ItemRepository::exists_by_barcode(self, code).await
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
