//! # Category Repository
//!
//! Database operations for categories.
//!
//! Items reference categories by id inside their JSON `categories` column,
//! so there is no foreign key. [`CategoryRepository::delete`] strips the id
//! from every item in the same transaction instead.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shelf_core::validation::validate_category;
use shelf_core::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    display_name: String,
    thumbnail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            display_name: row.display_name,
            thumbnail: row.thumbnail,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, display_name, thumbnail, created_at, updated_at
            FROM categories
            ORDER BY display_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed categories");
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, display_name, thumbnail, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Inserts a new category.
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        validate_category(category)?;
        debug!(id = %category.id, name = %category.display_name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, display_name, thumbnail, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.display_name)
        .bind(&category.thumbnail)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &category.id),
            other => other,
        })?;

        Ok(category.clone())
    }

    /// Updates name and thumbnail. Returns `NotFound` if the row is missing.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        validate_category(category)?;
        debug!(id = %category.id, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                display_name = ?2,
                thumbnail = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.display_name)
        .bind(&category.thumbnail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category and removes its id from every item's list.
    ///
    /// Both statements run in one transaction; items are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        let detached = sqlx::query(
            r#"
            UPDATE items SET
                categories = (
                    SELECT json_group_array(c.value)
                    FROM json_each(items.categories) AS c
                    WHERE c.value <> ?1
                ),
                updated_at = ?2
            WHERE CASE
                WHEN json_valid(items.categories) THEN EXISTS (
                    SELECT 1 FROM json_each(items.categories) AS c
                    WHERE c.value = ?1
                )
                ELSE 0
            END
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, items_updated = detached.rows_affected(), "Category deleted");
        Ok(())
    }

    /// Counts categories.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new category ID.
pub fn generate_category_id() -> String {
    Uuid::new_v4().to_string()
}
