//! # Domain Types
//!
//! Core domain types used throughout Shelf POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐            ┌──────────────────────┐               │
//! │  │    Category     │ ◄───────── │        Item          │               │
//! │  │  ─────────────  │  many:many │  ──────────────────  │               │
//! │  │  id             │  (ids in   │  id                  │               │
//! │  │  display_name   │   item)    │  display_name        │               │
//! │  │  thumbnail      │            │  price_cents         │               │
//! │  └─────────────────┘            │  thumbnail           │               │
//! │                                 │  barcode (optional)  │               │
//! │                                 │  category_ids        │               │
//! │                                 └──────────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items reference categories by id only. The database stores the list as a
//! JSON array, so there is no foreign key between the two tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A grouping shown as a tab or tile in the item browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    /// Unique identifier (UUID v4 for new rows).
    pub id: String,

    /// Name shown to the cashier.
    pub display_name: String,

    /// Path to a thumbnail image, relative to the app assets.
    pub thumbnail: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Creates a new category with a fresh id and timestamps.
    pub fn new(display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Category {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the thumbnail path.
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

// =============================================================================
// Item
// =============================================================================

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4 for new rows).
    pub id: String,

    /// Name shown to the cashier and on receipts.
    pub display_name: String,

    /// Price in cents.
    pub price_cents: i64,

    /// Path to a thumbnail image, relative to the app assets.
    pub thumbnail: Option<String>,

    /// Barcode (generated 12-digit code, or a printed EAN/UPC).
    ///
    /// Unique across all items when present.
    pub barcode: Option<String>,

    /// Ids of the categories this item is listed under.
    pub category_ids: Vec<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates a new uncategorized item without barcode.
    pub fn new(display_name: impl Into<String>, price_cents: i64) -> Self {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            price_cents,
            thumbnail: None,
            barcode: None,
            category_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds the item to a category (no-op if already listed).
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        let category_id = category_id.into();
        if !self.in_category(&category_id) {
            self.category_ids.push(category_id);
        }
        self
    }

    /// Sets the thumbnail path.
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the item is listed under `category_id`.
    pub fn in_category(&self, category_id: &str) -> bool {
        self.category_ids.iter().any(|id| id == category_id)
    }

    #[inline]
    pub fn has_barcode(&self) -> bool {
        self.barcode.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
