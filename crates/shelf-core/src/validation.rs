//! # Validation Module
//!
//! Input validation for categories and items.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front-end form                                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Names, prices, ids, barcode format                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (price_cents >= 0)                               │
//! │  └── UNIQUE (items.barcode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_barcode, validate_price_cents};
//!
//! assert!(validate_barcode("590123412345").is_ok());
//! assert!(validate_price_cents(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Category, Item};
use crate::{MAX_DISPLAY_NAME_LEN, MAX_ID_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Shortest accepted barcode (EAN-8).
pub const MIN_BARCODE_LEN: usize = 8;

/// Longest accepted barcode (EAN-13).
pub const MAX_BARCODE_LEN: usize = 13;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_DISPLAY_NAME_LEN`] characters
pub fn validate_display_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DISPLAY_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an entity id.
///
/// Legacy catalogs use short ids (`"1a"`), so any non-empty id up to
/// [`MAX_ID_LEN`] characters is accepted.
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - ASCII digits only
/// - Between 8 (EAN-8) and 13 (EAN-13) digits; generated codes have 12
///
/// No check digit is verified: generated codes do not carry one.
pub fn validate_barcode(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if !(MIN_BARCODE_LEN..=MAX_BARCODE_LEN).contains(&code.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: format!(
                "must be {} to {} digits long",
                MIN_BARCODE_LEN, MAX_BARCODE_LEN
            ),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a category before insert or update.
pub fn validate_category(category: &Category) -> ValidationResult<()> {
    validate_id(&category.id)?;
    validate_display_name("display_name", &category.display_name)
}

/// Validates an item before insert or update.
///
/// ## Rules
/// - id, display name and price as above
/// - barcode, when present, passes [`validate_barcode`]
/// - each category id is a valid id and listed once
pub fn validate_item(item: &Item) -> ValidationResult<()> {
    validate_id(&item.id)?;
    validate_display_name("display_name", &item.display_name)?;
    validate_price_cents(item.price_cents)?;

    if let Some(code) = &item.barcode {
        validate_barcode(code)?;
    }

    for (idx, category_id) in item.category_ids.iter().enumerate() {
        validate_id(category_id)?;
        if item.category_ids[..idx].contains(category_id) {
            return Err(ValidationError::Duplicate {
                field: "category".to_string(),
                value: category_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
