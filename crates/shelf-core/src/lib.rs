//! # shelf-core: Pure Domain Logic for Shelf POS
//!
//! Types and rules for the inventory side of a point-of-sale counter:
//! categories, items, prices and barcode candidates. No I/O happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desktop front-end                            │   │
//! │  │        Category list ──► Item grid ──► Item editor              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  barcode  │  │ validation│  │   │
//! │  │   │  Category │  │   Money   │  │ candidates│  │   rules   │  │   │
//! │  │   │   Item    │  │           │  │  fallbacks│  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • RNG AND CLOCK ARE INJECTED            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  │        SQLite repositories, migrations, barcode allocator       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Item)
//! - [`money`] - Money type for integer-cent prices
//! - [`barcode`] - Barcode candidate formats and fallbacks
//! - [`clock`] - Time source port
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::barcode::{random_candidate, BARCODE_LEN};
//! use shelf_core::Item;
//!
//! let mut item = Item::new("Spoon", 1000);
//! let code = random_candidate(&mut rand::thread_rng());
//! assert_eq!(code.as_str().len(), BARCODE_LEN);
//!
//! item.barcode = Some(code.into_inner());
//! assert!(item.has_barcode());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod clock;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use barcode::{Barcode, BarcodeSource};
pub use clock::{Clock, SystemClock};
pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a category or item display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Maximum length of an entity id.
///
/// New ids are UUID v4 (36 chars); older catalogs used short ids like `"1a"`.
pub const MAX_ID_LEN: usize = 64;
