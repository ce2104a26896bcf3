//! # shelf-db: Database Layer for Shelf POS
//!
//! This crate provides database access for the Shelf POS catalog.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf POS Data Flow                              │
//! │                                                                         │
//! │  UI / seed tool                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ SharedDatabase│    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (shared.rs)  │    │ CategoryRepo  │    │  (embedded)  │  │   │
//! │  │   │       │       │    │ ItemRepo ◄────┼────┤              │  │   │
//! │  │   │   Database    │◄───│       ▲       │    │ 0001_initial │  │   │
//! │  │   │   (pool.rs)   │    │       │       │    │              │  │   │
//! │  │   └───────────────┘    │ BarcodeAllocator   └──────────────┘  │   │
//! │  │                        └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   SHELF_DB_PATH or <platform data dir>/shelf.db                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`shared`] - Process-wide, lazily opened handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Category and item repositories
//! - [`barcode`] - Unique barcode allocation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{DbConfig, SharedDatabase};
//!
//! let shared = SharedDatabase::new(DbConfig::from_env()?);
//! let db = shared.get().await?;
//!
//! let item = db
//!     .items()
//!     .insert_with_generated_barcode(&Item::new("Spoon", 1000), &db.barcodes())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod shared;

// =============================================================================
// Re-exports
// =============================================================================

pub use barcode::{AllocatedBarcode, AllocatorConfig, BarcodeAllocator, BarcodeWitness};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use shared::SharedDatabase;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::item::ItemRepository;
