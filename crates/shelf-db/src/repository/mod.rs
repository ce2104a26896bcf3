//! # Repository Module
//!
//! Database repository implementations for Shelf POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │  db.items().get_by_barcode("590123412345")                     │
//! │       ▼                                                                 │
//! │  ItemRepository                      CategoryRepository                │
//! │  ├── list / list_by_category         ├── list                          │
//! │  ├── get_by_id / get_by_barcode      ├── get_by_id                     │
//! │  ├── exists_by_barcode  ◄── BarcodeAllocator (witness)                 │
//! │  ├── insert / update / delete        ├── insert / update               │
//! │  └── insert_with_generated_barcode   └── delete (detaches items)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`] - Category CRUD
//! - [`ItemRepository`] - Item CRUD, barcode lookup, category membership

pub mod category;
pub mod item;

pub use category::CategoryRepository;
pub use item::ItemRepository;
