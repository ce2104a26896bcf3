//! # Shared Database Handle
//!
//! One lazily-opened [`Database`] for the whole process.
//!
//! ## Single-Flight Initialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  task A: shared.get() ──┐                                              │
//! │  task B: shared.get() ──┼──► OnceCell::get_or_try_init                 │
//! │  task C: shared.get() ──┘        │                                      │
//! │                                  │ exactly one Database::new(config)    │
//! │                                  ▼                                      │
//! │                             &Database (same pointer for A, B, C)       │
//! │                                                                         │
//! │  Init failed? The cell stays empty; the next get() tries again.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::DbResult;
use crate::pool::{Database, DbConfig};

/// Lazily opened, process-wide database handle.
///
/// ## Usage
/// ```rust,ignore
/// let shared = SharedDatabase::new(DbConfig::from_env()?);
/// let items = shared.get().await?.items().list().await?;
/// ```
#[derive(Debug)]
pub struct SharedDatabase {
    config: DbConfig,
    cell: OnceCell<Database>,
}

impl SharedDatabase {
    /// Creates the handle. Nothing is opened until the first [`get`](Self::get).
    pub fn new(config: DbConfig) -> Self {
        SharedDatabase {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the database, opening it on first use.
    ///
    /// Concurrent first callers wait on the same initialization.
    pub async fn get(&self) -> DbResult<&Database> {
        self.cell
            .get_or_try_init(|| async {
                info!(path = %self.config.database_path.display(), "Opening shared database");
                Database::new(self.config.clone()).await.map_err(|err| {
                    warn!(error = %err, "Shared database initialization failed");
                    err
                })
            })
            .await
    }

    /// True once a `get()` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// The configuration used to open the database.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_lazy_open() {
        let shared = SharedDatabase::new(DbConfig::in_memory());
        assert!(!shared.is_initialized());

        let db = shared.get().await.unwrap();
        assert!(db.health_check().await);
        assert!(shared.is_initialized());
    }

    #[tokio::test]
    async fn test_repeated_get_returns_same_handle() {
        let shared = SharedDatabase::new(DbConfig::in_memory());

        let first = shared.get().await.unwrap();
        let second = shared.get().await.unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_open() {
        let shared = SharedDatabase::new(DbConfig::in_memory());

        let (a, b, c) = tokio::join!(shared.get(), shared.get(), shared.get());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(b, c));

        // An in-memory database is per-connection, so a row written through
        // one handle is visible through the others only if they are the same.
        a.items()
            .insert(&shelf_core::Item::new("Spoon", 1000))
            .await
            .unwrap();
        assert_eq!(c.items().count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_across_tasks() {
        let shared = Arc::new(SharedDatabase::new(DbConfig::in_memory()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let db = shared.get().await.unwrap();
                    db as *const Database as usize
                })
            })
            .collect();

        let mut addrs = Vec::new();
        for handle in handles {
            addrs.push(handle.await.unwrap());
        }
        addrs.dedup();
        assert_eq!(addrs.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_init_can_retry() {
        let dir = std::env::temp_dir().join(format!("shelf-shared-{}", uuid::Uuid::new_v4()));
        let shared = SharedDatabase::new(DbConfig::new(dir.join("shelf.db")));

        // Parent directory missing: SQLite cannot create the file.
        assert!(shared.get().await.is_err());
        assert!(!shared.is_initialized());

        std::fs::create_dir_all(&dir).unwrap();
        assert!(shared.get().await.is_ok());
        assert!(shared.is_initialized());

        shared.get().await.unwrap().close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }
}
