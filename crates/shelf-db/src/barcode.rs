//! # Barcode Allocator
//!
//! Proposes barcodes for new items that no stored item already carries.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        allocate()                                       │
//! │                                                                         │
//! │  attempt 1..=max_attempts                                              │
//! │    random 12-digit candidate ──► witness.exists_by_barcode()           │
//! │         │                          │                                    │
//! │         │       Absent / CheckFailed ──► return (Random)                │
//! │         │       Exists ──────────────► next attempt                     │
//! │         ▼                                                               │
//! │  timestamp candidate ──► witness.exists_by_barcode()                   │
//! │                            │                                            │
//! │          Absent / CheckFailed ──► return (Timestamp)                    │
//! │          Exists ──────────────► Exhausted                               │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │  unchecked candidate (8 ms digits + 4 random) ──► return (Unchecked)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - `allocate()` never fails. Exhaustion is handled inside this module.
//! - A failed existence check counts as "free" (fail-open) and is logged.
//! - The allocator performs no write. Between the check and the caller's
//!   insert another writer may take the same code; `items.barcode` is UNIQUE
//!   and [`ItemRepository::insert_with_generated_barcode`] retries on that
//!   conflict.
//!
//! [`ItemRepository::insert_with_generated_barcode`]:
//!     crate::repository::item::ItemRepository::insert_with_generated_barcode

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use shelf_core::barcode::{
    random_candidate, timestamp_candidate, unchecked_candidate, DEFAULT_MAX_ATTEMPTS,
};
use shelf_core::{Barcode, BarcodeSource, Clock, SystemClock};

/// Environment variable overriding the number of random attempts.
pub const MAX_ATTEMPTS_ENV: &str = "SHELF_BARCODE_MAX_ATTEMPTS";

/// Insert attempts made by `insert_with_generated_barcode`.
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;

// =============================================================================
// Witness
// =============================================================================

/// Answers "does any stored item already use this code as its barcode?".
///
/// Implemented by [`crate::repository::item::ItemRepository`]; tests supply
/// in-memory stores.
#[async_trait]
pub trait BarcodeWitness: Send + Sync {
    async fn exists_by_barcode(&self, code: &str) -> DbResult<bool>;
}

#[async_trait]
impl<W: BarcodeWitness + ?Sized> BarcodeWitness for Arc<W> {
    async fn exists_by_barcode(&self, code: &str) -> DbResult<bool> {
        (**self).exists_by_barcode(code).await
    }
}

/// Outcome of one existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existence {
    Exists,
    Absent,
    CheckFailed,
}

impl Existence {
    /// Fail-open: a check that could not run does not block allocation.
    fn is_free(self) -> bool {
        !matches!(self, Existence::Exists)
    }
}

/// Both checked paths collided.
#[derive(Debug, Error)]
#[error("no free barcode after {attempts} random attempts and the timestamp fallback")]
struct Exhausted {
    attempts: u32,
}

// =============================================================================
// Configuration
// =============================================================================

/// Allocator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Random candidates tried before the timestamp fallback.
    /// Default: 10
    pub max_attempts: u32,

    /// Inserts tried by `insert_with_generated_barcode` when the chosen code
    /// is taken at write time.
    /// Default: 3
    pub write_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
        }
    }
}

impl AllocatorConfig {
    /// Reads `SHELF_BARCODE_MAX_ATTEMPTS`. Unparseable or zero values are
    /// ignored with a warning.
    pub fn from_env() -> Self {
        let config = AllocatorConfig::default();

        match std::env::var(MAX_ATTEMPTS_ENV) {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => config.max_attempts(n),
                _ => {
                    warn!(value = %raw, env = MAX_ATTEMPTS_ENV, "Ignoring invalid attempt count");
                    config
                }
            },
            Err(_) => config,
        }
    }

    /// Sets the number of random attempts (minimum 1).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Sets the number of insert attempts (minimum 1).
    pub fn write_attempts(mut self, n: u32) -> Self {
        self.write_attempts = n.max(1);
        self
    }
}

// =============================================================================
// Result
// =============================================================================

/// A code handed out by [`BarcodeAllocator::allocate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocatedBarcode {
    pub code: Barcode,

    /// Which step of the fallback chain produced the code.
    pub source: BarcodeSource,

    /// False when the accepted check had failed, or no check ran at all.
    pub verified: bool,
}

// =============================================================================
// Allocator
// =============================================================================

/// Generates barcodes that no item in the witness carries.
///
/// ## Usage
/// ```rust,ignore
/// let allocator = db.barcodes();
/// let code = allocator.generate_unique_barcode().await;
///
/// // Or with provenance:
/// let allocated = allocator.allocate().await;
/// if !allocated.verified {
///     warn!(code = %allocated.code, "barcode not confirmed unique");
/// }
/// ```
pub struct BarcodeAllocator<W> {
    witness: W,
    clock: Arc<dyn Clock>,
    rng: Option<Mutex<StdRng>>,
    max_attempts: u32,
    write_attempts: u32,
}

impl<W: BarcodeWitness> BarcodeAllocator<W> {
    /// Creates an allocator with default settings and the system clock.
    pub fn new(witness: W) -> Self {
        let defaults = AllocatorConfig::default();
        BarcodeAllocator {
            witness,
            clock: Arc::new(SystemClock),
            rng: None,
            max_attempts: defaults.max_attempts,
            write_attempts: defaults.write_attempts,
        }
    }

    /// Applies attempt counts from `config`.
    pub fn with_config(mut self, config: &AllocatorConfig) -> Self {
        self.max_attempts = config.max_attempts.max(1);
        self.write_attempts = config.write_attempts.max(1);
        self
    }

    /// Sets the number of random attempts (minimum 1).
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Replaces the time source used by the fallbacks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Draws candidates from a seeded generator instead of the thread RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn witness(&self) -> &W {
        &self.witness
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn write_attempts(&self) -> u32 {
        self.write_attempts
    }

    /// Returns a code string. Never fails.
    pub async fn generate_unique_barcode(&self) -> String {
        self.allocate().await.code.into_inner()
    }

    /// Returns a code together with how it was obtained. Never fails.
    pub async fn allocate(&self) -> AllocatedBarcode {
        match self.try_allocate().await {
            Ok(allocated) => allocated,
            Err(exhausted) => {
                let millis = self.clock.now_millis();
                let code = self.with_rng(|rng| unchecked_candidate(millis, rng));
                warn!(
                    code = %code,
                    error = %exhausted,
                    "Returning unchecked barcode; it may duplicate an existing one"
                );
                AllocatedBarcode {
                    code,
                    source: BarcodeSource::Unchecked,
                    verified: false,
                }
            }
        }
    }

    async fn try_allocate(&self) -> Result<AllocatedBarcode, Exhausted> {
        for attempt in 1..=self.max_attempts {
            let code = self.with_rng(|rng| random_candidate(rng));
            let existence = self.check(&code).await;

            if existence.is_free() {
                debug!(code = %code, attempt, "Allocated random barcode");
                return Ok(AllocatedBarcode {
                    code,
                    source: BarcodeSource::Random { attempt },
                    verified: existence == Existence::Absent,
                });
            }

            debug!(code = %code, attempt, "Random barcode taken");
        }

        let code = timestamp_candidate(self.clock.now_millis());
        let existence = self.check(&code).await;

        if existence.is_free() {
            info!(
                code = %code,
                attempts = self.max_attempts,
                "Random attempts exhausted, using timestamp barcode"
            );
            return Ok(AllocatedBarcode {
                code,
                source: BarcodeSource::Timestamp,
                verified: existence == Existence::Absent,
            });
        }

        Err(Exhausted {
            attempts: self.max_attempts,
        })
    }

    async fn check(&self, code: &Barcode) -> Existence {
        match self.witness.exists_by_barcode(code.as_str()).await {
            Ok(true) => Existence::Exists,
            Ok(false) => Existence::Absent,
            Err(err) => {
                warn!(code = %code, error = %err, "Barcode check failed, treating code as free");
                Existence::CheckFailed
            }
        }
    }

    /// Runs `f` with the seeded generator if set, else the thread RNG.
    /// Never held across an await.
    fn with_rng<T>(&self, f: impl FnOnce(&mut dyn rand::RngCore) -> T) -> T {
        match &self.rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                f(&mut *guard)
            }
            None => f(&mut rand::thread_rng()),
        }
    }
}

impl<W> std::fmt::Debug for BarcodeAllocator<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarcodeAllocator")
            .field("max_attempts", &self.max_attempts)
            .field("write_attempts", &self.write_attempts)
            .field("seeded", &self.rng.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store with a fixed set of codes; counts and records every check.
    #[derive(Default)]
    struct MemoryStore {
        codes: Mutex<HashSet<String>>,
        checked: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn record(&self, code: &str) {
            self.codes.lock().unwrap().insert(code.to_string());
        }

        fn checked(&self) -> Vec<String> {
            self.checked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BarcodeWitness for MemoryStore {
        async fn exists_by_barcode(&self, code: &str) -> DbResult<bool> {
            self.checked.lock().unwrap().push(code.to_string());
            Ok(self.codes.lock().unwrap().contains(code))
        }
    }

    /// Every code exists.
    #[derive(Default)]
    struct FullStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BarcodeWitness for FullStore {
        async fn exists_by_barcode(&self, _code: &str) -> DbResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    /// Fails the first check, then reports everything as free.
    #[derive(Default)]
    struct FlakyStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BarcodeWitness for FlakyStore {
        async fn exists_by_barcode(&self, _code: &str) -> DbResult<bool> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(DbError::ConnectionFailed("store unavailable".to_string()));
            }
            Ok(false)
        }
    }

    /// Random codes all exist; only the timestamp code is free.
    struct OnlyTimestampFree {
        timestamp_code: String,
    }

    #[async_trait]
    impl BarcodeWitness for OnlyTimestampFree {
        async fn exists_by_barcode(&self, code: &str) -> DbResult<bool> {
            Ok(code != self.timestamp_code)
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        // 1_718_000_123_456 ms
        Arc::new(FixedClock(Utc.timestamp_millis_opt(1_718_000_123_456).unwrap()))
    }

    fn is_twelve_digits(code: &str) -> bool {
        code.len() == 12 && code.bytes().all(|b| b.is_ascii_digit())
    }

    #[tokio::test]
    async fn test_empty_store_accepts_first_candidate() {
        let allocator = BarcodeAllocator::new(MemoryStore::default()).with_seed(7);

        let allocated = allocator.allocate().await;

        assert_eq!(allocated.source, BarcodeSource::Random { attempt: 1 });
        assert!(allocated.verified);
        assert!(is_twelve_digits(allocated.code.as_str()));
        let value: u64 = allocated.code.as_str().parse().unwrap();
        assert!((100_000_000_000..=999_999_999_999).contains(&value));
        assert_eq!(allocator.witness().checked(), vec![allocated.code.into_inner()]);
    }

    #[tokio::test]
    async fn test_returned_code_was_checked() {
        let allocator = BarcodeAllocator::new(MemoryStore::default()).with_seed(11);

        for _ in 0..20 {
            let code = allocator.generate_unique_barcode().await;
            assert!(allocator.witness().checked().contains(&code));
        }
    }

    #[tokio::test]
    async fn test_exhaustion_returns_unchecked_code() {
        let allocator = BarcodeAllocator::new(FullStore::default())
            .with_clock(fixed_clock())
            .with_seed(3);

        let allocated = allocator.allocate().await;

        assert_eq!(allocated.source, BarcodeSource::Unchecked);
        assert!(!allocated.verified);
        assert!(is_twelve_digits(allocated.code.as_str()));
        assert!(allocated.code.as_str().starts_with("00123456"));
        // 10 random checks + 1 timestamp check, nothing for the unchecked code.
        assert_eq!(allocator.witness().calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_check_error_fails_open() {
        let allocator = BarcodeAllocator::new(FlakyStore::default());

        let allocated = allocator.allocate().await;

        assert_eq!(allocated.source, BarcodeSource::Random { attempt: 1 });
        assert!(!allocated.verified);
        assert!(is_twelve_digits(allocated.code.as_str()));
        assert_eq!(allocator.witness().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timestamp_fallback() {
        let clock = fixed_clock();
        let allocator = BarcodeAllocator::new(OnlyTimestampFree {
            timestamp_code: "718000123456".to_string(),
        })
        .with_clock(clock)
        .with_max_attempts(4);

        let allocated = allocator.allocate().await;

        assert_eq!(allocated.source, BarcodeSource::Timestamp);
        assert!(allocated.verified);
        assert_eq!(allocated.code.as_str(), "718000123456");
    }

    #[tokio::test]
    async fn test_max_attempts_respected() {
        let allocator = BarcodeAllocator::new(FullStore::default())
            .with_clock(fixed_clock())
            .with_max_attempts(2);

        allocator.allocate().await;

        assert_eq!(allocator.witness().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sequential_calls_differ_when_recorded() {
        let allocator = BarcodeAllocator::new(MemoryStore::default());

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let code = allocator.generate_unique_barcode().await;
            allocator.witness().record(&code);
            assert!(seen.insert(code), "allocator returned a recorded code");
        }
    }

    #[tokio::test]
    async fn test_collision_moves_to_next_attempt() {
        let store = MemoryStore::default();
        // Pre-record what seed 5 draws first.
        let first = {
            let mut rng = StdRng::seed_from_u64(5);
            random_candidate(&mut rng).into_inner()
        };
        store.record(&first);

        let allocator = BarcodeAllocator::new(store).with_seed(5);
        let allocated = allocator.allocate().await;

        assert_eq!(allocated.source, BarcodeSource::Random { attempt: 2 });
        assert_ne!(allocated.code.as_str(), first);
    }

    #[tokio::test]
    async fn test_works_through_arc() {
        let store = Arc::new(MemoryStore::default());
        let allocator = BarcodeAllocator::new(Arc::clone(&store));

        let code = allocator.generate_unique_barcode().await;
        assert_eq!(store.checked(), vec![code]);
    }

    #[test]
    fn test_config_from_env() {
        // Only test touching this variable; cases run sequentially.
        let cases = [("0", 10), ("x", 10), ("", 10), (" 4 ", 4), ("1", 1)];
        for (raw, expected) in cases {
            std::env::set_var(MAX_ATTEMPTS_ENV, raw);
            assert_eq!(
                AllocatorConfig::from_env().max_attempts,
                expected,
                "{MAX_ATTEMPTS_ENV}={raw:?}"
            );
        }

        std::env::remove_var(MAX_ATTEMPTS_ENV);
        assert_eq!(AllocatorConfig::from_env(), AllocatorConfig::default());
    }

    #[test]
    fn test_config_builder_clamps() {
        let config = AllocatorConfig::default().max_attempts(0).write_attempts(0);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.write_attempts, 1);
        assert_eq!(AllocatorConfig::default().max_attempts, 10);
        assert_eq!(AllocatorConfig::default().write_attempts, 3);
    }
}
