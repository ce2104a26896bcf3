//! # Barcode Candidates
//!
//! Formats of the codes the allocator in `shelf-db` proposes for new items.
//!
//! ## Candidate Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where Each Format Comes From                         │
//! │                                                                         │
//! │  Random (attempts 1..=10)                                              │
//! │    uniform in [100000000000, 999999999999]   →  "483920175562"         │
//! │                                                                         │
//! │  Timestamp (all random attempts collided)                              │
//! │    epoch ms 1718000123456 → last 12 digits   →  "718000123456"         │
//! │                                                                         │
//! │  Unchecked (timestamp collided too)                                    │
//! │    last 8 ms digits + 4 random digits        →  "00123456" + "0042"    │
//! │                                                                         │
//! │  All three are exactly 12 ASCII digits. None carries a check digit,    │
//! │  so they are NOT valid EAN-13/UPC-A symbols.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Randomness and time are parameters; nothing here touches the system.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::validation::{validate_barcode, ValidationResult};

// =============================================================================
// Constants
// =============================================================================

/// Length of every generated code.
pub const BARCODE_LEN: usize = 12;

/// Smallest random candidate (12 digits, no leading zero).
pub const CANDIDATE_MIN: u64 = 100_000_000_000;

/// Largest random candidate.
pub const CANDIDATE_MAX: u64 = 999_999_999_999;

/// Random attempts before falling back to the timestamp code.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const UNCHECKED_TIMESTAMP_DIGITS: usize = 8;
const UNCHECKED_RANDOM_MAX: u16 = 9_999;

// =============================================================================
// Barcode
// =============================================================================

/// A string of decimal digits used as an item barcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Barcode(String);

impl Barcode {
    /// Parses a scanned or typed code.
    ///
    /// ## Example
    /// ```rust
    /// use shelf_core::Barcode;
    ///
    /// assert!(Barcode::parse("5901234123457").is_ok());
    /// assert!(Barcode::parse("59012A").is_err());
    /// ```
    pub fn parse(code: &str) -> ValidationResult<Self> {
        let code = code.trim();
        validate_barcode(code)?;
        Ok(Barcode(code.to_string()))
    }

    /// Wraps digits produced by this module. Callers guarantee the format.
    fn from_digits(digits: String) -> Self {
        debug_assert!(digits.bytes().all(|b| b.is_ascii_digit()));
        Barcode(digits)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for exactly [`BARCODE_LEN`] ASCII digits.
    pub fn is_generated_shape(&self) -> bool {
        self.0.len() == BARCODE_LEN && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Barcode> for String {
    fn from(code: Barcode) -> Self {
        code.0
    }
}

// =============================================================================
// Source
// =============================================================================

/// Which step of the allocation chain produced a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BarcodeSource {
    /// Random candidate accepted on the given 1-based attempt.
    Random { attempt: u32 },
    /// Timestamp fallback after every random attempt collided.
    Timestamp,
    /// Last-resort code returned without an existence check.
    Unchecked,
}

// =============================================================================
// Candidate Generators
// =============================================================================

/// Draws a uniform random candidate in `[CANDIDATE_MIN, CANDIDATE_MAX]`.
pub fn random_candidate<R: Rng + ?Sized>(rng: &mut R) -> Barcode {
    let value = rng.gen_range(CANDIDATE_MIN..=CANDIDATE_MAX);
    Barcode::from_digits(value.to_string())
}

/// Last 12 digits of the epoch-millisecond timestamp, left-padded with `0`.
///
/// ## Example
/// ```rust
/// use shelf_core::barcode::timestamp_candidate;
///
/// assert_eq!(timestamp_candidate(1_718_000_123_456).as_str(), "718000123456");
/// assert_eq!(timestamp_candidate(42).as_str(), "000000000042");
/// ```
pub fn timestamp_candidate(millis: u64) -> Barcode {
    Barcode::from_digits(format!(
        "{:0>width$}",
        tail(&millis.to_string(), BARCODE_LEN),
        width = BARCODE_LEN
    ))
}

/// Last 8 timestamp digits followed by a 4-digit zero-padded random number.
///
/// Used only when nothing else could be verified; the result is never
/// checked against the store.
pub fn unchecked_candidate<R: Rng + ?Sized>(millis: u64, rng: &mut R) -> Barcode {
    let suffix: u16 = rng.gen_range(0..=UNCHECKED_RANDOM_MAX);
    Barcode::from_digits(format!(
        "{:0>width$}{:04}",
        tail(&millis.to_string(), UNCHECKED_TIMESTAMP_DIGITS),
        suffix,
        width = UNCHECKED_TIMESTAMP_DIGITS
    ))
}

fn tail(digits: &str, n: usize) -> &str {
    // ASCII only, so byte offsets are char offsets.
    &digits[digits.len().saturating_sub(n)..]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_candidate_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let code = random_candidate(&mut rng);
            assert!(code.is_generated_shape(), "bad candidate {code}");
            assert_ne!(code.as_str().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn test_timestamp_candidate_truncates_and_pads() {
        assert_eq!(timestamp_candidate(1_718_000_123_456).as_str(), "718000123456");
        assert_eq!(timestamp_candidate(999_999_999_999).as_str(), "999999999999");
        assert_eq!(timestamp_candidate(0).as_str(), "000000000000");
        assert_eq!(timestamp_candidate(12_345).as_str(), "000000012345");
    }

    #[test]
    fn test_unchecked_candidate_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = unchecked_candidate(1_718_000_123_456, &mut rng);

        assert!(code.is_generated_shape());
        assert!(code.as_str().starts_with("00123456"));
    }

    #[test]
    fn test_unchecked_candidate_short_timestamp() {
        let mut rng = StdRng::seed_from_u64(2);
        let code = unchecked_candidate(77, &mut rng);
        assert!(code.as_str().starts_with("00000077"));
        assert_eq!(code.as_str().len(), BARCODE_LEN);
    }

    #[test]
    fn test_parse_trims_and_validates() {
        assert_eq!(Barcode::parse(" 590123412345 ").unwrap().as_str(), "590123412345");
        assert!(Barcode::parse("").is_err());
        assert!(Barcode::parse("1234").is_err());
        assert!(Barcode::parse("12345678901234").is_err());
    }

    #[test]
    fn test_barcode_serializes_as_plain_string() {
        let code = Barcode::parse("123456789012").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"123456789012\"");
    }

    proptest! {
        #[test]
        fn random_candidates_stay_in_range(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let code = random_candidate(&mut rng);
            let value: u64 = code.as_str().parse().unwrap();
            prop_assert!((CANDIDATE_MIN..=CANDIDATE_MAX).contains(&value));
        }

        #[test]
        fn timestamp_candidates_are_twelve_digits(millis in any::<u64>()) {
            prop_assert!(timestamp_candidate(millis).is_generated_shape());
        }

        #[test]
        fn unchecked_candidates_are_twelve_digits(millis in any::<u64>(), seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            prop_assert!(unchecked_candidate(millis, &mut rng).is_generated_shape());
        }
    }
}
