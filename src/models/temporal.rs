//! Temporal types for assertion versioning.
//!
//! Every assertion carries a validity interval describing when its fact held
//! in the real world, plus a transaction timestamp describing when the engine
//! recorded it. The two are independent: a late-arriving fact can open an
//! interval far in the past.
//!
//! # Interval Semantics
//!
//! Validity intervals are half-open `[valid_from, valid_to)`:
//!
//! - `valid_from` is inclusive and always known (the assertion's event time)
//! - `valid_to` is exclusive; `None` means "until superseded" (∞)
//!
//! Intervals are never mutated in place except to *close* an open interval
//! when a later assertion supersedes it. Past records stay as written.
//!
//! The empty interval `[t, t)` is a legal degenerate case: it contains no
//! instant. The store records tie-losing observations with it, so the losing
//! value stays in history without ever being the active answer.
//!
//! # Example
//!
//! ```rust
//! use mnemograph::models::ValidityInterval;
//!
//! let interval = ValidityInterval::open(100);
//! assert!(interval.contains(100));
//! assert!(interval.contains(5_000));
//!
//! let closed = interval.closed_at(200);
//! assert!(closed.contains(199));
//! assert!(!closed.contains(200));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open validity interval `[valid_from, valid_to)` in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// Start of validity (inclusive).
    pub valid_from: i64,
    /// End of validity (exclusive); `None` until superseded.
    pub valid_to: Option<i64>,
}

impl ValidityInterval {
    /// Creates an open interval starting at `valid_from`.
    #[must_use]
    pub const fn open(valid_from: i64) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    /// Creates a bounded interval.
    ///
    /// Callers must uphold `valid_from <= valid_to`. Equal bounds make an
    /// empty interval that contains no instant.
    #[must_use]
    pub const fn between(valid_from: i64, valid_to: i64) -> Self {
        Self {
            valid_from,
            valid_to: Some(valid_to),
        }
    }

    /// Returns a copy of this interval closed at `end`.
    #[must_use]
    pub const fn closed_at(self, end: i64) -> Self {
        Self {
            valid_from: self.valid_from,
            valid_to: Some(end),
        }
    }

    /// Checks if the given timestamp falls within this interval.
    #[must_use]
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.valid_from && self.valid_to.is_none_or(|end| timestamp < end)
    }

    /// Returns true if the interval has no end (not yet superseded).
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Returns true if the interval is well-formed (`valid_from <= valid_to`
    /// whenever `valid_to` is finite). Empty intervals are well-formed; an
    /// end before the start is not.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.valid_to.is_none_or(|end| self.valid_from <= end)
    }
}

impl fmt::Display for ValidityInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.valid_to {
            Some(end) => write!(f, "[{}, {})", self.valid_from, end),
            None => write!(f, "[{}, ∞)", self.valid_from),
        }
    }
}

/// Parses an ingest timestamp that may be epoch seconds or RFC 3339.
///
/// The extraction collaborator sends whichever form it has; both are
/// normalized to Unix seconds at the edge.
///
/// # Errors
///
/// Returns `None` if the string is neither an integer nor a parseable
/// RFC 3339 timestamp.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<i64>() {
        return Some(secs);
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.timestamp())
}
