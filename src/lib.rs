//! # Mnemograph
//!
//! A temporal knowledge-graph memory engine for conversational agents.
//!
//! Mnemograph ingests structured assertions extracted from dialogue (by an
//! external extraction collaborator), versions them over time, resolves
//! contradictions between them, and answers point-in-time and "as-of-now"
//! queries plus commitment/reminder tracking with due-date semantics.
//!
//! ## Architecture
//!
//! - Append-only temporal graph store with per-slot write serialization
//! - Synchronous contradiction resolution on every write
//! - Commitment tracker with monotonic lifecycle states
//! - Pure, concurrency-safe read paths (entity lookup, as-of snapshots,
//!   windowed recall, due/overdue listings)
//!
//! ## Example
//!
//! ```rust
//! use mnemograph::{MemoryEngine, IngestFact, MnemographConfig};
//!
//! let engine = MemoryEngine::in_memory(MnemographConfig::default());
//! engine.ingest(IngestFact {
//!     subject: "Alice".to_string(),
//!     predicate: "favorite_color".to_string(),
//!     object: "blue".to_string(),
//!     observed_at: 100,
//!     confidence: 0.9,
//!     provenance: "conv-1/msg-4".to_string(),
//! }).unwrap();
//!
//! let facts = engine.query().active_facts("Alice").unwrap();
//! assert_eq!(facts.len(), 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod engine;
pub mod graph;
pub mod models;
pub mod policy;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::MnemographConfig;
pub use engine::MemoryEngine;
pub use models::{
    Assertion, AssertionId, AssertionStatus, Commitment, CommitmentState, ContradictionSignal,
    Entity, EntityId, EntityKind, IngestFact, ObjectValue, Predicate, ReminderEvent,
};
pub use graph::{GraphStats, WriteDecision, WriteOutcome};
pub use policy::{PredicatePolicy, PredicateRegistry};
pub use services::{
    CommitmentTracker, EntityView, FactNormalizer, FactView, QueryEngine, ReminderEvaluator,
};
pub use storage::{DurableStore, InMemoryDurableStore};

/// Error type for mnemograph operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Retryable |
/// |---------|-------------|-----------|
/// | `Validation` | Malformed ingest tuple (missing fields, confidence out of range) | No |
/// | `UnresolvedEntity` | Strict-mode alias resolution fails to clear the fuzzy threshold | No (needs disambiguation) |
/// | `InvalidTransition` | Commitment state change violates the monotonic lifecycle | No |
/// | `WriteConflict` | Slot stayed contended past the bounded internal retries | Yes |
/// | `StoreUnavailable` | Durable substrate append/read failed; nothing was committed | Yes (whole transaction) |
///
/// Contradictions below the confidence floor are *not* errors: they are
/// recorded and surfaced as [`models::ContradictionSignal`] values on the
/// write outcome, distinct from failure.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed ingest input, rejected before reaching the normalizer.
    ///
    /// Raised when:
    /// - Subject or predicate is empty
    /// - Confidence is outside `[0, 1]` or not finite
    /// - A due expression on a commitment cannot be parsed
    #[error("invalid ingest: {0}")]
    Validation(String),

    /// Strict-mode alias resolution failed.
    ///
    /// The surface form did not match any known entity above the configured
    /// fuzzy threshold. Surfaced to the caller for disambiguation; the engine
    /// does not create an entity optimistically in strict mode.
    #[error("unresolved entity: no match for '{surface}' above threshold {threshold}")]
    UnresolvedEntity {
        /// The surface form that could not be resolved.
        surface: String,
        /// The fuzzy threshold that was in effect.
        threshold: f32,
    },

    /// Illegal commitment state change.
    ///
    /// Terminal states (fulfilled, broken, cancelled) are final; the caller
    /// must not retry with the same request.
    #[error("invalid commitment transition: {from} -> {to}")]
    InvalidTransition {
        /// The commitment's current state.
        from: models::CommitmentState,
        /// The rejected target state.
        to: models::CommitmentState,
    },

    /// Concurrent writers contended on the same (subject, predicate) slot
    /// past the bounded internal retries.
    #[error("write conflict on slot '{slot}' after {attempts} attempts")]
    WriteConflict {
        /// The contended slot, formatted as `subject/PREDICATE`.
        slot: String,
        /// Number of acquisition attempts made before giving up.
        attempts: u32,
    },

    /// The durable substrate failed or timed out.
    ///
    /// The write path treats this as a failed transaction: no partial state
    /// is left behind and the caller may retry the whole operation.
    #[error("durable store unavailable during '{operation}': {cause}")]
    StoreUnavailable {
        /// The operation that was in flight.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for mnemograph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized so every component shares one clock convention. Falls back to
/// 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
