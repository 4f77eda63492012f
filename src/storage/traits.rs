//! Durable substrate trait.
//!
//! Persistence-to-disk mechanics are delegated to an external collaborator
//! exposed through this trait: an abstract key-value/log-structured store
//! with `append`/`read` semantics and per-key atomicity. The on-disk layout
//! is the implementor's concern.
//!
//! # Implementor Notes
//!
//! - Methods use `&self` to enable sharing via `Arc<dyn DurableStore>`
//! - Use interior mutability for mutable state
//! - `append` must be atomic per key: a record is either fully appended or
//!   absent, never torn
//! - Failures and timeouts must surface as [`crate::Error::StoreUnavailable`];
//!   the write path treats them as a failed transaction and leaves no
//!   partial in-memory state behind

use crate::models::{Assertion, AssertionId, Entity, EntityId};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One record in the engine's durable log.
///
/// Records mirror the engine's append-only mutations one-to-one, so a log
/// replay reproduces the in-memory state exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum DurableRecord {
    /// A new entity was created.
    EntityCreated(Entity),
    /// An alias was attached to an existing entity.
    AliasAdded {
        /// The entity receiving the alias.
        entity: EntityId,
        /// The new alias.
        alias: String,
    },
    /// A new assertion version was appended.
    AssertionAppended(Assertion),
    /// An open interval was closed by a superseding assertion.
    IntervalClosed {
        /// The assertion whose interval was closed.
        assertion: AssertionId,
        /// The new exclusive end of its validity interval.
        valid_to: i64,
        /// The superseding assertion.
        superseded_by: AssertionId,
    },
    /// A reaffirmation raised an assertion's confidence in place.
    ConfidenceRaised {
        /// The reaffirmed assertion.
        assertion: AssertionId,
        /// The new confidence value.
        confidence: f32,
    },
    /// An assertion was retracted (status flag; history preserved).
    Retracted {
        /// The retracted assertion.
        assertion: AssertionId,
        /// When the retraction took effect.
        retracted_at: i64,
    },
}

/// Trait for the abstract durable key-value substrate.
pub trait DurableStore: Send + Sync {
    /// Appends a record under the given key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the substrate failed or
    /// timed out; the record must not be partially written.
    fn append(&self, key: &str, record: &DurableRecord) -> Result<()>;

    /// Reads all records appended under the given key, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the substrate failed or
    /// timed out.
    fn read(&self, key: &str) -> Result<Vec<DurableRecord>>;
}

/// Key under which an entity's records are logged.
#[must_use]
pub fn entity_key(id: &EntityId) -> String {
    format!("entity/{id}")
}

/// Key under which a slot's records are logged.
#[must_use]
pub fn slot_key(slot: &crate::models::SlotKey) -> String {
    format!("slot/{}/{}", slot.subject, slot.predicate)
}
