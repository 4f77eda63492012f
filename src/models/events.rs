//! Side-channel event shapes emitted by the engine.
//!
//! Neither of these is an error: a contradiction signal marks a low-confidence
//! conflict recorded for external review, and a reminder event marks a
//! commitment crossing its due threshold. Delivery is the host's concern.

use crate::models::{AssertionId, EntityId, ObjectValue, SlotKey};
use serde::{Deserialize, Serialize};

/// A recorded contradiction between an active assertion and a candidate
/// whose confidence fell below the configured floor.
///
/// The candidate is still written as `active` so multiple sources can be
/// tracked, but the conflict is surfaced here instead of silently
/// overwriting the stronger fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionSignal {
    /// The contended (subject, predicate) slot.
    pub slot: SlotKey,
    /// The previously active assertion.
    pub existing_id: AssertionId,
    /// The existing assertion's object value.
    pub existing_object: ObjectValue,
    /// The existing assertion's confidence.
    pub existing_confidence: f32,
    /// The newly written, conflicting assertion.
    pub candidate_id: AssertionId,
    /// The candidate's object value.
    pub candidate_object: ObjectValue,
    /// The candidate's confidence.
    pub candidate_confidence: f32,
    /// When the conflict was detected (Unix seconds).
    pub detected_at: i64,
}

/// A reminder computed by the scheduler for a due or soon-due commitment.
///
/// Consumed by an external notification collaborator; the engine computes
/// *what* is due and *when*, never how it is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEvent {
    /// The commitment entity's id.
    pub commitment_id: EntityId,
    /// Absolute due timestamp.
    pub due_at: i64,
    /// Seconds past due at evaluation time; negative when the commitment is
    /// upcoming within the horizon.
    pub lateness_seconds: i64,
}
