//! Assertion types: timestamped, versioned facts about (subject, predicate,
//! object) triples.
//!
//! Assertions are immutable once written. An update is modeled as closing
//! the old assertion's validity interval and opening a new assertion, so the
//! full version history of every slot is preserved. The only sanctioned
//! in-place mutations are interval closure (supersession), the reaffirmation
//! confidence bump, and the retraction status flag.

use crate::models::normalize::canonical_predicate;
use crate::models::temporal::ValidityInterval;
use crate::models::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an assertion version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionId(String);

impl AssertionId {
    /// Generates a fresh assertion ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("asrt_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Wraps an existing ID string (used when replaying durable records).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A canonical predicate label in `UPPER_SNAKE_CASE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    /// Canonicalizes a raw predicate label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(canonical_predicate(label))
    }

    /// Returns the predicate as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The (subject, predicate) pair that single-valued assertions contend over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    /// Subject entity.
    pub subject: EntityId,
    /// Canonical predicate.
    pub predicate: Predicate,
}

impl SlotKey {
    /// Creates a slot key.
    #[must_use]
    pub const fn new(subject: EntityId, predicate: Predicate) -> Self {
        Self { subject, predicate }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject, self.predicate)
    }
}

/// The object side of an assertion: another entity, or a literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectValue {
    /// Reference to another entity in the graph.
    Entity(EntityId),
    /// Literal value kept verbatim (names, ages, phone numbers, topics).
    Literal(String),
}

impl ObjectValue {
    /// Returns the entity ID if this object is entity-typed.
    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Literal(_) => None,
        }
    }

    /// Case-insensitive value equality, used for reaffirmation detection.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Entity(a), Self::Entity(b)) => a == b,
            (Self::Literal(a), Self::Literal(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => false,
        }
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "{id}"),
            Self::Literal(v) => write!(f, "\"{v}\""),
        }
    }
}

/// Lifecycle status of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    /// Currently considered true.
    Active,
    /// Interval closed by a later assertion on the same slot.
    Superseded,
    /// Explicitly withdrawn; kept for auditability.
    Retracted,
}

impl fmt::Display for AssertionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Superseded => "superseded",
            Self::Retracted => "retracted",
        };
        write!(f, "{s}")
    }
}

/// A timestamped, versioned fact about a (subject, predicate, object) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier of this version.
    pub id: AssertionId,
    /// Subject entity.
    pub subject: EntityId,
    /// Canonical predicate.
    pub predicate: Predicate,
    /// Object entity or literal.
    pub object: ObjectValue,
    /// Validity interval `[valid_from, valid_to)`.
    pub interval: ValidityInterval,
    /// Event time: when the fact was observed in the conversation.
    /// Equals `interval.valid_from`; superseding chains order by this.
    pub observed_at: i64,
    /// Transaction time: when the engine recorded this version.
    pub recorded_at: i64,
    /// Source confidence in `[0, 1]`; reaffirmations may raise it.
    pub confidence: f32,
    /// Originating conversation/message id.
    pub provenance: String,
    /// Current status.
    pub status: AssertionStatus,
    /// The assertion that closed this one's interval, if any.
    pub superseded_by: Option<AssertionId>,
    /// When the retraction flag was set, if ever.
    pub retracted_at: Option<i64>,
}

impl Assertion {
    /// Returns the slot this assertion contends over.
    #[must_use]
    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.subject.clone(), self.predicate.clone())
    }

    /// Reconstructs whether this assertion was active at `as_of`.
    ///
    /// Status is not time-travelled; only intervals are. An assertion that is
    /// `Superseded` today was still active at any instant inside its (now
    /// closed) interval. Retraction is the exception: it carries its own
    /// timestamp, and the assertion counts as active before it.
    #[must_use]
    pub fn was_active_at(&self, as_of: i64) -> bool {
        self.interval.contains(as_of) && self.retracted_at.is_none_or(|r| as_of < r)
    }
}

/// A normalized assertion candidate, produced by the fact normalizer and
/// consumed by the graph store's write path.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionCandidate {
    /// Subject entity (guaranteed to exist at write time).
    pub subject: EntityId,
    /// Canonical predicate.
    pub predicate: Predicate,
    /// Object entity (guaranteed to exist) or literal.
    pub object: ObjectValue,
    /// Event time from the ingest tuple.
    pub observed_at: i64,
    /// Source confidence in `[0, 1]`.
    pub confidence: f32,
    /// Originating conversation/message id.
    pub provenance: String,
}

impl AssertionCandidate {
    /// Returns the slot this candidate targets.
    #[must_use]
    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.subject.clone(), self.predicate.clone())
    }

    /// Materializes the candidate as an active assertion opening at its
    /// observed time.
    #[must_use]
    pub fn into_assertion(self, recorded_at: i64) -> Assertion {
        Assertion {
            id: AssertionId::generate(),
            subject: self.subject,
            predicate: self.predicate,
            object: self.object,
            interval: ValidityInterval::open(self.observed_at),
            observed_at: self.observed_at,
            recorded_at,
            confidence: self.confidence,
            provenance: self.provenance,
            status: AssertionStatus::Active,
            superseded_by: None,
            retracted_at: None,
        }
    }
}

/// The raw ingest tuple from the extraction collaborator.
///
/// This is the sole external input format the engine accepts. Malformed
/// tuples are rejected with [`crate::Error::Validation`] before reaching the
/// normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFact {
    /// Raw subject surface form.
    pub subject: String,
    /// Raw predicate label.
    pub predicate: String,
    /// Raw object surface form or literal value.
    pub object: String,
    /// When the fact was observed (Unix seconds).
    pub observed_at: i64,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f32,
    /// Originating conversation/message id.
    pub provenance: String,
}

impl IngestFact {
    /// Validates the tuple shape.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] when the subject or predicate is
    /// empty, or the confidence is not a finite value in `[0, 1]`.
    pub fn validate(&self) -> crate::Result<()> {
        if self.subject.trim().is_empty() {
            return Err(crate::Error::Validation("subject is empty".to_string()));
        }
        if self.predicate.trim().is_empty() {
            return Err(crate::Error::Validation("predicate is empty".to_string()));
        }
        if self.object.trim().is_empty() {
            return Err(crate::Error::Validation("object is empty".to_string()));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(crate::Error::Validation(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}
