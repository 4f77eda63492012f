//! Data models for mnemograph.
//!
//! This module contains all the core data structures used throughout the
//! engine: entities, assertions, commitments, temporal intervals, and the
//! side-channel event shapes.

mod assertion;
mod commitment;
mod entity;
mod events;
pub mod normalize;
mod temporal;

pub use assertion::{
    Assertion, AssertionCandidate, AssertionId, AssertionStatus, IngestFact, ObjectValue,
    Predicate, SlotKey,
};
pub use commitment::{Commitment, CommitmentState, DueSpec};
pub use entity::{Entity, EntityId, EntityKind};
pub use events::{ContradictionSignal, ReminderEvent};
pub use temporal::{parse_timestamp, ValidityInterval};
