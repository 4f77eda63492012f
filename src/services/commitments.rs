//! Commitment tracker.
//!
//! A derived view over commitment-kind entities: each commitment is an
//! entity whose description, due timestamp, owner, and lifecycle state live
//! as ordinary single-valued assertions on that entity. The tracker never
//! keeps state of its own, so commitments participate in temporal queries
//! like any other fact: `state_at` an earlier instant reconstructs what the
//! lifecycle looked like then.

use crate::graph::TemporalGraphStore;
use crate::models::{
    Commitment, CommitmentState, DueSpec, Entity, EntityId, EntityKind, ObjectValue, Predicate,
};
use crate::models::{AssertionCandidate, AssertionId};
use crate::{current_timestamp, Error, Result};
use std::sync::Arc;
use tracing::info;

/// Assertion slots a commitment entity carries.
const DESCRIPTION: &str = "DESCRIPTION";
const DUE_AT: &str = "DUE_AT";
const STATE: &str = "STATE";
const OWNED_BY: &str = "OWNED_BY";
const HAS_COMMITMENT: &str = "HAS_COMMITMENT";

/// Tracks promises, tasks, and events with due-date semantics.
#[derive(Clone)]
pub struct CommitmentTracker {
    graph: Arc<TemporalGraphStore>,
}

impl CommitmentTracker {
    /// Creates a tracker over the given graph.
    #[must_use]
    pub fn new(graph: Arc<TemporalGraphStore>) -> Self {
        Self { graph }
    }

    /// Registers a new open commitment for `owner`.
    ///
    /// `due` accepts absolute timestamps (epoch seconds, RFC 3339) and
    /// relative expressions ("in 3 days", "tomorrow 4pm"); relative forms
    /// are resolved against the current clock at registration and stored
    /// absolute.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the owner does not exist, the description
    ///   is empty, or the due expression cannot be parsed
    /// - [`Error::StoreUnavailable`] if any underlying append fails
    pub fn register(
        &self,
        owner: &EntityId,
        description: &str,
        due: Option<&str>,
    ) -> Result<Commitment> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::Validation(
                "empty commitment description".to_string(),
            ));
        }
        if !self.graph.entity_exists(owner) {
            return Err(Error::Validation(format!(
                "unknown commitment owner '{owner}'"
            )));
        }

        let now = current_timestamp();
        let due_at = due.map(|raw| DueSpec::parse(raw).map(|spec| spec.resolve(now)))
            .transpose()?;

        let entity = Entity::new(EntityKind::Commitment, description, now)
            .with_id(unique_commitment_id());
        let id = self.graph.create_entity(entity)?;

        self.write_slot(&id, DESCRIPTION, ObjectValue::Literal(description.to_string()), now)?;
        self.write_slot(&id, STATE, state_literal(CommitmentState::Open), now)?;
        self.write_slot(&id, OWNED_BY, ObjectValue::Entity(owner.clone()), now)?;
        if let Some(due_at) = due_at {
            self.write_slot(&id, DUE_AT, ObjectValue::Literal(due_at.to_string()), now)?;
        }
        self.graph.write(AssertionCandidate {
            subject: owner.clone(),
            predicate: Predicate::new(HAS_COMMITMENT),
            object: ObjectValue::Entity(id.clone()),
            observed_at: now,
            confidence: 1.0,
            provenance: "commitment-tracker".to_string(),
        })?;

        info!(commitment = %id, owner = %owner, due_at, "commitment registered");
        Ok(Commitment {
            id,
            owner: owner.clone(),
            description: description.to_string(),
            due_at,
            state: CommitmentState::Open,
            created_at: now,
        })
    }

    /// Transitions a commitment to a terminal state.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the id is not a known commitment
    /// - [`Error::InvalidTransition`] if the commitment has already left
    ///   `open`, or the target is `open`
    pub fn mark(&self, id: &EntityId, target: CommitmentState) -> Result<Commitment> {
        let now = current_timestamp();
        let current = self.get(id).ok_or_else(|| {
            Error::Validation(format!("unknown commitment '{id}'"))
        })?;
        if !current.state.can_transition_to(target) {
            return Err(Error::InvalidTransition {
                from: current.state,
                to: target,
            });
        }

        // STATE is single-valued, so this supersedes the open state and the
        // transition instant is preserved in the slot's history.
        self.write_slot(id, STATE, state_literal(target), now)?;
        info!(commitment = %id, from = %current.state, to = %target, "commitment transition");
        Ok(Commitment {
            state: target,
            ..current
        })
    }

    /// Loads a commitment's current view, or `None` if the id is not a
    /// commitment-kind entity.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<Commitment> {
        self.at(id, None)
    }

    /// Reconstructs a commitment as it stood at `as_of`.
    #[must_use]
    pub fn at(&self, id: &EntityId, as_of: Option<i64>) -> Option<Commitment> {
        let entity = self.graph.get_entity(id)?;
        if !entity.kind.has_lifecycle() {
            return None;
        }

        let slot = |predicate: &str| {
            self.graph
                .get_active(id, &Predicate::new(predicate), as_of)
                .into_iter()
                .next()
                .map(|a| a.object)
        };

        let owner = match slot(OWNED_BY)? {
            ObjectValue::Entity(owner) => owner,
            ObjectValue::Literal(_) => return None,
        };
        let description = match slot(DESCRIPTION) {
            Some(ObjectValue::Literal(d)) => d,
            _ => entity.name.clone(),
        };
        let due_at = match slot(DUE_AT) {
            Some(ObjectValue::Literal(raw)) => raw.parse().ok(),
            _ => None,
        };
        let state = match slot(STATE) {
            Some(ObjectValue::Literal(raw)) => CommitmentState::parse(&raw)?,
            // Registered but not yet visible at this instant.
            _ => return None,
        };

        Some(Commitment {
            id: entity.id,
            owner,
            description,
            due_at,
            state,
            created_at: entity.created_at,
        })
    }

    /// All commitments, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Commitment> {
        let mut all: Vec<Commitment> = self
            .graph
            .entities_snapshot()
            .into_iter()
            .filter(|e| e.kind.has_lifecycle())
            .filter_map(|e| self.get(&e.id))
            .collect();
        all.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        all
    }

    /// Open commitments due inside `[start, end]`, ascending by due time,
    /// ties broken by id for a stable order.
    #[must_use]
    pub fn due_between(&self, start: i64, end: i64) -> Vec<Commitment> {
        let mut due: Vec<Commitment> = self
            .list()
            .into_iter()
            .filter(|c| c.state == CommitmentState::Open)
            .filter(|c| c.due_at.is_some_and(|d| d >= start && d <= end))
            .collect();
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        due
    }

    /// Open commitments whose due time has passed at `as_of`, ascending by
    /// due time, ties broken by id.
    #[must_use]
    pub fn overdue(&self, as_of: i64) -> Vec<Commitment> {
        let mut late: Vec<Commitment> = self
            .list()
            .into_iter()
            .filter(|c| c.is_overdue(as_of))
            .collect();
        late.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        late
    }

    fn write_slot(
        &self,
        id: &EntityId,
        predicate: &str,
        object: ObjectValue,
        observed_at: i64,
    ) -> Result<AssertionId> {
        let outcome = self.graph.write(AssertionCandidate {
            subject: id.clone(),
            predicate: Predicate::new(predicate),
            object,
            observed_at,
            confidence: 1.0,
            provenance: "commitment-tracker".to_string(),
        })?;
        Ok(outcome.assertion_id)
    }
}

fn state_literal(state: CommitmentState) -> ObjectValue {
    ObjectValue::Literal(state.as_str().to_string())
}

fn unique_commitment_id() -> EntityId {
    EntityId::new(format!("cmt_{}", uuid::Uuid::new_v4().simple()))
}
