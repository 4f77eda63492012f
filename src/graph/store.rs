//! Temporal graph store.
//!
//! An arena of entities and append-only, interval-versioned assertion logs
//! keyed by (subject, predicate) slot. Writes to a slot are serialized
//! through a per-slot exclusive section; writes to independent slots never
//! coordinate. Readers observe consistent committed snapshots and never
//! block writers.
//!
//! # Write Transaction
//!
//! Each write is atomic with respect to the resolver decision: the candidate
//! assertion and every resulting interval closure commit together, or
//! nothing commits. Durable-substrate appends happen *before* the in-memory
//! application, so a substrate outage surfaces as
//! [`crate::Error::StoreUnavailable`] with no partial state left behind.

use crate::config::MnemographConfig;
use crate::graph::resolver::{resolve, Resolution};
use crate::models::normalize::match_form;
use crate::models::{
    Assertion, AssertionCandidate, AssertionId, AssertionStatus, ContradictionSignal, Entity,
    EntityId, ObjectValue, Predicate, SlotKey, ValidityInterval,
};
use crate::policy::PredicateRegistry;
use crate::storage::{entity_key, slot_key, DurableRecord, DurableStore};
use crate::{current_timestamp, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::time::Duration;
use tracing::{debug, warn};

/// How one committed write was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    /// New active assertion, no contention.
    Inserted,
    /// Existing assertion reaffirmed; no new version written.
    Reaffirmed,
    /// New active assertion; the given number of intervals were closed.
    Superseded {
        /// How many previously active assertions were closed.
        closed: usize,
    },
    /// Out-of-order arrival recorded as already-superseded history.
    InsertedAsHistory,
    /// Written active alongside a stronger fact; contradiction flagged.
    Flagged,
}

/// Result of one committed write.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The written (or reaffirmed) assertion's id.
    pub assertion_id: AssertionId,
    /// How the write was applied.
    pub decision: WriteDecision,
    /// Present when the resolver flagged a below-floor contradiction.
    pub contradiction: Option<ContradictionSignal>,
}

/// Aggregate counts over the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Total entities (active and inactive).
    pub entity_count: usize,
    /// Total assertion versions across all slots.
    pub assertion_count: usize,
    /// Distinct (subject, predicate) slots.
    pub slot_count: usize,
}

/// The temporal knowledge graph.
///
/// Thread-safe: share via `Arc`. All methods take `&self`.
pub struct TemporalGraphStore {
    durable: Arc<dyn DurableStore>,
    registry: Arc<PredicateRegistry>,
    confidence_floor: f32,
    max_write_attempts: u32,
    write_backoff: Duration,
    entities: RwLock<HashMap<EntityId, Entity>>,
    /// Normalized surface form → entity, for exact alias resolution.
    alias_index: RwLock<HashMap<String, EntityId>>,
    /// Per-slot version chains, ordered by (`valid_from`, `recorded_at`).
    slots: RwLock<HashMap<SlotKey, Vec<Assertion>>>,
    /// Per-slot write serialization. Contention is scoped to the slot;
    /// there is no cross-entity global lock.
    slot_locks: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl TemporalGraphStore {
    /// Creates a store over the given durable substrate and policy table.
    #[must_use]
    pub fn new(
        durable: Arc<dyn DurableStore>,
        registry: Arc<PredicateRegistry>,
        config: &MnemographConfig,
    ) -> Self {
        Self {
            durable,
            registry,
            confidence_floor: config.resolution.confidence_floor,
            max_write_attempts: config.resolution.max_write_attempts,
            write_backoff: Duration::from_millis(config.resolution.write_backoff_ms),
            entities: RwLock::new(HashMap::new()),
            alias_index: RwLock::new(HashMap::new()),
            slots: RwLock::new(HashMap::new()),
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the policy table this store resolves against.
    #[must_use]
    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    // ========================================================================
    // Entity operations
    // ========================================================================

    /// Creates an entity, or returns the existing one's id if the canonical
    /// id is already taken. Indexes the name and all aliases for resolution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the durable append fails; the
    /// entity is not created in that case.
    pub fn create_entity(&self, entity: Entity) -> Result<EntityId> {
        {
            let entities = self.entities.read().map_err(poisoned_read)?;
            if entities.contains_key(&entity.id) {
                return Ok(entity.id);
            }
        }

        self.durable.append(
            &entity_key(&entity.id),
            &DurableRecord::EntityCreated(entity.clone()),
        )?;

        let mut entities = self.entities.write().map_err(poisoned_write)?;
        let mut aliases = self.alias_index.write().map_err(poisoned_write)?;
        aliases.insert(match_form(&entity.name), entity.id.clone());
        for alias in &entity.aliases {
            aliases.insert(match_form(alias), entity.id.clone());
        }
        let id = entity.id.clone();
        entities.entry(id.clone()).or_insert(entity);
        debug!(entity = %id, "entity created");
        Ok(id)
    }

    /// Retrieves an entity by id.
    #[must_use]
    pub fn get_entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.read().ok()?.get(id).cloned()
    }

    /// Returns true if the entity exists (active or inactive).
    #[must_use]
    pub fn entity_exists(&self, id: &EntityId) -> bool {
        self.entities
            .read()
            .is_ok_and(|entities| entities.contains_key(id))
    }

    /// Adds an alias to an entity and indexes it for resolution.
    ///
    /// Returns false if the entity does not exist or already carries the
    /// alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the durable append fails.
    pub fn add_alias(&self, id: &EntityId, alias: &str) -> Result<bool> {
        {
            let entities = self.entities.read().map_err(poisoned_read)?;
            match entities.get(id) {
                None => return Ok(false),
                Some(e) if e.matches_name(alias) => return Ok(false),
                Some(_) => {}
            }
        }

        self.durable.append(
            &entity_key(id),
            &DurableRecord::AliasAdded {
                entity: id.clone(),
                alias: alias.to_string(),
            },
        )?;

        let mut entities = self.entities.write().map_err(poisoned_write)?;
        let Some(entity) = entities.get_mut(id) else {
            return Ok(false);
        };
        let added = entity.add_alias(alias);
        if added {
            let mut aliases = self.alias_index.write().map_err(poisoned_write)?;
            aliases.insert(match_form(alias), id.clone());
        }
        Ok(added)
    }

    /// Marks an entity inactive. Entities are never deleted; their
    /// assertions and history remain queryable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the lock is poisoned.
    pub fn deactivate_entity(&self, id: &EntityId) -> Result<bool> {
        let mut entities = self.entities.write().map_err(poisoned_write)?;
        Ok(entities.get_mut(id).is_some_and(|e| {
            let was_active = e.active;
            e.active = false;
            was_active
        }))
    }

    /// Resolves a surface form to an entity by exact normalized match
    /// against names and aliases.
    #[must_use]
    pub fn resolve_alias(&self, surface: &str) -> Option<EntityId> {
        let form = match_form(surface);
        self.alias_index.read().ok()?.get(&form).cloned()
    }

    /// Snapshot of all entities, for fuzzy matching and listings.
    #[must_use]
    pub fn entities_snapshot(&self) -> Vec<Entity> {
        self.entities
            .read()
            .map(|entities| entities.values().cloned().collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Commits a candidate assertion.
    ///
    /// Acquires the slot's exclusive section (bounded try/backoff), invokes
    /// the contradiction resolver against the slot's current state, appends
    /// the resulting records to the durable substrate, and only then applies
    /// them in memory.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the subject or an entity-typed object does
    ///   not exist at write time
    /// - [`Error::WriteConflict`] if the slot stayed contended past the
    ///   bounded retries
    /// - [`Error::StoreUnavailable`] if the durable append fails (nothing is
    ///   committed)
    pub fn write(&self, candidate: AssertionCandidate) -> Result<WriteOutcome> {
        if !self.entity_exists(&candidate.subject) {
            return Err(Error::Validation(format!(
                "unknown subject entity '{}'",
                candidate.subject
            )));
        }
        if let Some(object_id) = candidate.object.as_entity() {
            if !self.entity_exists(object_id) {
                return Err(Error::Validation(format!(
                    "unknown object entity '{object_id}'"
                )));
            }
        }

        let slot = candidate.slot();
        self.with_slot_exclusive(&slot, || self.write_locked(&slot, candidate))
    }

    /// The body of a write, executed inside the slot's exclusive section.
    fn write_locked(&self, slot: &SlotKey, candidate: AssertionCandidate) -> Result<WriteOutcome> {
        let now = current_timestamp();
        let history: Vec<Assertion> = {
            let slots = self.slots.read().map_err(poisoned_read)?;
            slots.get(slot).cloned().unwrap_or_default()
        };
        let active: Vec<Assertion> = history
            .iter()
            .filter(|a| a.status == AssertionStatus::Active)
            .cloned()
            .collect();

        let resolution = resolve(
            &self.registry,
            self.confidence_floor,
            &active,
            &history,
            &candidate,
        );
        debug!(slot = %slot, resolution = ?resolution, "resolver decision");

        match resolution {
            Resolution::Reaffirm {
                existing,
                confidence,
            } => {
                self.durable.append(
                    &slot_key(slot),
                    &DurableRecord::ConfidenceRaised {
                        assertion: existing.clone(),
                        confidence,
                    },
                )?;
                let mut slots = self.slots.write().map_err(poisoned_write)?;
                if let Some(a) = slots
                    .get_mut(slot)
                    .and_then(|chain| chain.iter_mut().find(|a| a.id == existing))
                {
                    a.confidence = confidence;
                }
                Ok(WriteOutcome {
                    assertion_id: existing,
                    decision: WriteDecision::Reaffirmed,
                    contradiction: None,
                })
            }

            Resolution::Accept => {
                let assertion = candidate.into_assertion(now);
                self.commit_new(slot, assertion.clone(), &[])?;
                Ok(WriteOutcome {
                    assertion_id: assertion.id,
                    decision: WriteDecision::Inserted,
                    contradiction: None,
                })
            }

            Resolution::Supersede { close } => {
                let assertion = candidate.into_assertion(now);
                self.commit_new(slot, assertion.clone(), &close)?;
                Ok(WriteOutcome {
                    assertion_id: assertion.id,
                    decision: WriteDecision::Superseded {
                        closed: close.len(),
                    },
                    contradiction: None,
                })
            }

            Resolution::InsertSuperseded {
                valid_to,
                superseded_by,
                truncate,
            } => {
                let mut assertion = candidate.into_assertion(now);
                assertion.interval = ValidityInterval {
                    valid_from: assertion.observed_at,
                    valid_to: Some(valid_to),
                };
                assertion.status = AssertionStatus::Superseded;
                assertion.superseded_by = Some(superseded_by);
                let close: Vec<AssertionId> = truncate.into_iter().collect();
                self.commit_new(slot, assertion.clone(), &close)?;
                Ok(WriteOutcome {
                    assertion_id: assertion.id,
                    decision: WriteDecision::InsertedAsHistory,
                    contradiction: None,
                })
            }

            Resolution::FlagContradiction { existing } => {
                let assertion = candidate.into_assertion(now);
                self.commit_new(slot, assertion.clone(), &[])?;
                let signal = active
                    .iter()
                    .find(|a| a.id == existing)
                    .map(|e| ContradictionSignal {
                        slot: slot.clone(),
                        existing_id: e.id.clone(),
                        existing_object: e.object.clone(),
                        existing_confidence: e.confidence,
                        candidate_id: assertion.id.clone(),
                        candidate_object: assertion.object.clone(),
                        candidate_confidence: assertion.confidence,
                        detected_at: now,
                    });
                warn!(slot = %slot, "below-floor contradiction flagged for review");
                Ok(WriteOutcome {
                    assertion_id: assertion.id,
                    decision: WriteDecision::Flagged,
                    contradiction: signal,
                })
            }
        }
    }

    /// Appends the durable records for a new assertion (and any interval
    /// closures), then applies them in memory. Durable failure leaves the
    /// in-memory state untouched.
    fn commit_new(
        &self,
        slot: &SlotKey,
        assertion: Assertion,
        close: &[AssertionId],
    ) -> Result<()> {
        let key = slot_key(slot);
        for closed in close {
            self.durable.append(
                &key,
                &DurableRecord::IntervalClosed {
                    assertion: closed.clone(),
                    valid_to: assertion.interval.valid_from,
                    superseded_by: assertion.id.clone(),
                },
            )?;
        }
        self.durable
            .append(&key, &DurableRecord::AssertionAppended(assertion.clone()))?;

        let mut slots = self.slots.write().map_err(poisoned_write)?;
        let chain = slots.entry(slot.clone()).or_default();
        for closed in close {
            if let Some(a) = chain.iter_mut().find(|a| a.id == *closed) {
                a.interval = a.interval.closed_at(assertion.interval.valid_from);
                a.status = AssertionStatus::Superseded;
                a.superseded_by = Some(assertion.id.clone());
            }
        }
        chain.push(assertion);
        chain.sort_by_key(|a| (a.interval.valid_from, a.recorded_at));
        Ok(())
    }

    /// Retracts a single assertion by id (status flag; history preserved).
    ///
    /// Returns false if the assertion does not exist or is already
    /// retracted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteConflict`] or [`Error::StoreUnavailable`] as in
    /// [`Self::write`].
    pub fn retract(&self, id: &AssertionId, as_of: i64) -> Result<bool> {
        let Some(slot) = self.find_slot_of(id) else {
            return Ok(false);
        };
        self.with_slot_exclusive(&slot.clone(), || {
            {
                let slots = self.slots.read().map_err(poisoned_read)?;
                let already = slots
                    .get(&slot)
                    .and_then(|chain| chain.iter().find(|a| a.id == *id))
                    .is_none_or(|a| a.status == AssertionStatus::Retracted);
                if already {
                    return Ok(false);
                }
            }
            self.durable.append(
                &slot_key(&slot),
                &DurableRecord::Retracted {
                    assertion: id.clone(),
                    retracted_at: as_of,
                },
            )?;
            let mut slots = self.slots.write().map_err(poisoned_write)?;
            if let Some(a) = slots
                .get_mut(&slot)
                .and_then(|chain| chain.iter_mut().find(|a| a.id == *id))
            {
                a.status = AssertionStatus::Retracted;
                a.retracted_at = Some(as_of);
            }
            Ok(true)
        })
    }

    /// Retracts every currently-active assertion whose subject, predicate,
    /// or literal object contains `pattern` (case-insensitive). Returns the
    /// number of assertions retracted.
    ///
    /// # Errors
    ///
    /// Propagates the first failure; assertions already retracted stay
    /// retracted (each retraction is its own transaction).
    pub fn retract_matching(&self, pattern: &str, as_of: i64) -> Result<usize> {
        let needle = pattern.to_lowercase();
        let matches: Vec<AssertionId> = {
            let slots = self.slots.read().map_err(poisoned_read)?;
            slots
                .values()
                .flatten()
                .filter(|a| a.status == AssertionStatus::Active)
                .filter(|a| {
                    a.subject.as_str().contains(&needle)
                        || a.predicate.as_str().to_lowercase().contains(&needle)
                        || matches!(&a.object, ObjectValue::Literal(v) if v.to_lowercase().contains(&needle))
                        || matches!(&a.object, ObjectValue::Entity(e) if e.as_str().contains(&needle))
                })
                .map(|a| a.id.clone())
                .collect()
        };

        let mut retracted = 0;
        for id in matches {
            if self.retract(&id, as_of)? {
                retracted += 1;
            }
        }
        Ok(retracted)
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Returns the assertions active for a slot at `as_of` (now when
    /// `None`), reconstructing status-at-time from the superseding chain.
    #[must_use]
    pub fn get_active(
        &self,
        subject: &EntityId,
        predicate: &Predicate,
        as_of: Option<i64>,
    ) -> Vec<Assertion> {
        let at = as_of.unwrap_or_else(current_timestamp);
        let slot = SlotKey::new(subject.clone(), predicate.clone());
        self.slots
            .read()
            .map(|slots| {
                slots
                    .get(&slot)
                    .map(|chain| {
                        chain
                            .iter()
                            .filter(|a| a.was_active_at(at))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Full version chain for a slot, ordered by `valid_from` (event time).
    #[must_use]
    pub fn history(&self, subject: &EntityId, predicate: &Predicate) -> Vec<Assertion> {
        let slot = SlotKey::new(subject.clone(), predicate.clone());
        self.slots
            .read()
            .map(|slots| slots.get(&slot).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// All assertions active for a subject at `as_of` (now when `None`),
    /// across every predicate, ordered by predicate then `valid_from`.
    #[must_use]
    pub fn active_for_subject(&self, subject: &EntityId, as_of: Option<i64>) -> Vec<Assertion> {
        let at = as_of.unwrap_or_else(current_timestamp);
        let mut result: Vec<Assertion> = self
            .slots
            .read()
            .map(|slots| {
                slots
                    .iter()
                    .filter(|(slot, _)| slot.subject == *subject)
                    .flat_map(|(_, chain)| chain.iter().filter(|a| a.was_active_at(at)).cloned())
                    .collect()
            })
            .unwrap_or_default();
        result.sort_by(|a, b| {
            a.predicate
                .cmp(&b.predicate)
                .then(a.interval.valid_from.cmp(&b.interval.valid_from))
        });
        result
    }

    /// Assertions whose validity began inside `[start, end]`, ordered by
    /// `valid_from`. Superseded versions are included: windowed recall asks
    /// what was said, not what is still true.
    #[must_use]
    pub fn window(&self, start: i64, end: i64) -> Vec<Assertion> {
        let mut result: Vec<Assertion> = self
            .slots
            .read()
            .map(|slots| {
                slots
                    .values()
                    .flatten()
                    .filter(|a| a.interval.valid_from >= start && a.interval.valid_from <= end)
                    .filter(|a| a.status != AssertionStatus::Retracted)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        result.sort_by_key(|a| (a.interval.valid_from, a.recorded_at));
        result
    }

    /// The `limit` most recently recorded assertions, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Assertion> {
        let mut result: Vec<Assertion> = self
            .slots
            .read()
            .map(|slots| slots.values().flatten().cloned().collect())
            .unwrap_or_default();
        result.sort_by_key(|a| std::cmp::Reverse((a.recorded_at, a.interval.valid_from)));
        result.truncate(limit);
        result
    }

    /// Looks up a single assertion version by id.
    #[must_use]
    pub fn get_assertion(&self, id: &AssertionId) -> Option<Assertion> {
        self.slots
            .read()
            .ok()?
            .values()
            .flatten()
            .find(|a| a.id == *id)
            .cloned()
    }

    /// Aggregate counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let entity_count = self.entities.read().map(|e| e.len()).unwrap_or(0);
        let (assertion_count, slot_count) = self
            .slots
            .read()
            .map(|slots| (slots.values().map(Vec::len).sum(), slots.len()))
            .unwrap_or((0, 0));
        GraphStats {
            entity_count,
            assertion_count,
            slot_count,
        }
    }

    // ========================================================================
    // Slot serialization
    // ========================================================================

    fn find_slot_of(&self, id: &AssertionId) -> Option<SlotKey> {
        self.slots
            .read()
            .ok()?
            .iter()
            .find(|(_, chain)| chain.iter().any(|a| a.id == *id))
            .map(|(slot, _)| slot.clone())
    }

    /// Runs `f` inside the slot's exclusive section, retrying acquisition
    /// with linear backoff up to the configured bound.
    fn with_slot_exclusive<T>(
        &self,
        slot: &SlotKey,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let cell = {
            let mut locks = self.slot_locks.lock().map_err(|_| Error::StoreUnavailable {
                operation: "slot_lock".to_string(),
                cause: "lock table poisoned".to_string(),
            })?;
            Arc::clone(locks.entry(slot.clone()).or_default())
        };

        let mut attempts: u32 = 0;
        loop {
            match cell.try_lock() {
                Ok(_guard) => return f(),
                Err(TryLockError::Poisoned(poisoned)) => {
                    // A previous writer panicked mid-section; the slot data
                    // itself is still consistent (mutations are applied in
                    // one step), so recover the guard and proceed.
                    let _guard = poisoned.into_inner();
                    return f();
                }
                Err(TryLockError::WouldBlock) => {
                    attempts += 1;
                    if attempts >= self.max_write_attempts {
                        return Err(Error::WriteConflict {
                            slot: slot.to_string(),
                            attempts,
                        });
                    }
                    std::thread::sleep(self.write_backoff * attempts);
                }
            }
        }
    }
}

fn poisoned_read<T>(_: std::sync::PoisonError<T>) -> Error {
    Error::StoreUnavailable {
        operation: "read".to_string(),
        cause: "lock poisoned".to_string(),
    }
}

fn poisoned_write<T>(_: std::sync::PoisonError<T>) -> Error {
    Error::StoreUnavailable {
        operation: "write".to_string(),
        cause: "lock poisoned".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;
    use crate::storage::InMemoryDurableStore;

    fn store() -> (TemporalGraphStore, Arc<InMemoryDurableStore>) {
        let durable = Arc::new(InMemoryDurableStore::new());
        let graph = TemporalGraphStore::new(
            Arc::clone(&durable) as Arc<dyn DurableStore>,
            Arc::new(PredicateRegistry::with_defaults()),
            &MnemographConfig::default(),
        );
        (graph, durable)
    }

    fn seed_entity(graph: &TemporalGraphStore, name: &str) -> EntityId {
        graph
            .create_entity(Entity::new(EntityKind::Person, name, 0))
            .unwrap()
    }

    fn candidate(
        subject: &EntityId,
        predicate: &str,
        value: &str,
        observed_at: i64,
        confidence: f32,
    ) -> AssertionCandidate {
        AssertionCandidate {
            subject: subject.clone(),
            predicate: Predicate::new(predicate),
            object: ObjectValue::Literal(value.to_string()),
            observed_at,
            confidence,
            provenance: "test".to_string(),
        }
    }

    #[test]
    fn test_write_rejects_dangling_subject() {
        let (graph, _) = store();
        let ghost = EntityId::from("ghost");
        let err = graph
            .write(candidate(&ghost, "LIVES_IN", "x", 100, 0.9))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_supersession_closes_interval_and_keeps_history() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");

        let w1 = graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();
        assert_eq!(w1.decision, WriteDecision::Inserted);

        let w2 = graph
            .write(candidate(&alice, "FAVORITE_COLOR", "green", 200, 0.8))
            .unwrap();
        assert_eq!(w2.decision, WriteDecision::Superseded { closed: 1 });

        let pred = Predicate::new("FAVORITE_COLOR");
        let active = graph.get_active(&alice, &pred, None);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].object, ObjectValue::Literal("green".to_string()));

        let history = graph.history(&alice, &pred);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].interval, ValidityInterval::between(100, 200));
        assert_eq!(history[0].status, AssertionStatus::Superseded);
        assert_eq!(history[0].superseded_by, Some(w2.assertion_id.clone()));
        assert_eq!(history[1].interval, ValidityInterval::open(200));
    }

    #[test]
    fn test_as_of_query_sees_superseded_value() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "green", 200, 0.8))
            .unwrap();

        let pred = Predicate::new("FAVORITE_COLOR");
        let at_150 = graph.get_active(&alice, &pred, Some(150));
        assert_eq!(at_150.len(), 1);
        assert_eq!(at_150[0].object, ObjectValue::Literal("blue".to_string()));

        let at_99 = graph.get_active(&alice, &pred, Some(99));
        assert!(at_99.is_empty());
    }

    #[test]
    fn test_reaffirmation_does_not_version() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        let w1 = graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.7))
            .unwrap();
        let w2 = graph
            .write(candidate(&alice, "FAVORITE_COLOR", "Blue", 200, 0.9))
            .unwrap();
        assert_eq!(w2.decision, WriteDecision::Reaffirmed);
        assert_eq!(w2.assertion_id, w1.assertion_id);

        let history = graph.history(&alice, &Predicate::new("FAVORITE_COLOR"));
        assert_eq!(history.len(), 1);
        assert!((history[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_out_of_order_arrival_event_time_ordering() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        // T2 arrives first, then T1 (T1 < T2).
        graph
            .write(candidate(&alice, "LIVES_IN", "Sydney", 200, 0.9))
            .unwrap();
        let w = graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.9))
            .unwrap();
        assert_eq!(w.decision, WriteDecision::InsertedAsHistory);

        let pred = Predicate::new("LIVES_IN");
        let active = graph.get_active(&alice, &pred, None);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].object, ObjectValue::Literal("Sydney".to_string()));

        // History ordered by event time, not arrival order.
        let history = graph.history(&alice, &pred);
        assert_eq!(history[0].object, ObjectValue::Literal("Melbourne".to_string()));
        assert_eq!(history[0].interval, ValidityInterval::between(100, 200));
        assert_eq!(history[1].object, ObjectValue::Literal("Sydney".to_string()));
    }

    #[test]
    fn test_tie_loser_gets_empty_well_formed_interval() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();
        let w = graph
            .write(candidate(&alice, "FAVORITE_COLOR", "green", 100, 0.5))
            .unwrap();
        assert_eq!(w.decision, WriteDecision::InsertedAsHistory);

        let pred = Predicate::new("FAVORITE_COLOR");
        let history = graph.history(&alice, &pred);
        let green = history
            .iter()
            .find(|a| a.object == ObjectValue::Literal("green".to_string()))
            .unwrap();
        assert_eq!(green.interval, ValidityInterval::between(100, 100));
        assert!(green.interval.is_well_formed());
        assert_eq!(green.status, AssertionStatus::Superseded);

        // The loser is in history but never the answer, not even at its
        // own event time.
        for probe in [99, 100, 101, 1_000] {
            let active = graph.get_active(&alice, &pred, Some(probe));
            assert!(active
                .iter()
                .all(|a| a.object == ObjectValue::Literal("blue".to_string())));
        }
    }

    #[test]
    fn test_out_of_order_between_versions_truncates_prior() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "LIVES_IN", "Hanoi", 50, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "LIVES_IN", "Sydney", 200, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.9))
            .unwrap();

        let pred = Predicate::new("LIVES_IN");
        let history = graph.history(&alice, &pred);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].interval, ValidityInterval::between(50, 100));
        assert_eq!(history[1].interval, ValidityInterval::between(100, 200));
        assert_eq!(history[2].interval, ValidityInterval::open(200));

        // Exactly one value at every probe instant.
        for probe in [75, 150, 250] {
            assert_eq!(graph.get_active(&alice, &pred, Some(probe)).len(), 1);
        }
        assert_eq!(
            graph.get_active(&alice, &pred, Some(150))[0].object,
            ObjectValue::Literal("Melbourne".to_string())
        );
    }

    #[test]
    fn test_flagged_contradiction_keeps_both_active() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.95))
            .unwrap();
        let w = graph
            .write(candidate(&alice, "LIVES_IN", "Mars", 200, 0.3))
            .unwrap();
        assert_eq!(w.decision, WriteDecision::Flagged);
        let signal = w.contradiction.expect("contradiction signal");
        assert_eq!(
            signal.existing_object,
            ObjectValue::Literal("Melbourne".to_string())
        );

        let active = graph.get_active(&alice, &Predicate::new("LIVES_IN"), None);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_multi_valued_slot_accumulates() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        let bob = seed_entity(&graph, "Bob");
        let carol = seed_entity(&graph, "Carol");

        for person in [&bob, &carol] {
            graph
                .write(AssertionCandidate {
                    subject: alice.clone(),
                    predicate: Predicate::new("KNOWS"),
                    object: ObjectValue::Entity(person.clone()),
                    observed_at: 100,
                    confidence: 0.9,
                    provenance: "test".to_string(),
                })
                .unwrap();
        }
        let active = graph.get_active(&alice, &Predicate::new("KNOWS"), None);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_durable_outage_leaves_no_partial_state() {
        let (graph, durable) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.9))
            .unwrap();

        durable.set_unavailable(true);
        let err = graph
            .write(candidate(&alice, "LIVES_IN", "Sydney", 200, 0.9))
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { .. }));
        durable.set_unavailable(false);

        // The failed supersession closed nothing and activated nothing.
        let pred = Predicate::new("LIVES_IN");
        let active = graph.get_active(&alice, &pred, None);
        assert_eq!(active.len(), 1);
        assert_eq!(
            active[0].object,
            ObjectValue::Literal("Melbourne".to_string())
        );
        assert!(active[0].interval.is_open());
        assert_eq!(graph.history(&alice, &pred).len(), 1);
    }

    #[test]
    fn test_retraction_is_a_status_flag() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        let w = graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.9))
            .unwrap();

        assert!(graph.retract(&w.assertion_id, 300).unwrap());
        assert!(!graph.retract(&w.assertion_id, 300).unwrap());

        let pred = Predicate::new("LIVES_IN");
        assert!(graph.get_active(&alice, &pred, None).is_empty());
        // Still active for historical queries before the retraction.
        assert_eq!(graph.get_active(&alice, &pred, Some(200)).len(), 1);
        // And still present in history.
        assert_eq!(graph.history(&alice, &pred).len(), 1);
    }

    #[test]
    fn test_retract_matching_scopes_to_active() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 100, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();

        let count = graph.retract_matching("melbourne", 300).unwrap();
        assert_eq!(count, 1);
        assert!(graph
            .get_active(&alice, &Predicate::new("LIVES_IN"), None)
            .is_empty());
        assert_eq!(
            graph
                .get_active(&alice, &Predicate::new("FAVORITE_COLOR"), None)
                .len(),
            1
        );
    }

    #[test]
    fn test_window_orders_by_valid_from_and_includes_superseded() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "LIVES_IN", "Melbourne", 150, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "green", 200, 0.9))
            .unwrap();

        let window = graph.window(100, 180);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].object, ObjectValue::Literal("blue".to_string()));
        assert_eq!(
            window[1].object,
            ObjectValue::Literal("Melbourne".to_string())
        );
    }

    #[test]
    fn test_entity_dedup_and_alias_index() {
        let (graph, _) = store();
        let first = seed_entity(&graph, "Alice");
        let second = seed_entity(&graph, "Alice");
        assert_eq!(first, second);

        assert!(graph.add_alias(&first, "Ally").unwrap());
        assert_eq!(graph.resolve_alias("ally"), Some(first.clone()));
        assert_eq!(graph.resolve_alias("ALICE"), Some(first));
        assert_eq!(graph.resolve_alias("nobody"), None);
    }

    #[test]
    fn test_stats() {
        let (graph, _) = store();
        let alice = seed_entity(&graph, "Alice");
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "blue", 100, 0.9))
            .unwrap();
        graph
            .write(candidate(&alice, "FAVORITE_COLOR", "green", 200, 0.9))
            .unwrap();
        let stats = graph.stats();
        assert_eq!(stats.entity_count, 1);
        assert_eq!(stats.assertion_count, 2);
        assert_eq!(stats.slot_count, 1);
    }
}
