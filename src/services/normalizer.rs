//! Fact normalizer.
//!
//! Turns raw ingest tuples into assertion candidates the graph store can
//! commit: validates the tuple, canonicalizes the predicate, resolves subject
//! and object surface forms to entities (exact match, alias index, then
//! fuzzy), and decides entity-vs-literal for the object from the predicate's
//! policy.
//!
//! Resolution is optimistic by default: an unknown surface form becomes a new
//! entity. In strict mode it becomes [`crate::Error::UnresolvedEntity`]
//! instead, surfaced to the caller for disambiguation.

use crate::config::MnemographConfig;
use crate::graph::TemporalGraphStore;
use crate::models::normalize::{is_garbage_object, is_user_reference, similarity};
use crate::models::{
    AssertionCandidate, Entity, EntityId, EntityKind, IngestFact, ObjectValue, Predicate,
};
use crate::policy::ObjectKind;
use crate::{current_timestamp, Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Normalizes raw ingest tuples into committable assertion candidates.
pub struct FactNormalizer {
    graph: Arc<TemporalGraphStore>,
    user_id: EntityId,
    user_name: String,
    strict: bool,
    fuzzy_threshold: f32,
}

impl FactNormalizer {
    /// Creates a normalizer over the given graph.
    #[must_use]
    pub fn new(graph: Arc<TemporalGraphStore>, config: &MnemographConfig) -> Self {
        Self {
            graph,
            user_id: EntityId::new(config.user_entity_id.clone()),
            user_name: config.user_display_name.clone(),
            strict: config.normalization.strict_resolution,
            fuzzy_threshold: config.normalization.fuzzy_match_threshold,
        }
    }

    /// Normalizes one ingest tuple.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed tuples, uninformative objects,
    ///   and self-referential assertions
    /// - [`Error::UnresolvedEntity`] in strict mode when a surface form
    ///   matches no known entity above the fuzzy threshold
    /// - [`Error::StoreUnavailable`] if optimistic entity creation cannot be
    ///   made durable
    pub fn normalize(&self, fact: IngestFact) -> Result<AssertionCandidate> {
        fact.validate()?;

        if is_garbage_object(&fact.object) {
            return Err(Error::Validation(format!(
                "uninformative object '{}'",
                fact.object
            )));
        }

        let predicate = Predicate::new(&fact.predicate);
        let subject = self.resolve_subject(&fact.subject)?;
        let object = self.resolve_object(&fact.object, &predicate)?;
        if object.as_entity() == Some(&subject) {
            return Err(Error::Validation(format!(
                "self-referential assertion on '{subject}'"
            )));
        }

        debug!(
            subject = %subject,
            predicate = %predicate,
            "normalized ingest tuple"
        );
        Ok(AssertionCandidate {
            subject,
            predicate,
            object,
            observed_at: fact.observed_at,
            confidence: fact.confidence,
            provenance: fact.provenance,
        })
    }

    /// Resolves the subject surface form. First-person references map to
    /// the configured canonical user entity.
    fn resolve_subject(&self, surface: &str) -> Result<EntityId> {
        if is_user_reference(surface) {
            return self.ensure_user_entity();
        }
        match self.resolve_existing(surface) {
            Some(id) => Ok(id),
            None => self.create_or_reject(surface, EntityKind::Person),
        }
    }

    /// Resolves the object surface form according to the predicate's
    /// object-kind expectation.
    fn resolve_object(&self, surface: &str, predicate: &Predicate) -> Result<ObjectValue> {
        if is_user_reference(surface) {
            return Ok(ObjectValue::Entity(self.ensure_user_entity()?));
        }
        match self.graph.registry().spec_for(predicate).object {
            ObjectKind::Literal => Ok(ObjectValue::Literal(surface.trim().to_string())),
            ObjectKind::Entity(kind) => match self.resolve_existing(surface) {
                Some(id) => Ok(ObjectValue::Entity(id)),
                None => Ok(ObjectValue::Entity(self.create_or_reject(surface, kind)?)),
            },
            // Inferred objects only bind to entities the graph already
            // knows; everything else stays a literal.
            ObjectKind::Infer => Ok(match self.resolve_existing(surface) {
                Some(id) => ObjectValue::Entity(id),
                None => ObjectValue::Literal(surface.trim().to_string()),
            }),
        }
    }

    /// Exact alias-index match, then a fuzzy scan over known entities. A
    /// fuzzy hit records the surface form as a new alias so the next
    /// resolution is exact.
    fn resolve_existing(&self, surface: &str) -> Option<EntityId> {
        if let Some(id) = self.graph.resolve_alias(surface) {
            return Some(id);
        }
        let canonical = EntityId::from_surface(surface);
        if canonical.as_str() != "node" && self.graph.entity_exists(&canonical) {
            return Some(canonical);
        }

        let mut best: Option<(f32, EntityId)> = None;
        for entity in self.graph.entities_snapshot() {
            let score = std::iter::once(entity.name.as_str())
                .chain(entity.aliases.iter().map(String::as_str))
                .map(|known| similarity(surface, known))
                .fold(0.0_f32, f32::max);
            if score >= self.fuzzy_threshold
                && best.as_ref().is_none_or(|(b, _)| score > *b)
            {
                best = Some((score, entity.id));
            }
        }
        let (score, id) = best?;
        debug!(surface, entity = %id, score, "fuzzy alias match");
        // Best effort: losing the alias only costs a future fuzzy scan.
        let _ = self.graph.add_alias(&id, surface);
        Some(id)
    }

    fn create_or_reject(&self, surface: &str, kind: EntityKind) -> Result<EntityId> {
        if self.strict {
            return Err(Error::UnresolvedEntity {
                surface: surface.to_string(),
                threshold: self.fuzzy_threshold,
            });
        }
        self.graph
            .create_entity(Entity::new(kind, surface.trim(), current_timestamp()))
    }

    /// Returns the canonical user entity, creating it on first reference.
    pub(crate) fn ensure_user_entity(&self) -> Result<EntityId> {
        if self.graph.entity_exists(&self.user_id) {
            return Ok(self.user_id.clone());
        }
        let entity = Entity::new(
            EntityKind::Person,
            self.user_name.clone(),
            current_timestamp(),
        )
        .with_id(self.user_id.clone());
        self.graph.create_entity(entity)
    }
}
