//! Query engine.
//!
//! Pure read paths over the graph and commitment tracker: entity lookup,
//! active facts, point-in-time snapshots, windowed recall, and due/overdue
//! listings. Every response shape is serializable and carries no internal
//! handles, so a host can hand results straight to its transport layer.
//!
//! Lookups here are read-only: unlike the normalizer's resolution, a fuzzy
//! match during a query never records a new alias.

use crate::graph::TemporalGraphStore;
use crate::models::normalize::similarity;
use crate::models::{
    Assertion, AssertionId, AssertionStatus, Commitment, Entity, EntityId, EntityKind,
    ObjectValue, Predicate,
};
use crate::services::CommitmentTracker;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Serializable entity shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    /// Canonical id.
    pub id: EntityId,
    /// Entity kind.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Known aliases.
    pub aliases: Vec<String>,
    /// False once deactivated.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: i64,
}

impl From<Entity> for EntityView {
    fn from(e: Entity) -> Self {
        Self {
            id: e.id,
            kind: e.kind,
            name: e.name,
            aliases: e.aliases,
            active: e.active,
            created_at: e.created_at,
        }
    }
}

/// Serializable assertion shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactView {
    /// Assertion version id.
    pub id: AssertionId,
    /// Subject entity id.
    pub subject: EntityId,
    /// Canonical predicate.
    pub predicate: Predicate,
    /// Object entity or literal.
    pub object: ObjectValue,
    /// Start of validity (event time).
    pub valid_from: i64,
    /// Exclusive end of validity; `None` = still open.
    pub valid_to: Option<i64>,
    /// When the engine recorded this version.
    pub recorded_at: i64,
    /// Source confidence.
    pub confidence: f32,
    /// Originating conversation/message id.
    pub provenance: String,
    /// Current lifecycle status.
    pub status: AssertionStatus,
}

impl From<Assertion> for FactView {
    fn from(a: Assertion) -> Self {
        Self {
            id: a.id,
            subject: a.subject,
            predicate: a.predicate,
            object: a.object,
            valid_from: a.interval.valid_from,
            valid_to: a.interval.valid_to,
            recorded_at: a.recorded_at,
            confidence: a.confidence,
            provenance: a.provenance,
            status: a.status,
        }
    }
}

/// Read-only query surface over the memory engine.
#[derive(Clone)]
pub struct QueryEngine {
    graph: Arc<TemporalGraphStore>,
    commitments: CommitmentTracker,
    fuzzy_threshold: f32,
}

impl QueryEngine {
    /// Creates a query engine over the given graph and tracker.
    #[must_use]
    pub fn new(
        graph: Arc<TemporalGraphStore>,
        commitments: CommitmentTracker,
        fuzzy_threshold: f32,
    ) -> Self {
        Self {
            graph,
            commitments,
            fuzzy_threshold,
        }
    }

    /// Looks up an entity by name or alias, tolerating close surface forms.
    #[must_use]
    pub fn lookup_entity(&self, surface: &str) -> Option<EntityView> {
        let id = self.resolve(surface)?;
        self.graph.get_entity(&id).map(EntityView::from)
    }

    /// All facts currently active for an entity, across every predicate.
    /// Unknown surface forms yield an empty list.
    ///
    /// # Errors
    ///
    /// Infallible today; `Result` keeps the signature stable for durable
    /// read-through implementations.
    pub fn active_facts(&self, surface: &str) -> Result<Vec<FactView>> {
        self.snapshot_at(surface, None)
    }

    /// The facts that were active for an entity at `as_of` (now when
    /// `None`): a point-in-time snapshot over closed and open intervals.
    ///
    /// # Errors
    ///
    /// Infallible today; see [`Self::active_facts`].
    pub fn snapshot_at(&self, surface: &str, as_of: Option<i64>) -> Result<Vec<FactView>> {
        let Some(id) = self.resolve(surface) else {
            return Ok(Vec::new());
        };
        Ok(self
            .graph
            .active_for_subject(&id, as_of)
            .into_iter()
            .map(FactView::from)
            .collect())
    }

    /// Full version history of one slot, in event-time order.
    #[must_use]
    pub fn history(&self, surface: &str, predicate: &str) -> Vec<FactView> {
        let Some(id) = self.resolve(surface) else {
            return Vec::new();
        };
        self.graph
            .history(&id, &Predicate::new(predicate))
            .into_iter()
            .map(FactView::from)
            .collect()
    }

    /// Everything asserted with a validity start inside `[start, end]`,
    /// ordered by `valid_from`. Includes since-superseded versions; windowed
    /// recall asks what was said, not what is still true.
    #[must_use]
    pub fn recall_between(&self, start: i64, end: i64) -> Vec<FactView> {
        self.graph
            .window(start, end)
            .into_iter()
            .map(FactView::from)
            .collect()
    }

    /// The most recently recorded assertions, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<FactView> {
        self.graph
            .recent(limit)
            .into_iter()
            .map(FactView::from)
            .collect()
    }

    /// Open commitments due inside `[start, end]`, ascending by due time.
    #[must_use]
    pub fn due_between(&self, start: i64, end: i64) -> Vec<Commitment> {
        self.commitments.due_between(start, end)
    }

    /// Open commitments past due at `as_of`, ascending by due time.
    #[must_use]
    pub fn overdue(&self, as_of: i64) -> Vec<Commitment> {
        self.commitments.overdue(as_of)
    }

    /// Resolves a surface form without side effects: exact alias-index
    /// match first, then the best fuzzy match above the threshold.
    fn resolve(&self, surface: &str) -> Option<EntityId> {
        if let Some(id) = self.graph.resolve_alias(surface) {
            return Some(id);
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
        best.map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MnemographConfig;
    use crate::models::{AssertionCandidate, EntityKind};
    use crate::policy::PredicateRegistry;
    use crate::storage::InMemoryDurableStore;

    fn fixture() -> (QueryEngine, Arc<TemporalGraphStore>, EntityId) {
        let graph = Arc::new(TemporalGraphStore::new(
            Arc::new(InMemoryDurableStore::new()),
            Arc::new(PredicateRegistry::with_defaults()),
            &MnemographConfig::default(),
        ));
        let alice = graph
            .create_entity(Entity::new(EntityKind::Person, "Alice", 0))
            .unwrap();
        let query = QueryEngine::new(
            Arc::clone(&graph),
            CommitmentTracker::new(Arc::clone(&graph)),
            0.8,
        );
        (query, graph, alice)
    }

    fn write(graph: &TemporalGraphStore, subject: &EntityId, pred: &str, value: &str, at: i64) {
        graph
            .write(AssertionCandidate {
                subject: subject.clone(),
                predicate: Predicate::new(pred),
                object: ObjectValue::Literal(value.to_string()),
                observed_at: at,
                confidence: 0.9,
                provenance: "test".to_string(),
            })
            .unwrap();
    }

    #[test]
    fn test_lookup_tolerates_close_surface_forms() {
        let (query, graph, alice) = fixture();
        graph.add_alias(&alice, "Alice Nguyen").unwrap();

        assert_eq!(query.lookup_entity("ALICE").unwrap().id, alice);
        // Reordered tokens resolve through the fuzzy path.
        assert_eq!(query.lookup_entity("Nguyen Alice").unwrap().id, alice);
        assert!(query.lookup_entity("Bob").is_none());
    }

    #[test]
    fn test_snapshot_at_round_trips_history() {
        let (query, graph, alice) = fixture();
        write(&graph, &alice, "FAVORITE_COLOR", "blue", 100);
        write(&graph, &alice, "FAVORITE_COLOR", "green", 200);

        let now = query.active_facts("Alice").unwrap();
        assert_eq!(now.len(), 1);
        assert_eq!(now[0].object, ObjectValue::Literal("green".to_string()));

        let then = query.snapshot_at("Alice", Some(150)).unwrap();
        assert_eq!(then.len(), 1);
        assert_eq!(then[0].object, ObjectValue::Literal("blue".to_string()));
        assert_eq!(then[0].valid_to, Some(200));

        assert!(query.snapshot_at("Alice", Some(50)).unwrap().is_empty());
        // Unknown entities are an empty answer, not an error.
        assert!(query.active_facts("Nobody").unwrap().is_empty());
    }

    #[test]
    fn test_recall_between_includes_superseded() {
        let (query, graph, alice) = fixture();
        write(&graph, &alice, "FAVORITE_COLOR", "blue", 100);
        write(&graph, &alice, "FAVORITE_COLOR", "green", 200);
        write(&graph, &alice, "LIVES_IN", "Melbourne", 300);

        let window = query.recall_between(100, 250);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].valid_from, 100);
        assert_eq!(window[0].status, AssertionStatus::Superseded);
        assert_eq!(window[1].valid_from, 200);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let (query, graph, alice) = fixture();
        write(&graph, &alice, "FAVORITE_COLOR", "blue", 100);
        write(&graph, &alice, "LIVES_IN", "Melbourne", 200);

        let recent = query.recent(10);
        assert_eq!(recent.len(), 2);
        let recent = query.recent(1);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_views_serialize() {
        let (query, graph, alice) = fixture();
        write(&graph, &alice, "LIVES_IN", "Melbourne", 100);
        let facts = query.active_facts("Alice").unwrap();
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json[0]["predicate"], "LIVES_IN");
        assert_eq!(json[0]["valid_from"], 100);
        assert_eq!(json[0]["status"], "active");
    }
}
