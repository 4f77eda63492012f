//! Engine facade.
//!
//! Wires the normalizer, graph store, commitment tracker, and reminder
//! evaluator together behind the entry points a host (chat front end, MCP
//! server, scheduler) calls. The facade owns no logic of its own; each call
//! delegates to exactly one component.

use crate::config::MnemographConfig;
use crate::graph::{GraphStats, TemporalGraphStore, WriteOutcome};
use crate::models::{AssertionId, Commitment, CommitmentState, EntityId, IngestFact};
use crate::policy::PredicateRegistry;
use crate::services::{CommitmentTracker, FactNormalizer, QueryEngine, ReminderEvaluator};
use crate::storage::{DurableStore, InMemoryDurableStore};
use crate::{current_timestamp, Result};
use std::sync::Arc;

/// The temporal memory engine.
///
/// Thread-safe: share via `Arc` (or clone the cheap handles returned by
/// [`Self::query`] and friends) and call from any thread.
pub struct MemoryEngine {
    config: MnemographConfig,
    graph: Arc<TemporalGraphStore>,
    normalizer: FactNormalizer,
    commitments: CommitmentTracker,
    reminders: ReminderEvaluator,
}

impl MemoryEngine {
    /// Creates an engine over a custom durable substrate.
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>, config: MnemographConfig) -> Self {
        Self::with_registry(durable, Arc::new(PredicateRegistry::with_defaults()), config)
    }

    /// Creates an engine with a custom predicate policy table.
    #[must_use]
    pub fn with_registry(
        durable: Arc<dyn DurableStore>,
        registry: Arc<PredicateRegistry>,
        config: MnemographConfig,
    ) -> Self {
        let graph = Arc::new(TemporalGraphStore::new(durable, registry, &config));
        let normalizer = FactNormalizer::new(Arc::clone(&graph), &config);
        let commitments = CommitmentTracker::new(Arc::clone(&graph));
        let reminders =
            ReminderEvaluator::new(commitments.clone(), config.reminders.horizon_secs);
        Self {
            config,
            graph,
            normalizer,
            commitments,
            reminders,
        }
    }

    /// Creates an engine backed by the in-memory durable store, for tests
    /// and for embedding where durability is handled elsewhere.
    #[must_use]
    pub fn in_memory(config: MnemographConfig) -> Self {
        Self::new(Arc::new(InMemoryDurableStore::new()), config)
    }

    /// Ingests one extracted fact: validates, normalizes, resolves entities,
    /// and commits it through the contradiction resolver.
    ///
    /// # Errors
    ///
    /// Any variant of [`crate::Error`]; see the crate-level taxonomy.
    pub fn ingest(&self, fact: IngestFact) -> Result<WriteOutcome> {
        let candidate = self.normalizer.normalize(fact)?;
        self.graph.write(candidate)
    }

    /// Returns a read-only query handle.
    #[must_use]
    pub fn query(&self) -> QueryEngine {
        QueryEngine::new(
            Arc::clone(&self.graph),
            self.commitments.clone(),
            self.config.normalization.fuzzy_match_threshold,
        )
    }

    /// Returns the commitment tracker.
    #[must_use]
    pub fn commitments(&self) -> &CommitmentTracker {
        &self.commitments
    }

    /// Registers a commitment for the canonical user, resolving the owner
    /// the same way first-person ingest subjects resolve.
    ///
    /// # Errors
    ///
    /// See [`CommitmentTracker::register`].
    pub fn remember_commitment(
        &self,
        description: &str,
        due: Option<&str>,
    ) -> Result<Commitment> {
        let owner = self.normalizer.ensure_user_entity()?;
        self.commitments.register(&owner, description, due)
    }

    /// Transitions a commitment's lifecycle state.
    ///
    /// # Errors
    ///
    /// See [`CommitmentTracker::mark`].
    pub fn mark_commitment(&self, id: &EntityId, state: CommitmentState) -> Result<Commitment> {
        self.commitments.mark(id, state)
    }

    /// Returns the reminder evaluator.
    #[must_use]
    pub fn reminders(&self) -> &ReminderEvaluator {
        &self.reminders
    }

    /// Retracts a single assertion by id. Returns false if it does not
    /// exist or was already retracted.
    ///
    /// # Errors
    ///
    /// See [`TemporalGraphStore::retract`].
    pub fn retract(&self, id: &AssertionId) -> Result<bool> {
        self.graph.retract(id, current_timestamp())
    }

    /// Retracts every active assertion matching a pattern; the audited
    /// counterpart of a delete. Returns how many were retracted.
    ///
    /// # Errors
    ///
    /// See [`TemporalGraphStore::retract_matching`].
    pub fn retract_matching(&self, pattern: &str) -> Result<usize> {
        self.graph.retract_matching(pattern, current_timestamp())
    }

    /// Aggregate graph counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    /// The underlying graph, for hosts that need direct read access.
    #[must_use]
    pub fn graph(&self) -> &Arc<TemporalGraphStore> {
        &self.graph
    }
}
