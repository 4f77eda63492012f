//! Predicate policy table.
//!
//! Resolution behavior is dispatched over predicates through a tagged
//! registry rather than a type hierarchy: each predicate maps to a
//! cardinality policy (single-valued, multi-valued, or a custom merge
//! function) and an object-kind expectation used by the normalizer.
//!
//! # Defaults
//!
//! Unknown predicates are treated as **single-valued** (at most one active
//! assertion per (subject, predicate) slot) because that is the safe
//! interpretation for profile-style facts. Predicates that naturally hold
//! many values at once (`KNOWS`, `RESEARCH_AREA`, `HAS_EVENT`, …) must be
//! declared multi-valued, and the registry ships with those declarations.

use crate::models::{Assertion, AssertionCandidate, EntityKind, Predicate};
use std::collections::HashMap;
use std::sync::Arc;

/// Effective cardinality of a slot for one specific write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The candidate contends with the slot's active assertion.
    Single,
    /// The candidate coexists with the slot's active assertions.
    Multi,
}

/// A custom merge function: given the slot's current active set and the
/// candidate, decide whether this write contends or coexists.
pub type MergeFn = dyn Fn(&[Assertion], &AssertionCandidate) -> Cardinality + Send + Sync;

/// Cardinality policy for a predicate.
#[derive(Clone)]
pub enum PredicatePolicy {
    /// At most one active assertion per slot; later observations supersede.
    SingleValued,
    /// Any number of active assertions may coexist.
    MultiValued,
    /// Per-write decision by a custom merge function.
    Custom(Arc<MergeFn>),
}

impl std::fmt::Debug for PredicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleValued => write!(f, "SingleValued"),
            Self::MultiValued => write!(f, "MultiValued"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// What kind of object a predicate expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Object resolves to (or creates) an entity of the given kind.
    Entity(EntityKind),
    /// Object is stored verbatim as a literal.
    Literal,
    /// Resolve to an entity only if the surface form already matches one;
    /// otherwise keep it literal. The default for unknown predicates.
    Infer,
}

/// Full policy entry for one predicate.
#[derive(Debug, Clone)]
pub struct PredicateSpec {
    /// Cardinality policy.
    pub policy: PredicatePolicy,
    /// Object-kind expectation.
    pub object: ObjectKind,
}

impl PredicateSpec {
    /// Single-valued predicate with the given object kind.
    #[must_use]
    pub const fn single(object: ObjectKind) -> Self {
        Self {
            policy: PredicatePolicy::SingleValued,
            object,
        }
    }

    /// Multi-valued predicate with the given object kind.
    #[must_use]
    pub const fn multi(object: ObjectKind) -> Self {
        Self {
            policy: PredicatePolicy::MultiValued,
            object,
        }
    }
}

/// The predicate → policy table.
#[derive(Debug, Clone)]
pub struct PredicateRegistry {
    specs: HashMap<Predicate, PredicateSpec>,
    default_spec: PredicateSpec,
}

impl PredicateRegistry {
    /// Creates an empty registry (every predicate gets the default:
    /// single-valued, inferred object kind).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
            default_spec: PredicateSpec::single(ObjectKind::Infer),
        }
    }

    /// Creates a registry seeded with the standard conversational-memory
    /// predicates.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        // Profile slots: one current value, superseded on change.
        for pred in [
            "NAME",
            "AGE",
            "HAS_BIRTHDATE",
            "HAS_PHONE_NUMBER",
            "HAS_EMAIL",
            "CURRENT_ROLE",
            "CURRENT_JOB",
            "DEGREE",
            "PROGRAM",
        ] {
            registry.declare(pred, PredicateSpec::single(ObjectKind::Literal));
        }
        for (pred, kind) in [
            ("LIVES_IN", EntityKind::Place),
            ("FROM", EntityKind::Place),
            ("HOMETOWN", EntityKind::Place),
            ("WORKS_AT", EntityKind::Organization),
            ("STUDIES_AT", EntityKind::Organization),
        ] {
            registry.declare(pred, PredicateSpec::single(ObjectKind::Entity(kind)));
        }
        registry.declare(
            "LOCATED_IN",
            PredicateSpec::single(ObjectKind::Entity(EntityKind::Place)),
        );

        // Naturally plural facts.
        registry.declare(
            "KNOWS",
            PredicateSpec::multi(ObjectKind::Entity(EntityKind::Person)),
        );
        for pred in ["RESEARCH_AREA", "HAS_FIELD", "LIKES", "DISLIKES"] {
            registry.declare(pred, PredicateSpec::multi(ObjectKind::Infer));
        }

        // Commitment plumbing: a person owns many commitments/events, each
        // commitment has single-valued description/due/state slots.
        for pred in ["HAS_COMMITMENT", "HAS_EVENT", "HAS_TASK"] {
            registry.declare(
                pred,
                PredicateSpec::multi(ObjectKind::Entity(EntityKind::Commitment)),
            );
        }
        for pred in ["DESCRIPTION", "DUE_AT", "STATE", "EVENT_TIME", "TASK_TIME"] {
            registry.declare(pred, PredicateSpec::single(ObjectKind::Literal));
        }
        registry.declare(
            "OWNED_BY",
            PredicateSpec::single(ObjectKind::Entity(EntityKind::Person)),
        );
        for pred in ["EVENT_TOPIC", "TASK_TOPIC"] {
            registry.declare(pred, PredicateSpec::single(ObjectKind::Infer));
        }

        registry
    }

    /// Declares (or overrides) the policy for a predicate.
    pub fn declare(&mut self, predicate: &str, spec: PredicateSpec) {
        self.specs.insert(Predicate::new(predicate), spec);
    }

    /// Returns the spec for a predicate, falling back to the default.
    #[must_use]
    pub fn spec_for(&self, predicate: &Predicate) -> &PredicateSpec {
        self.specs.get(predicate).unwrap_or(&self.default_spec)
    }

    /// Resolves the effective cardinality of one write, evaluating custom
    /// merge functions against the slot's current active set.
    #[must_use]
    pub fn cardinality_for(
        &self,
        active: &[Assertion],
        candidate: &AssertionCandidate,
    ) -> Cardinality {
        match &self.spec_for(&candidate.predicate).policy {
            PredicatePolicy::SingleValued => Cardinality::Single,
            PredicatePolicy::MultiValued => Cardinality::Multi,
            PredicatePolicy::Custom(merge) => merge(active, candidate),
        }
    }

    /// Returns true if the predicate is declared (not on the default path).
    #[must_use]
    pub fn is_declared(&self, predicate: &Predicate) -> bool {
        self.specs.contains_key(predicate)
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
