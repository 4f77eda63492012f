//! End-to-end scenarios through the engine facade.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use mnemograph::{
    CommitmentState, Error, IngestFact, MemoryEngine, MnemographConfig, ObjectValue,
    WriteDecision,
};
use std::sync::Arc;

fn fact(subject: &str, predicate: &str, object: &str, at: i64, conf: f32) -> IngestFact {
    IngestFact {
        subject: subject.to_string(),
        predicate: predicate.to_string(),
        object: object.to_string(),
        observed_at: at,
        confidence: conf,
        provenance: format!("conv-1/t{at}"),
    }
}

fn literal(s: &str) -> ObjectValue {
    ObjectValue::Literal(s.to_string())
}

#[test]
fn test_profile_update_supersedes_and_preserves_history() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());

    // "My favorite color is blue" ... later "actually, it's green".
    engine
        .ingest(fact("Alice", "favorite color", "blue", 100, 0.9))
        .unwrap();
    let outcome = engine
        .ingest(fact("Alice", "favorite color", "green", 200, 0.85))
        .unwrap();
    assert_eq!(outcome.decision, WriteDecision::Superseded { closed: 1 });

    let query = engine.query();
    let now = query.active_facts("Alice").unwrap();
    assert_eq!(now.len(), 1);
    assert_eq!(now[0].object, literal("green"));

    // The as-of view reconstructs the old answer, closed interval and all.
    let then = query.snapshot_at("Alice", Some(150)).unwrap();
    assert_eq!(then.len(), 1);
    assert_eq!(then[0].object, literal("blue"));
    assert_eq!(then[0].valid_to, Some(200));

    // Both versions survive in the slot history, event-time ordered.
    let history = query.history("Alice", "favorite color");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].object, literal("blue"));
    assert_eq!(history[1].object, literal("green"));
}

#[test]
fn test_reaffirmation_is_idempotent() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("Alice", "lives in", "Melbourne", 100, 0.7))
        .unwrap();
    // Same value, different casing and a later observation.
    let outcome = engine
        .ingest(fact("alice", "lives in", "melbourne", 300, 0.95))
        .unwrap();
    assert_eq!(outcome.decision, WriteDecision::Reaffirmed);

    let query = engine.query();
    assert_eq!(query.history("Alice", "lives in").len(), 1);
    let active = query.active_facts("Alice").unwrap();
    assert_eq!(active.len(), 1);
    // Confidence was raised to the max of the two observations.
    assert!((active[0].confidence - 0.95).abs() < f32::EPSILON);
}

#[test]
fn test_out_of_order_arrival_lands_in_history() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("I", "lives in", "Sydney", 200, 0.9))
        .unwrap();
    // A fact about the past arrives late.
    let outcome = engine
        .ingest(fact("me", "lives in", "Hanoi", 100, 0.9))
        .unwrap();
    assert_eq!(outcome.decision, WriteDecision::InsertedAsHistory);

    let query = engine.query();
    let active = query.active_facts("User").unwrap();
    assert_eq!(active.len(), 1);

    let history = query.history("User", "lives in");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].valid_from, 100);
    assert_eq!(history[0].valid_to, Some(200));
    assert_eq!(history[1].valid_to, None);

    // The snapshot between the two observations shows the late fact.
    let then = query.snapshot_at("User", Some(150)).unwrap();
    let homes: Vec<_> = then
        .iter()
        .filter(|f| f.predicate.as_str() == "LIVES_IN")
        .collect();
    assert_eq!(homes.len(), 1);
    assert!(matches!(&homes[0].object, ObjectValue::Entity(id) if id.as_str() == "hanoi"));
}

#[test]
fn test_low_confidence_contradiction_is_flagged_not_applied() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("Alice", "current role", "engineer", 100, 0.95))
        .unwrap();
    let outcome = engine
        .ingest(fact("Alice", "current role", "astronaut", 200, 0.3))
        .unwrap();
    assert_eq!(outcome.decision, WriteDecision::Flagged);

    let signal = outcome.contradiction.expect("contradiction surfaced");
    assert_eq!(signal.existing_object, literal("engineer"));
    assert_eq!(signal.candidate_object, literal("astronaut"));
    assert!(signal.existing_confidence > signal.candidate_confidence);

    // Both stay active for multi-source tracking; nothing was superseded.
    let active = engine.query().active_facts("Alice").unwrap();
    assert_eq!(active.len(), 2);
}

#[test]
fn test_windowed_recall_orders_by_event_time() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("I", "likes", "bouldering", 300, 0.9))
        .unwrap();
    engine
        .ingest(fact("I", "lives in", "Melbourne", 100, 0.9))
        .unwrap();
    engine
        .ingest(fact("I", "works at", "Acme", 200, 0.9))
        .unwrap();

    let window = engine.query().recall_between(100, 250);
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].valid_from, 100);
    assert_eq!(window[1].valid_from, 200);
}

#[test]
fn test_commitment_lifecycle_end_to_end() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    let now = mnemograph::current_timestamp();

    // "Remind me to pay rent" with an absolute due one hour out.
    let due = now + 3_600;
    let rent = engine
        .remember_commitment("pay rent", Some(&due.to_string()))
        .unwrap();
    assert_eq!(rent.state, CommitmentState::Open);
    assert_eq!(rent.due_at, Some(due));

    // Not due yet: surfaced as upcoming, negative lateness.
    let events = engine.reminders().evaluate(now);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].commitment_id, rent.id);
    assert_eq!(events[0].lateness_seconds, now - due);

    // Two hours later it is overdue.
    let events = engine.reminders().evaluate(now + 2 * 3_600);
    assert_eq!(events.len(), 1);
    assert!(events[0].lateness_seconds > 0);
    assert_eq!(engine.query().overdue(now + 2 * 3_600).len(), 1);

    // Fulfil it; reminders stop, terminal state is final.
    engine
        .mark_commitment(&rent.id, CommitmentState::Fulfilled)
        .unwrap();
    assert!(engine.reminders().evaluate(now + 2 * 3_600).is_empty());

    let err = engine
        .mark_commitment(&rent.id, CommitmentState::Broken)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: CommitmentState::Fulfilled,
            to: CommitmentState::Broken
        }
    ));
}

#[test]
fn test_relative_due_expressions_resolve_at_registration() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    let before = mnemograph::current_timestamp();
    let c = engine
        .remember_commitment("submit report", Some("in 2 days"))
        .unwrap();
    let due = c.due_at.expect("resolved");
    assert!(due >= before + 2 * 86_400);
    assert!(due <= mnemograph::current_timestamp() + 2 * 86_400 + 5);
}

#[test]
fn test_strict_mode_rejects_unknown_entities() {
    let mut config = MnemographConfig::default();
    config.normalization.strict_resolution = true;
    let engine = MemoryEngine::in_memory(config);

    let err = engine
        .ingest(fact("Zorblatt", "lives in", "Melbourne", 100, 0.9))
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvedEntity { .. }));

    // First-person subjects still work: the user entity is canonical.
    engine
        .ingest(fact("I", "has email", "a@example.com", 100, 0.9))
        .unwrap();
}

#[test]
fn test_alias_resolution_merges_surface_forms() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("I", "lives in", "Melbourne, Australia", 100, 0.9))
        .unwrap();
    // The short form resolves to the same place entity instead of forking.
    engine
        .ingest(fact("Bob", "lives in", "Melbourne", 200, 0.9))
        .unwrap();

    let user_home = &engine.query().active_facts("User").unwrap()[0];
    let bob_home = &engine.query().active_facts("Bob").unwrap()[0];
    assert_eq!(user_home.object, bob_home.object);
}

#[test]
fn test_durable_outage_aborts_whole_ingest() {
    let durable = Arc::new(mnemograph::InMemoryDurableStore::new());
    let engine = MemoryEngine::new(durable.clone(), MnemographConfig::default());
    engine
        .ingest(fact("Alice", "lives in", "Melbourne", 100, 0.9))
        .unwrap();

    durable.set_unavailable(true);
    let err = engine
        .ingest(fact("Alice", "lives in", "Sydney", 200, 0.9))
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable { .. }));
    durable.set_unavailable(false);

    // The failed supersession left the old fact untouched.
    let active = engine.query().active_facts("Alice").unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].valid_to, None);
    assert!(matches!(&active[0].object, ObjectValue::Entity(id) if id.as_str() == "melbourne"));
}

#[test]
fn test_retraction_is_audited_not_deleted() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    engine
        .ingest(fact("I", "has phone number", "0400 000 000", 100, 0.9))
        .unwrap();

    assert_eq!(engine.retract_matching("0400").unwrap(), 1);
    assert!(engine.query().active_facts("User").unwrap().is_empty());

    // The version is still in history, flagged retracted.
    let history = engine.query().history("User", "has phone number");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, mnemograph::AssertionStatus::Retracted);
}

#[test]
fn test_malformed_ingest_is_rejected_up_front() {
    let engine = MemoryEngine::in_memory(MnemographConfig::default());
    let mut bad = fact("Alice", "lives in", "Melbourne", 100, 0.9);
    bad.confidence = 1.2;
    assert!(matches!(engine.ingest(bad), Err(Error::Validation(_))));

    let bad = fact("Alice", "likes", "something", 100, 0.9);
    assert!(matches!(engine.ingest(bad), Err(Error::Validation(_))));

    assert_eq!(engine.stats().assertion_count, 0);
}
