//! Reminder evaluator.
//!
//! A stateless pull model: the host calls [`ReminderEvaluator::evaluate`]
//! on its own schedule and receives the commitments that are overdue or due
//! within the configured horizon at that instant. The evaluator keeps no
//! fired/unfired bookkeeping and never mutates the graph; calling it twice
//! with the same clock yields the same events.

use crate::models::ReminderEvent;
use crate::services::CommitmentTracker;
use tracing::debug;

/// Computes due and soon-due reminder events on demand.
#[derive(Clone)]
pub struct ReminderEvaluator {
    commitments: CommitmentTracker,
    horizon_secs: i64,
}

impl ReminderEvaluator {
    /// Creates an evaluator with the given upcoming horizon.
    #[must_use]
    pub fn new(commitments: CommitmentTracker, horizon_secs: i64) -> Self {
        Self {
            commitments,
            horizon_secs,
        }
    }

    /// Returns one event per open commitment that is overdue at `now` or
    /// due within the horizon, ascending by due time. `lateness_seconds` is
    /// `now - due_at`: positive for overdue, negative for upcoming.
    #[must_use]
    pub fn evaluate(&self, now: i64) -> Vec<ReminderEvent> {
        let overdue = self.commitments.overdue(now);
        let upcoming = self
            .commitments
            .due_between(now, now.saturating_add(self.horizon_secs));

        let events: Vec<ReminderEvent> = overdue
            .into_iter()
            .chain(upcoming)
            .filter_map(|c| {
                c.due_at.map(|due_at| ReminderEvent {
                    commitment_id: c.id,
                    due_at,
                    lateness_seconds: now - due_at,
                })
            })
            .collect();
        debug!(now, count = events.len(), "reminder scan");
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MnemographConfig;
    use crate::graph::TemporalGraphStore;
    use crate::models::{Commitment, CommitmentState, Entity, EntityId, EntityKind};
    use crate::policy::PredicateRegistry;
    use crate::storage::InMemoryDurableStore;
    use crate::current_timestamp;
    use std::sync::Arc;

    fn fixture() -> (ReminderEvaluator, CommitmentTracker, EntityId) {
        let graph = Arc::new(TemporalGraphStore::new(
            Arc::new(InMemoryDurableStore::new()),
            Arc::new(PredicateRegistry::with_defaults()),
            &MnemographConfig::default(),
        ));
        let owner = graph
            .create_entity(Entity::new(EntityKind::Person, "User", 0))
            .unwrap();
        let tracker = CommitmentTracker::new(graph);
        (
            ReminderEvaluator::new(tracker.clone(), 24 * 60 * 60),
            tracker,
            owner,
        )
    }

    fn register(tracker: &CommitmentTracker, owner: &EntityId, desc: &str, due: &str) -> Commitment {
        tracker.register(owner, desc, Some(due)).unwrap()
    }

    #[test]
    fn test_overdue_and_upcoming_with_lateness_sign() {
        let (evaluator, tracker, owner) = fixture();
        let now = current_timestamp();
        let soon = register(&tracker, &owner, "submit report", "in 2 hours");
        let far = register(&tracker, &owner, "renew passport", "in 2 weeks");

        // Before anything is due: only the 2-hour commitment is inside the
        // 24h horizon, and it is upcoming (negative lateness).
        let events = evaluator.evaluate(now);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].commitment_id, soon.id);
        assert!(events[0].lateness_seconds < 0);

        // Three hours later it is overdue.
        let events = evaluator.evaluate(now + 3 * 3_600);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].commitment_id, soon.id);
        assert!(events[0].lateness_seconds > 0);

        // Thirteen days later the far commitment enters the horizon too.
        let events = evaluator.evaluate(now + 13 * 86_400);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].commitment_id, far.id);
    }

    #[test]
    fn test_evaluation_is_repeatable_and_read_only() {
        let (evaluator, tracker, owner) = fixture();
        let now = current_timestamp();
        register(&tracker, &owner, "submit report", "in 1 hour");

        let first = evaluator.evaluate(now + 2 * 3_600);
        let second = evaluator.evaluate(now + 2 * 3_600);
        assert_eq!(first, second);
    }

    #[test]
    fn test_terminal_commitments_never_remind() {
        let (evaluator, tracker, owner) = fixture();
        let now = current_timestamp();
        let c = register(&tracker, &owner, "submit report", "in 1 hour");
        tracker.mark(&c.id, CommitmentState::Cancelled).unwrap();

        assert!(evaluator.evaluate(now + 2 * 3_600).is_empty());
    }

    #[test]
    fn test_no_due_timestamp_no_reminder() {
        let (evaluator, tracker, owner) = fixture();
        tracker.register(&owner, "someday", None).unwrap();
        assert!(evaluator.evaluate(current_timestamp() + 86_400).is_empty());
    }
}
