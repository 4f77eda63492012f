//! Service layer: normalization, commitments, queries, and reminders over
//! the temporal graph.

mod commitments;
mod normalizer;
mod query;
mod reminders;

pub use commitments::CommitmentTracker;
pub use normalizer::FactNormalizer;
pub use query::{EntityView, FactView, QueryEngine};
pub use reminders::ReminderEvaluator;
