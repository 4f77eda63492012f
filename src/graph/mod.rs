//! The temporal knowledge graph: storage arena, per-slot write
//! serialization, and the contradiction resolver.

pub mod resolver;
pub mod store;

pub use resolver::Resolution;
pub use store::{GraphStats, TemporalGraphStore, WriteDecision, WriteOutcome};
