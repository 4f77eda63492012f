//! Storage layer: the abstract durable substrate and its reference
//! implementation.
//!
//! The engine's source of truth at runtime is the in-memory temporal graph
//! (see [`crate::graph`]); every committed mutation is mirrored into a
//! [`DurableStore`] as an append-only record so a host can replay or archive
//! it. Only the substrate's interface is this crate's concern.

mod memory;
mod traits;

pub use memory::InMemoryDurableStore;
pub use traits::{entity_key, slot_key, DurableRecord, DurableStore};
