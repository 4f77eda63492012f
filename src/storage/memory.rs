//! In-memory durable store.
//!
//! The reference [`DurableStore`] implementation: an append-only log per key
//! behind an `RwLock`, with records held in the same JSON line encoding a
//! file- or network-backed substrate would persist. Ships for tests and for
//! embedding the engine where durability is handled elsewhere (or not
//! needed).
//!
//! Supports failure injection so the write path's all-or-nothing guarantee
//! can be exercised without a real substrate outage.

use crate::storage::traits::{DurableRecord, DurableStore};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// An in-memory, per-key append-only log of JSON-encoded records.
#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    logs: RwLock<HashMap<String, Vec<String>>>,
    unavailable: AtomicBool,
}

impl InMemoryDurableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles failure injection: while set, every `append`/`read` fails
    /// with [`Error::StoreUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of records across all keys.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.logs
            .read()
            .map(|logs| logs.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable {
                operation: operation.to_string(),
                cause: "injected outage".to_string(),
            });
        }
        Ok(())
    }
}

impl DurableStore for InMemoryDurableStore {
    fn append(&self, key: &str, record: &DurableRecord) -> Result<()> {
        self.check_available("append")?;
        let line = serde_json::to_string(record).map_err(|e| Error::StoreUnavailable {
            operation: "append".to_string(),
            cause: format!("record encoding failed: {e}"),
        })?;
        let mut logs = self.logs.write().map_err(|_| Error::StoreUnavailable {
            operation: "append".to_string(),
            cause: "lock poisoned".to_string(),
        })?;
        logs.entry(key.to_string()).or_default().push(line);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Vec<DurableRecord>> {
        self.check_available("read")?;
        let logs = self.logs.read().map_err(|_| Error::StoreUnavailable {
            operation: "read".to_string(),
            cause: "lock poisoned".to_string(),
        })?;
        logs.get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| Error::StoreUnavailable {
                    operation: "read".to_string(),
                    cause: format!("record decoding failed: {e}"),
                })
            })
            .collect()
    }
}
