use crate::store::{RecordKind, StateStore, StoreError};
use dashmap::DashMap;
use serde_json::Value;

/// In-memory store backed by lock-free concurrent maps. Used by tests
/// and ephemeral runs; shares the exact contract of the filesystem
/// store, minus durability.
#[derive(Default)]
pub struct MemoryStore {
    /// Overwrite records: (kind, id) -> latest value
    records: DashMap<(RecordKind, String), Value>,

    /// Append-only sequences: (kind, id) -> ordered values
    sequences: DashMap<(RecordKind, String), Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, kind: RecordKind, id: &str) -> Result<Value, StoreError> {
        self.records
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    fn put(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError> {
        self.records.insert((kind, id.to_string()), record.clone());
        Ok(())
    }

    fn list_ids(&self, kind: RecordKind) -> Result<Vec<String>, StoreError> {
        // Sequence-only units (a delivery log without device info) count too
        let mut ids: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.key().1.clone())
            .chain(
                self.sequences
                    .iter()
                    .filter(|entry| entry.key().0 == kind)
                    .map(|entry| entry.key().1.clone()),
            )
            .collect();

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn append(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError> {
        self.sequences
            .entry((kind, id.to_string()))
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn get_all(&self, kind: RecordKind, id: &str) -> Result<Vec<Value>, StoreError> {
        self.sequences
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records.clear();
        self.sequences.clear();
        Ok(())
    }
}
