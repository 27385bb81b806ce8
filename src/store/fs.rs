use crate::store::{RecordKind, StateStore, StoreError};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filesystem-backed store: one directory per unit under the data root,
/// one JSON file per record kind.
///
/// Layout:
/// ```text
/// <root>/machine1/device_info.json
/// <root>/machine1/delivery_log.json
/// ```
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!(root = %root.display(), "Filesystem store opened");
        Ok(Self { root })
    }

    fn record_path(&self, kind: RecordKind, id: &str) -> PathBuf {
        self.root.join(id).join(kind.file_name())
    }

    /// Atomic overwrite: write to a .tmp sibling, fsync, then rename.
    /// Prevents a partially written file from ever being read back.
    fn write_atomic(&self, path: &Path, record: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record).map_err(StoreError::Encode)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(json.as_bytes())?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        Ok(())
    }

    fn read_value(&self, kind: RecordKind, id: &str) -> Result<Value, StoreError> {
        let path = self.record_path(kind, id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind,
                id: id.to_string(),
            });
        }

        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
            kind,
            id: id.to_string(),
            source,
        })
    }
}

impl StateStore for FsStore {
    fn get(&self, kind: RecordKind, id: &str) -> Result<Value, StoreError> {
        self.read_value(kind, id)
    }

    fn put(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError> {
        self.write_atomic(&self.record_path(kind, id), record)
    }

    fn list_ids(&self, kind: RecordKind) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if !entry.path().join(kind.file_name()).exists() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_string());
            }
        }

        // Stable iteration order for callers and tests
        ids.sort();
        Ok(ids)
    }

    fn append(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.record_path(kind, id);

        let mut records: Vec<Value> = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                kind,
                id: id.to_string(),
                source,
            })?
        } else {
            Vec::new()
        };

        records.push(record.clone());
        self.write_atomic(&path, &Value::Array(records))
    }

    fn get_all(&self, kind: RecordKind, id: &str) -> Result<Vec<Value>, StoreError> {
        let value = self.read_value(kind, id)?;
        serde_json::from_value(value).map_err(|source| StoreError::Corrupt {
            kind,
            id: id.to_string(),
            source,
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path().join("testdb")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_roundtrips() {
        let (_dir, store) = open_store();
        let record = json!({"id": "machine1", "battery": 100});

        store
            .put(RecordKind::DeviceInfo, "machine1", &record)
            .unwrap();
        let loaded = store.get(RecordKind::DeviceInfo, "machine1").unwrap();

        assert_eq!(loaded, record);
    }

    #[test]
    fn put_overwrites_previous_record() {
        let (_dir, store) = open_store();

        store
            .put(RecordKind::DeviceInfo, "machine1", &json!({"battery": 100}))
            .unwrap();
        store
            .put(RecordKind::DeviceInfo, "machine1", &json!({"battery": 42}))
            .unwrap();

        let loaded = store.get(RecordKind::DeviceInfo, "machine1").unwrap();
        assert_eq!(loaded["battery"], 42);
    }

    #[test]
    fn get_missing_record_is_not_found() {
        let (_dir, store) = open_store();
        let err = store.get(RecordKind::DeviceInfo, "machine9").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn corrupt_file_reports_corrupt_not_panic() {
        let (_dir, store) = open_store();
        let path = store.record_path(RecordKind::DeviceInfo, "machine1");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not valid json").unwrap();

        let err = store.get(RecordKind::DeviceInfo, "machine1").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn append_accumulates_records() {
        let (_dir, store) = open_store();

        store
            .append(RecordKind::DeliveryLog, "machine1", &json!({"code": "WH1-HW1"}))
            .unwrap();
        store
            .append(RecordKind::DeliveryLog, "machine1", &json!({"code": "WH2-HW2"}))
            .unwrap();

        let records = store.get_all(RecordKind::DeliveryLog, "machine1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["code"], "WH1-HW1");
        assert_eq!(records[1]["code"], "WH2-HW2");
    }

    #[test]
    fn get_all_missing_log_is_not_found() {
        let (_dir, store) = open_store();
        let err = store
            .get_all(RecordKind::DeliveryLog, "machine1")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn list_ids_only_returns_units_with_that_kind() {
        let (_dir, store) = open_store();

        store
            .put(RecordKind::DeviceInfo, "machine1", &json!({}))
            .unwrap();
        store
            .put(RecordKind::DeviceInfo, "machine2", &json!({}))
            .unwrap();
        store
            .append(RecordKind::DeliveryLog, "machine2", &json!({}))
            .unwrap();

        let device_ids = store.list_ids(RecordKind::DeviceInfo).unwrap();
        assert_eq!(device_ids, vec!["machine1", "machine2"]);

        let log_ids = store.list_ids(RecordKind::DeliveryLog).unwrap();
        assert_eq!(log_ids, vec!["machine2"]);
    }

    #[test]
    fn clear_wipes_everything() {
        let (_dir, store) = open_store();

        store
            .put(RecordKind::DeviceInfo, "machine1", &json!({}))
            .unwrap();
        store
            .append(RecordKind::DeliveryLog, "machine1", &json!({}))
            .unwrap();
        store.clear().unwrap();

        assert!(store.list_ids(RecordKind::DeviceInfo).unwrap().is_empty());
        assert!(matches!(
            store.get(RecordKind::DeviceInfo, "machine1"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
