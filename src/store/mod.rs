use serde_json::Value;
use std::fmt;
use thiserror::Error;

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// The two record kinds the store persists per unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Current unit state, overwritten on every save
    DeviceInfo,
    /// Append-only delivery history
    DeliveryLog,
}

impl RecordKind {
    /// On-disk file name used by the filesystem store
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::DeviceInfo => "device_info.json",
            RecordKind::DeliveryLog => "delivery_log.json",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::DeviceInfo => write!(f, "device_info"),
            RecordKind::DeliveryLog => write!(f, "delivery_log"),
        }
    }
}

/// Store failures. `Corrupt` is recoverable by callers doing fleet-wide
/// reads: the offending record is skipped for that cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {kind} record for {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("corrupt {kind} record for {id}: {source}")]
    Corrupt {
        kind: RecordKind,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(serde_json::Error),

    #[error("store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable keyed storage for unit records.
///
/// `put` overwrites atomically (last write wins); `append` is the only
/// mutation allowed on a `DeliveryLog` sequence. Implementations must
/// report unparseable stored data as `Corrupt`, never panic.
pub trait StateStore: Send + Sync {
    /// Fetch one record
    fn get(&self, kind: RecordKind, id: &str) -> Result<Value, StoreError>;

    /// Overwrite one record
    fn put(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError>;

    /// All ids that have a record of the given kind
    fn list_ids(&self, kind: RecordKind) -> Result<Vec<String>, StoreError>;

    /// Append one record to an append-only sequence
    fn append(&self, kind: RecordKind, id: &str, record: &Value) -> Result<(), StoreError>;

    /// Read a whole append-only sequence; `NotFound` if never written
    fn get_all(&self, kind: RecordKind, id: &str) -> Result<Vec<Value>, StoreError>;

    /// Wipe every record of every kind
    fn clear(&self) -> Result<(), StoreError>;
}
