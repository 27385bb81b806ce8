use crate::robot::{DeliveryRecord, Robot};
use crate::store::{RecordKind, StateStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Registry operation failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no robot with id {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the set of simulated units and mediates every read and write
/// against the state store. The store is the single source of truth;
/// the registry never caches unit state.
pub struct RobotRegistry {
    store: Arc<dyn StateStore>,
}

impl RobotRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Clear all prior units and history, then create `count` fresh
    /// robots (`machine1..=machineN`) parked at the origin with a full
    /// battery.
    pub fn create_fleet(&self, count: usize) -> Result<HashMap<String, Robot>, RegistryError> {
        if count == 0 {
            return Err(RegistryError::InvalidArgument(
                "fleet size must be a positive integer".to_string(),
            ));
        }

        self.store.clear()?;

        let mut rng = rand::thread_rng();
        let mut robots = HashMap::with_capacity(count);
        for index in 1..=count {
            let robot = Robot::generate(index, &mut rng);
            self.save_robot(&robot)?;
            robots.insert(robot.id.clone(), robot);
        }

        info!(count = count, "Fleet created");
        Ok(robots)
    }

    /// Current state of every unit, keyed by id. Empty when no fleet
    /// exists. A record that fails to load is skipped for this cycle
    /// with a warning; the rest of the fleet is still returned.
    pub fn list_robots(&self) -> HashMap<String, Robot> {
        let ids = match self.store.list_ids(RecordKind::DeviceInfo) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list robot ids");
                return HashMap::new();
            }
        };

        let mut robots = HashMap::with_capacity(ids.len());
        for id in ids {
            match self.load_robot(&id) {
                Ok(robot) => {
                    robots.insert(id, robot);
                }
                Err(e) => {
                    warn!(machine_id = %id, error = %e, "Skipping unreadable robot record");
                }
            }
        }
        robots
    }

    /// Fetch one unit. `NotFound` for an unknown id; a corrupt record
    /// surfaces to the caller.
    pub fn get_robot(&self, id: &str) -> Result<Robot, RegistryError> {
        match self.load_robot(id) {
            Ok(robot) => Ok(robot),
            Err(RegistryError::Store(StoreError::NotFound { .. })) => {
                Err(RegistryError::NotFound(id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Persist one unit's full state; idempotent overwrite
    pub fn save_robot(&self, robot: &Robot) -> Result<(), RegistryError> {
        let value = serde_json::to_value(robot).map_err(StoreError::Encode)?;
        self.store.put(RecordKind::DeviceInfo, &robot.id, &value)?;
        Ok(())
    }

    /// Append one delivery to the unit's history
    pub fn append_delivery(&self, record: &DeliveryRecord) -> Result<(), RegistryError> {
        let value = serde_json::to_value(record).map_err(StoreError::Encode)?;
        self.store.append(RecordKind::DeliveryLog, &record.id, &value)?;
        Ok(())
    }

    /// Delivery history for one unit, oldest first. `NotFound` when the
    /// unit has never delivered.
    pub fn history(&self, id: &str) -> Result<Vec<DeliveryRecord>, RegistryError> {
        let values = match self.store.get_all(RecordKind::DeliveryLog, id) {
            Ok(values) => values,
            Err(StoreError::NotFound { .. }) => {
                return Err(RegistryError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        values
            .into_iter()
            .map(|value| self.parse_record(RecordKind::DeliveryLog, id, value))
            .collect()
    }

    /// Every delivery record across the fleet, grouped by warehouse
    /// floor. All five floors are present even when empty. Unreadable
    /// logs are skipped with a warning.
    pub fn warehouse_state(&self) -> HashMap<u8, Vec<DeliveryRecord>> {
        let mut floors: HashMap<u8, Vec<DeliveryRecord>> =
            (1..=5).map(|floor| (floor, Vec::new())).collect();

        let ids = match self.store.list_ids(RecordKind::DeliveryLog) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list delivery logs");
                return floors;
            }
        };

        for id in ids {
            match self.history(&id) {
                Ok(records) => {
                    for record in records {
                        if let Some(entries) = floors.get_mut(&record.warehouse_floor) {
                            entries.push(record);
                        }
                    }
                }
                Err(e) => {
                    warn!(machine_id = %id, error = %e, "Skipping unreadable delivery log");
                }
            }
        }

        floors
    }

    /// Apply a firmware version to the unit whose hardware address
    /// matches. Returns the updated unit; `NotFound` when no unit has
    /// that address.
    pub fn update_firmware(&self, macaddr: &str, version: &str) -> Result<Robot, RegistryError> {
        let robots = self.list_robots();

        let mut robot = robots
            .into_values()
            .find(|robot| robot.macaddr == macaddr)
            .ok_or_else(|| RegistryError::NotFound(macaddr.to_string()))?;

        robot.version = version.to_string();
        self.save_robot(&robot)?;

        info!(machine_id = %robot.id, version = %version, "Firmware updated");
        Ok(robot)
    }

    fn load_robot(&self, id: &str) -> Result<Robot, RegistryError> {
        let value = self.store.get(RecordKind::DeviceInfo, id)?;
        self.parse_record(RecordKind::DeviceInfo, id, value)
    }

    /// Deserialize a stored value; a shape mismatch is a corrupt record,
    /// same as unparseable JSON on disk.
    fn parse_record<T: serde::de::DeserializeOwned>(
        &self,
        kind: RecordKind,
        id: &str,
        value: Value,
    ) -> Result<T, RegistryError> {
        serde_json::from_value(value).map_err(|source| {
            RegistryError::Store(StoreError::Corrupt {
                kind,
                id: id.to_string(),
                source,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registry() -> RobotRegistry {
        RobotRegistry::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn create_fleet_of_three_starts_idle_at_origin() {
        let registry = registry();
        let robots = registry.create_fleet(3).unwrap();

        assert_eq!(robots.len(), 3);
        for id in ["machine1", "machine2", "machine3"] {
            let robot = &robots[id];
            assert_eq!(robot.battery, 100);
            assert_eq!(robot.location.x, 0.0);
            assert_eq!(robot.location.y, 0.0);
            assert!(!robot.charging);
            assert!(!robot.carrying_product);
        }

        // Persisted, not just returned
        assert_eq!(registry.list_robots().len(), 3);
    }

    #[test]
    fn create_fleet_rejects_zero() {
        let registry = registry();
        let err = registry.create_fleet(0).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
    }

    #[test]
    fn create_fleet_clears_previous_fleet_and_history() {
        let registry = registry();
        registry.create_fleet(5).unwrap();

        let robots = registry.create_fleet(2).unwrap();
        assert_eq!(robots.len(), 2);
        assert_eq!(registry.list_robots().len(), 2);
    }

    #[test]
    fn get_unknown_robot_is_not_found() {
        let registry = registry();
        registry.create_fleet(1).unwrap();

        let err = registry.get_robot("machine99").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn list_robots_skips_corrupt_record_but_keeps_rest() {
        let store = Arc::new(MemoryStore::new());
        let registry = RobotRegistry::new(store.clone());
        registry.create_fleet(2).unwrap();

        // Overwrite one record with a shape the Robot model can't parse
        store
            .put(RecordKind::DeviceInfo, "machine1", &json!({"garbage": true}))
            .unwrap();

        let robots = registry.list_robots();
        assert_eq!(robots.len(), 1);
        assert!(robots.contains_key("machine2"));
    }

    #[test]
    fn get_corrupt_robot_surfaces_store_error() {
        let store = Arc::new(MemoryStore::new());
        let registry = RobotRegistry::new(store.clone());
        registry.create_fleet(1).unwrap();

        store
            .put(RecordKind::DeviceInfo, "machine1", &json!([1, 2, 3]))
            .unwrap();

        let err = registry.get_robot("machine1").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Store(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn save_robot_is_idempotent_overwrite() {
        let registry = registry();
        let robots = registry.create_fleet(1).unwrap();

        let mut robot = robots["machine1"].clone();
        robot.battery = 55;
        registry.save_robot(&robot).unwrap();
        registry.save_robot(&robot).unwrap();

        assert_eq!(registry.get_robot("machine1").unwrap().battery, 55);
    }

    #[test]
    fn history_is_not_found_until_first_delivery() {
        let registry = registry();
        registry.create_fleet(1).unwrap();

        assert!(matches!(
            registry.history("machine1"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn update_firmware_matches_by_macaddr() {
        let registry = registry();
        let robots = registry.create_fleet(2).unwrap();
        let macaddr = robots["machine2"].macaddr.clone();

        let updated = registry.update_firmware(&macaddr, "v2.3.1").unwrap();
        assert_eq!(updated.id, "machine2");
        assert_eq!(updated.version, "v2.3.1");

        // Persisted
        assert_eq!(registry.get_robot("machine2").unwrap().version, "v2.3.1");
    }

    #[test]
    fn registry_over_filesystem_store_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();

        {
            let store = Arc::new(crate::store::FsStore::new(dir.path().join("testdb")).unwrap());
            let registry = RobotRegistry::new(store);
            registry.create_fleet(2).unwrap();
        }

        // A fresh registry over the same directory sees the fleet
        let store = Arc::new(crate::store::FsStore::new(dir.path().join("testdb")).unwrap());
        let registry = RobotRegistry::new(store);
        let robots = registry.list_robots();

        assert_eq!(robots.len(), 2);
        assert_eq!(robots["machine1"].battery, 100);
    }

    #[test]
    fn update_firmware_unknown_macaddr_is_not_found() {
        let registry = registry();
        registry.create_fleet(1).unwrap();

        let err = registry
            .update_firmware("00:00:00:00:00:00", "v9.9.9")
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }
}
