use crate::registry::{RegistryError, RobotRegistry};
use crate::robot::{DeliveryRecord, Robot};
use crate::sim::Delivery;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Turns a completed carry into an immutable history record.
///
/// Appending to the unit's delivery log is the only mutation this
/// component performs.
pub struct EventRecorder {
    registry: Arc<RobotRegistry>,
}

impl EventRecorder {
    pub fn new(registry: Arc<RobotRegistry>) -> Self {
        Self { registry }
    }

    /// Build the record (warehouse floor drawn uniformly, item code
    /// derived from the floor digit plus a random suffix) and append it.
    pub fn record(
        &self,
        robot: &Robot,
        delivery: &Delivery,
        rng: &mut impl Rng,
    ) -> Result<DeliveryRecord, RegistryError> {
        let warehouse_floor: u8 = rng.gen_range(1..=5);
        let code = format!("WH{}-HW{}", warehouse_floor, rng.gen_range(0..100_000));

        let record = DeliveryRecord {
            code,
            date: Utc::now(),
            distance: delivery.distance,
            energy_used: delivery.energy_used,
            elapsed_secs: delivery.elapsed_secs,
            id: robot.id.clone(),
            name: robot.name.clone(),
            macaddr: robot.macaddr.clone(),
            warehouse_floor,
        };

        self.registry.append_delivery(&record)?;
        info!(
            machine_id = %record.id,
            code = %record.code,
            warehouse_floor = record.warehouse_floor,
            "Delivery recorded"
        );

        Ok(record)
    }
}
