use crate::api::{ApiError, RestAppState};
use crate::robot::DeliveryRecord;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Create the delivery-history router
pub fn create_warehouse_router(state: Arc<RestAppState>) -> Router {
    Router::new()
        .route("/api/warehouse", get(warehouse_state))
        .route("/api/warehouse/:machine_id", get(robot_history))
        .with_state(state)
}

/// GET /api/warehouse - Every delivery record, grouped by floor 1..=5
async fn warehouse_state(
    State(state): State<Arc<RestAppState>>,
) -> Json<HashMap<u8, Vec<DeliveryRecord>>> {
    Json(state.registry.warehouse_state())
}

/// GET /api/warehouse/:machine_id - One unit's delivery history
async fn robot_history(
    State(state): State<Arc<RestAppState>>,
    Path(machine_id): Path<String>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError> {
    let records = state.registry.history(&machine_id)?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RobotRegistry;
    use crate::robot::DeliveryRecord;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn app_state() -> Arc<RestAppState> {
        Arc::new(RestAppState {
            registry: Arc::new(RobotRegistry::new(Arc::new(MemoryStore::new()))),
        })
    }

    fn record(id: &str, floor: u8) -> DeliveryRecord {
        DeliveryRecord {
            code: format!("WH{}-HW123", floor),
            date: Utc::now(),
            distance: 636.4,
            energy_used: 14.0,
            elapsed_secs: 9,
            id: id.to_string(),
            name: "Pallet Truck Type AGV".to_string(),
            macaddr: "aa:bb:cc:dd:ee:ff".to_string(),
            warehouse_floor: floor,
        }
    }

    #[tokio::test]
    async fn warehouse_always_reports_all_five_floors() {
        let state = app_state();
        let floors = warehouse_state(State(state)).await;

        assert_eq!(floors.0.len(), 5);
        for floor in 1..=5 {
            assert!(floors.0[&floor].is_empty());
        }
    }

    #[tokio::test]
    async fn records_land_on_their_floor() {
        let state = app_state();
        state.registry.create_fleet(2).unwrap();
        state.registry.append_delivery(&record("machine1", 2)).unwrap();
        state.registry.append_delivery(&record("machine2", 2)).unwrap();
        state.registry.append_delivery(&record("machine1", 5)).unwrap();

        let floors = warehouse_state(State(state)).await;
        assert_eq!(floors.0[&2].len(), 2);
        assert_eq!(floors.0[&5].len(), 1);
        assert!(floors.0[&1].is_empty());
    }

    #[tokio::test]
    async fn history_returns_unit_records_in_order() {
        let state = app_state();
        state.registry.create_fleet(1).unwrap();
        state.registry.append_delivery(&record("machine1", 1)).unwrap();
        state.registry.append_delivery(&record("machine1", 3)).unwrap();

        let history = robot_history(State(state), Path("machine1".to_string()))
            .await
            .unwrap();
        assert_eq!(history.0.len(), 2);
        assert_eq!(history.0[0].warehouse_floor, 1);
        assert_eq!(history.0[1].warehouse_floor, 3);
    }

    #[tokio::test]
    async fn history_for_undelivered_unit_fails() {
        let state = app_state();
        state.registry.create_fleet(1).unwrap();

        let err = robot_history(State(state), Path("machine1".to_string())).await;
        assert!(err.is_err());
    }
}
