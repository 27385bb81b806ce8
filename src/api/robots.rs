use crate::api::{ApiError, RestAppState};
use crate::robot::Robot;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Response for fleet creation
#[derive(Serialize)]
pub struct CreateFleetResponse {
    pub message: String,
    pub robots: HashMap<String, Robot>,
}

/// Create the fleet-management router
pub fn create_robots_router(state: Arc<RestAppState>) -> Router {
    Router::new()
        .route("/api/create-robots/:count", post(create_robots))
        .route("/api/robots", get(list_robots))
        .route("/api/robots/:machine_id", get(get_robot))
        .with_state(state)
}

/// POST /api/create-robots/:count - Replace the fleet with `count` fresh units
async fn create_robots(
    State(state): State<Arc<RestAppState>>,
    Path(count): Path<usize>,
) -> Result<Json<CreateFleetResponse>, ApiError> {
    let robots = state.registry.create_fleet(count)?;

    Ok(Json(CreateFleetResponse {
        message: format!("Created {} robots", count),
        robots,
    }))
}

/// GET /api/robots - Current state of every unit
async fn list_robots(State(state): State<Arc<RestAppState>>) -> Json<HashMap<String, Robot>> {
    Json(state.registry.list_robots())
}

/// GET /api/robots/:machine_id - One unit's state
async fn get_robot(
    State(state): State<Arc<RestAppState>>,
    Path(machine_id): Path<String>,
) -> Result<Json<Robot>, ApiError> {
    let robot = state.registry.get_robot(&machine_id)?;
    Ok(Json(robot))
}
