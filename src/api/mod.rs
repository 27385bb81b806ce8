// HTTP and WebSocket APIs

use crate::registry::{RegistryError, RobotRegistry};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;

pub mod firmware;
pub mod robots;
pub mod warehouse;
pub mod websocket;

pub use firmware::create_firmware_router;
pub use robots::create_robots_router;
pub use warehouse::create_warehouse_router;
pub use websocket::{create_ws_router, WsAppState};

/// Shared state for the REST routers
pub struct RestAppState {
    pub registry: Arc<RobotRegistry>,
}

/// JSON error body shared by all REST endpoints
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Registry failures mapped onto HTTP statuses
#[derive(Debug)]
pub struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RegistryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });

        (status, body).into_response()
    }
}
