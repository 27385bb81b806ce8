use crate::api::{ApiError, RestAppState};
use crate::registry::RegistryError;
use crate::robot::Robot;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Firmware update request: the target unit's hardware address plus the
/// firmware image filename carrying the version.
#[derive(Debug, Deserialize)]
pub struct FirmwareRequest {
    pub macaddr: String,
    pub filename: String,
}

/// Create the firmware-update router
pub fn create_firmware_router(state: Arc<RestAppState>) -> Router {
    Router::new()
        .route("/api/firmware", post(apply_firmware))
        .with_state(state)
}

/// POST /api/firmware - Apply the version encoded in `filename` to the
/// unit whose hardware address matches `macaddr`.
async fn apply_firmware(
    State(state): State<Arc<RestAppState>>,
    Json(request): Json<FirmwareRequest>,
) -> Result<Json<Robot>, ApiError> {
    let version = parse_version(&request.filename).ok_or_else(|| {
        RegistryError::InvalidArgument(format!(
            "filename {} does not encode a firmware version",
            request.filename
        ))
    })?;

    let robot = state.registry.update_firmware(&request.macaddr, &version)?;
    Ok(Json(robot))
}

/// Extract the version from a firmware image filename.
///
/// Accepted pattern: `<name>_v<major>.<minor>.<patch>.bin`, e.g.
/// `agv-controller_v1.2.0.bin` -> `v1.2.0`.
pub fn parse_version(filename: &str) -> Option<String> {
    let stem = filename.strip_suffix(".bin")?;
    let pos = stem.rfind("_v")?;
    let version = &stem[pos + 1..];

    let numbers = version.strip_prefix('v')?;
    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    if !parts
        .iter()
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    Some(version.to_string())
}
