use crate::sim::TickUpdate;
use crate::subscription::ConnectionManager;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Shared application state for the WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    /// Tick fan-out channel owned by the simulation driver
    pub tick_tx: broadcast::Sender<TickUpdate>,
}

/// Create the WebSocket router
pub fn create_ws_router(state: Arc<WsAppState>) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

/// GET /api/ws - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Hand the socket to a fresh connection manager subscribed to the
/// tick broadcast. Registered with no unit subscription.
async fn handle_socket(socket: WebSocket, state: Arc<WsAppState>) {
    let tick_rx = state.tick_tx.subscribe();
    ConnectionManager::new().handle(socket, tick_rx).await;
}
