use crate::sim::TickUpdate;
use crate::subscription::protocol::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Owns one WebSocket connection and its subscription state.
///
/// The subscription is mutated only by this connection's task, so no
/// locking is needed: inbound subscribe requests and outbound tick
/// fan-out are serialized through one `select!` loop.
pub struct ConnectionManager {
    /// Connection id for log correlation
    connection_id: Uuid,

    /// `None` receives the fleet-wide broadcast; `Some(id)` narrows
    /// the view to that unit
    subscription: Option<String>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            subscription: None,
        }
    }

    /// Handle the connection until the client goes away
    pub async fn handle(
        mut self,
        mut socket: WebSocket,
        mut tick_rx: broadcast::Receiver<TickUpdate>,
    ) {
        info!(connection_id = %self.connection_id, "WebSocket connection established");

        loop {
            tokio::select! {
                // Inbound client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            self.handle_client_message(&text);
                        }
                        Ok(Message::Close(_)) => {
                            info!(connection_id = %self.connection_id, "WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(connection_id = %self.connection_id, error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(connection_id = %self.connection_id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Tick updates from the simulation driver
                result = tick_rx.recv() => {
                    match result {
                        Ok(update) => {
                            let msg = ServerMessage::for_subscription(
                                self.subscription.as_deref(),
                                &update,
                            );
                            if let Err(e) = self.send(&mut socket, &msg).await {
                                error!(connection_id = %self.connection_id, error = %e, "Failed to send tick update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(connection_id = %self.connection_id, skipped = skipped, "Observer lagged, skipped ticks");
                            // Continue with the next update
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!(connection_id = %self.connection_id, "Tick broadcast channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        info!(connection_id = %self.connection_id, "WebSocket connection closed");
    }

    /// Apply a well-formed subscribe request; drop everything else
    /// without an error response.
    fn handle_client_message(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Subscribe { machine_id }) => {
                info!(
                    connection_id = %self.connection_id,
                    machine_id = %machine_id,
                    "Client subscribed to unit"
                );
                self.subscription = Some(machine_id);
            }
            Err(_) => {
                warn!(connection_id = %self.connection_id, "Ignoring malformed client message");
            }
        }
    }

    async fn send(&self, socket: &mut WebSocket, msg: &ServerMessage) -> anyhow::Result<()> {
        let json = serde_json::to_string(msg)?;
        socket.send(Message::Text(json)).await?;
        Ok(())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
