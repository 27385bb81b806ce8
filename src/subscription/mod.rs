// WebSocket subscription management

pub mod manager;
pub mod protocol;

pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ErrorMessage, FleetMessage, RobotMessage, ServerMessage};
