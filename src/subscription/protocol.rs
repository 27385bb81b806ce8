use crate::robot::Robot;
use crate::sim::{FleetStats, TickUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client → Server message types. Anything that doesn't parse into one
/// of these is silently dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Narrow this connection's view to a single unit. Membership is
    /// not validated here; it is re-checked on every broadcast.
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(rename = "machineId")]
        machine_id: String,
    },
}

/// Server → Client: full fleet snapshot plus aggregate statistics
#[derive(Debug, Clone, Serialize)]
pub struct FleetMessage {
    pub robots: HashMap<String, Robot>,
    #[serde(flatten)]
    pub stats: FleetStats,
}

/// Server → Client: one subscribed unit's state
#[derive(Debug, Clone, Serialize)]
pub struct RobotMessage {
    pub robot: Robot,
}

/// Server → Client: the subscribed unit is not in the fleet
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn no_data(machine_id: &str) -> Self {
        Self {
            error: format!("No data for {}", machine_id),
        }
    }
}

/// Outbound message, one of the three protocol shapes
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Fleet(FleetMessage),
    Robot(RobotMessage),
    Error(ErrorMessage),
}

impl ServerMessage {
    /// Project one tick update through a connection's subscription.
    ///
    /// No subscription gets the whole fleet; a subscribed id present
    /// in the snapshot gets that unit alone; a subscribed id absent
    /// from it gets an explicit not-found notice naming it.
    pub fn for_subscription(subscription: Option<&str>, update: &TickUpdate) -> Self {
        match subscription {
            None => Self::Fleet(FleetMessage {
                robots: update.robots.clone(),
                stats: update.stats.clone(),
            }),
            Some(machine_id) => match update.robots.get(machine_id) {
                Some(robot) => Self::Robot(RobotMessage {
                    robot: robot.clone(),
                }),
                None => Self::Error(ErrorMessage::no_data(machine_id)),
            },
        }
    }
}
