use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed catalog of AGV model names assigned at fleet creation
pub const MACHINE_NAMES: [&str; 3] = [
    "Counter-Balance Forklift Type AGV",
    "Pallet Truck Type AGV",
    "High-mast Reach Forklift Type AGV",
];

/// Firmware version every robot ships with
pub const INITIAL_VERSION: &str = "v1.0.1";

/// 2D warehouse-floor coordinate
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One simulated AGV unit
///
/// Wire format uses camelCase keys (`carryingProduct`,
/// `currentPickupLocation`, ...) to match the observer protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    /// Stable identifier assigned at creation (`machine1`, `machine2`, ...)
    pub id: String,

    /// Model name from the fixed catalog
    pub name: String,

    /// Firmware version; mutated only by the firmware-update path
    pub version: String,

    /// Hardware address, immutable after creation
    pub macaddr: String,

    /// Charge level, always within 0..=100
    pub battery: u8,

    /// Informational only; the simulation never touches it
    pub temperature: i32,

    pub location: Point,
    pub previous_location: Point,

    pub charging: bool,
    pub carrying_product: bool,

    /// Pickup target while seeking or carrying
    pub current_pickup_location: Option<Point>,

    /// Charge level recorded at the moment of pickup (set only while carrying)
    pub battery_at_pickup: Option<u8>,

    /// Wall-clock time of the pickup (set only while carrying)
    pub pickup_start_time: Option<DateTime<Utc>>,
}

impl Robot {
    /// Generate a fresh robot for fleet creation: full battery, parked at
    /// the origin, idle.
    pub fn generate(index: usize, rng: &mut impl Rng) -> Self {
        Self {
            id: format!("machine{}", index),
            name: MACHINE_NAMES[rng.gen_range(0..MACHINE_NAMES.len())].to_string(),
            version: INITIAL_VERSION.to_string(),
            macaddr: generate_macaddr(rng),
            battery: 100,
            temperature: rng.gen_range(20..50),
            location: Point::ORIGIN,
            previous_location: Point::ORIGIN,
            charging: false,
            carrying_product: false,
            current_pickup_location: None,
            battery_at_pickup: None,
            pickup_start_time: None,
        }
    }
}

/// Random hardware address: 6 bytes as colon-separated lowercase hex
pub fn generate_macaddr(rng: &mut impl Rng) -> String {
    (0..6)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect::<Vec<_>>()
        .join(":")
}

/// One completed pickup-to-warehouse delivery, appended to the unit's
/// history and never mutated afterwards. Keys match the on-disk
/// delivery log format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Item code derived from the warehouse floor plus a random suffix
    pub code: String,

    pub date: DateTime<Utc>,

    /// Straight-line pickup-to-warehouse distance
    pub distance: f64,

    /// Battery consumed while carrying, clamped at zero
    pub energy_used: f64,

    /// Seconds between pickup and delivery
    pub elapsed_secs: i64,

    pub id: String,
    pub name: String,
    pub macaddr: String,

    /// One of floors 1..=5
    pub warehouse_floor: u8,
}
