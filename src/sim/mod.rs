use crate::robot::{Point, Robot};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

mod driver;
mod engine;
mod recorder;

pub use driver::{run_tick_loop, FleetStats, TickUpdate};
pub use engine::SimEngine;
pub use recorder::EventRecorder;

/// Fixed candidate pickup points a seeking robot is assigned from
pub const PICKUP_LOCATIONS: [Point; 5] = [
    Point { x: 50.0, y: 50.0 },
    Point { x: 100.0, y: 100.0 },
    Point { x: 200.0, y: 50.0 },
    Point { x: 50.0, y: 200.0 },
    Point { x: 150.0, y: 150.0 },
];

/// The single delivery destination shared by the whole fleet
pub const WAREHOUSE_LOCATION: Point = Point { x: 500.0, y: 500.0 };

/// Fraction of the remaining vector covered per tick (geometric approach)
pub const APPROACH_FRACTION: f64 = 0.5;

/// Distance below which a robot counts as arrived (strict less-than)
pub const PROXIMITY_THRESHOLD: f64 = 10.0;

pub const MAX_BATTERY: u8 = 100;
pub const CHARGE_INCREMENT: u8 = 10;
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Post-motion jitter amplitude per axis
pub const JITTER_RANGE: f64 = 2.5;

/// Outcome of a completed carry, handed to the event recorder
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delivery {
    /// Straight-line pickup-to-warehouse distance
    pub distance: f64,
    /// Battery consumed between pickup and arrival, clamped at zero
    pub energy_used: f64,
    /// Wall-clock seconds between pickup and arrival
    pub elapsed_secs: i64,
}

/// Advance one robot by exactly one simulation step.
///
/// Pure state transition: no I/O, all randomness drawn from the caller's
/// RNG, `now` injected. Returns a `Delivery` when the robot reached the
/// warehouse this step.
pub fn step(robot: &mut Robot, rng: &mut impl Rng, now: DateTime<Utc>) -> Option<Delivery> {
    // A charging robot only charges: no movement, no jitter
    if robot.charging {
        robot.battery = robot.battery.saturating_add(CHARGE_INCREMENT).min(MAX_BATTERY);
        if robot.battery >= MAX_BATTERY {
            robot.charging = false;
            info!(machine_id = %robot.id, "Charge complete, resuming pickup duty");
        }
        return None;
    }

    let mut delivery = None;

    if !robot.carrying_product {
        // Assign a pickup target if this robot has none yet
        let target = *robot
            .current_pickup_location
            .get_or_insert_with(|| PICKUP_LOCATIONS[rng.gen_range(0..PICKUP_LOCATIONS.len())]);

        // Arrival is judged on the distance before the move
        let remaining = robot.location.distance_to(&target);
        approach(&mut robot.location, &target);

        if remaining < PROXIMITY_THRESHOLD {
            robot.carrying_product = true;
            robot.battery_at_pickup = Some(robot.battery);
            robot.pickup_start_time = Some(now);
            info!(machine_id = %robot.id, "Picked up a product");
        }
    } else {
        let remaining = robot.location.distance_to(&WAREHOUSE_LOCATION);
        approach(&mut robot.location, &WAREHOUSE_LOCATION);

        if remaining < PROXIMITY_THRESHOLD {
            if let (Some(pickup), Some(battery_at_pickup), Some(started)) = (
                robot.current_pickup_location,
                robot.battery_at_pickup,
                robot.pickup_start_time,
            ) {
                let distance = pickup.distance_to(&WAREHOUSE_LOCATION);
                // Clamped: a mid-trip recharge anomaly must not go negative
                let energy_used = (f64::from(battery_at_pickup) - f64::from(robot.battery)).max(0.0);
                let elapsed_secs = (now - started).num_seconds();

                delivery = Some(Delivery {
                    distance,
                    energy_used,
                    elapsed_secs,
                });
                info!(machine_id = %robot.id, distance = distance, "Delivered product to warehouse");
            }

            robot.carrying_product = false;
            robot.current_pickup_location = None;
            robot.battery_at_pickup = None;
            robot.pickup_start_time = None;
        }
    }

    // Post-motion jitter; its travel distance drains the battery
    robot.previous_location = robot.location;
    robot.location.x += rng.gen_range(-JITTER_RANGE..JITTER_RANGE);
    robot.location.y += rng.gen_range(-JITTER_RANGE..JITTER_RANGE);

    let jitter_distance = robot.previous_location.distance_to(&robot.location);
    robot.battery = robot.battery.saturating_sub(jitter_distance.floor() as u8);

    // Low battery sends the robot back to the dock, abandoning any load
    if robot.battery <= LOW_BATTERY_THRESHOLD && !robot.charging {
        robot.charging = true;
        robot.location = Point::ORIGIN;
        robot.carrying_product = false;
        robot.current_pickup_location = None;
        robot.battery_at_pickup = None;
        robot.pickup_start_time = None;
        info!(machine_id = %robot.id, battery = robot.battery, "Low battery, returning to charging dock");
    }

    delivery
}

/// Move 50% of the remaining vector toward the target. Never overshoots;
/// converges geometrically, so arrival is decided by the proximity
/// threshold rather than by reaching zero distance.
fn approach(location: &mut Point, target: &Point) {
    location.x += APPROACH_FRACTION * (target.x - location.x);
    location.y += APPROACH_FRACTION * (target.y - location.y);
}
