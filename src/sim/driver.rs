use crate::robot::Robot;
use crate::sim::SimEngine;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Aggregate fleet statistics computed once per tick
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total_robots: usize,
    pub charging_count: usize,
    pub running_count: usize,
    /// Mean battery, rounded to two decimals
    pub avg_battery: f64,
    /// Mean temperature, rounded to two decimals
    pub avg_temperature: f64,
}

impl FleetStats {
    pub fn compute(robots: &HashMap<String, Robot>) -> Self {
        let total_robots = robots.len();
        if total_robots == 0 {
            return Self {
                total_robots: 0,
                charging_count: 0,
                running_count: 0,
                avg_battery: 0.0,
                avg_temperature: 0.0,
            };
        }

        let charging_count = robots.values().filter(|r| r.charging).count();
        let battery_sum: f64 = robots.values().map(|r| f64::from(r.battery)).sum();
        let temperature_sum: f64 = robots.values().map(|r| f64::from(r.temperature)).sum();

        Self {
            total_robots,
            charging_count,
            running_count: total_robots - charging_count,
            avg_battery: round2(battery_sum / total_robots as f64),
            avg_temperature: round2(temperature_sum / total_robots as f64),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One tick's worth of broadcast state: the fresh fleet snapshot plus
/// the aggregate statistics derived from it.
#[derive(Clone, Debug)]
pub struct TickUpdate {
    pub robots: HashMap<String, Robot>,
    pub stats: FleetStats,
}

/// Periodic simulation driver.
///
/// Every `interval_ms` of wall-clock time: tick the engine once, then
/// fan the snapshot out to every observer through the broadcast
/// channel. All simulation mutation happens on this one task, so unit
/// state needs no locking. Send errors are ignored (no connected
/// observer is fine).
pub async fn run_tick_loop(
    engine: Arc<SimEngine>,
    tick_tx: broadcast::Sender<TickUpdate>,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms));

    // Skip missed ticks to prevent backlog under load
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_ms = interval_ms, "Simulation tick loop started");

    loop {
        ticker.tick().await;

        let robots = engine.tick();
        let stats = FleetStats::compute(&robots);

        let _ = tick_tx.send(TickUpdate { robots, stats });
    }
}
