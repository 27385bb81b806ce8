use crate::registry::RobotRegistry;
use crate::robot::Robot;
use crate::sim::{step, EventRecorder};
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Advances the whole fleet by one discrete step per `tick()` call.
///
/// All randomness flows through one seedable RNG so a seeded engine
/// replays identical trajectories. The engine never owns unit state:
/// it reads through the registry, steps each unit, and persists the
/// result before the next unit is processed.
pub struct SimEngine {
    registry: Arc<RobotRegistry>,
    recorder: EventRecorder,
    rng: Mutex<ChaCha8Rng>,
}

impl SimEngine {
    /// `seed` pins the RNG for reproducible runs; `None` seeds from
    /// the OS entropy pool.
    pub fn new(registry: Arc<RobotRegistry>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => {
                info!(seed = seed, "Simulation RNG seeded");
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            recorder: EventRecorder::new(registry.clone()),
            registry,
            rng: Mutex::new(rng),
        }
    }

    /// Tick every unit exactly once and return the fresh fleet snapshot.
    ///
    /// Units are independent: a store failure on one unit is logged and
    /// never stops the others. An empty fleet is a no-op.
    pub fn tick(&self) -> HashMap<String, Robot> {
        let robots = self.registry.list_robots();
        if robots.is_empty() {
            return HashMap::new();
        }

        let now = Utc::now();
        let mut rng = self.rng.lock().expect("simulation RNG lock poisoned");

        let mut snapshot = HashMap::with_capacity(robots.len());
        for (id, mut robot) in robots {
            let delivery = step(&mut robot, &mut *rng, now);

            if let Some(delivery) = delivery {
                if let Err(e) = self.recorder.record(&robot, &delivery, &mut *rng) {
                    error!(machine_id = %id, error = %e, "Failed to record delivery");
                }
            }

            if let Err(e) = self.registry.save_robot(&robot) {
                error!(machine_id = %id, error = %e, "Failed to persist robot state");
            }

            snapshot.insert(id, robot);
        }

        snapshot
    }
}
