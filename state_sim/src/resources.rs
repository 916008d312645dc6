use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Global configuration parameters for the headless host.
#[derive(Resource, Debug, Clone)]
pub struct SimulationConfig {
    /// Wall-clock pause between host updates.
    pub tick_interval: Duration,
    /// Seed for world generation. Random when unset.
    pub world_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            world_seed: None,
        }
    }
}

/// Simulation tick counter.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Randomness for per-tick simulation systems, kept apart from world
/// generation so incidents do not shift regenerated worlds.
#[derive(Resource, Debug, Clone)]
pub struct SimulationRng(pub SmallRng);

impl SimulationRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}
