use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::resources::{SimulationRng, SimulationTick};
use crate::world::{HistoryKind, StateWorld};

/// Advance the tick counter and stamp it on the world.
pub fn advance_tick(mut tick: ResMut<SimulationTick>, mut world: ResMut<StateWorld>) {
    tick.0 = tick.0.wrapping_add(1);
    world.set_tick(tick.0);
}

/// Occasionally stage a clash between two states already at war.
pub fn simulate_border_incidents(mut world: ResMut<StateWorld>, mut rng: ResMut<SimulationRng>) {
    let chance = world.preset().border_incident_chance;
    if chance <= 0.0 || rng.0.gen::<f32>() >= chance {
        return;
    }
    let pairs = world.enemy_pairs();
    let Some(&(a, b)) = pairs.choose(&mut rng.0) else {
        return;
    };

    let casualties = rng.0.gen_range(50..=500);
    let food = rng.0.gen_range(1.0..10.0);
    world.apply_casualties(a, casualties, food);
    world.apply_casualties(b, casualties, food);

    let description = format!(
        "<color=#d1242f>Border clash</color> erupts between {} and {}",
        world.tagged_name(a),
        world.tagged_name(b)
    );
    world.record_event(HistoryKind::BorderIncident, description);
}
