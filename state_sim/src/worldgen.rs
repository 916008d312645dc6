use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::world::{PoliticalSystem, StateId, StateRecord, StateTrait};
use crate::world_preset::WorldPreset;

/// Roll a fresh set of states. Display names start out equal to the UI names.
pub fn generate_states<R: Rng + ?Sized>(preset: &WorldPreset, rng: &mut R) -> Vec<StateRecord> {
    let count = preset
        .state_count
        .sample(rng)
        .min(preset.state_names.len());
    let names: Vec<&String> = preset.state_names.choose_multiple(rng, count).collect();

    let mut states: Vec<StateRecord> = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| roll_state(preset, StateId(index as u32), name, rng))
        .collect();

    for a in 0..states.len() {
        for b in (a + 1)..states.len() {
            if rng.gen::<f32>() < preset.rivalry_chance {
                let (id_a, id_b) = (states[a].id, states[b].id);
                states[a].enemies.insert(id_b);
                states[b].enemies.insert(id_a);
            }
        }
    }

    states
}

fn roll_state<R: Rng + ?Sized>(preset: &WorldPreset, id: StateId, name: &str, rng: &mut R) -> StateRecord {
    let trait_count = rng.gen_range(0..=preset.max_traits_per_state.min(preset.traits.len()));
    let traits = preset
        .traits
        .choose_multiple(rng, trait_count)
        .map(|label| StateTrait(label.clone()))
        .collect();

    StateRecord {
        id,
        ui_name: name.to_string(),
        display_name: name.to_string(),
        color: pick(&preset.colors, rng).unwrap_or_else(|| "#ffffff".to_string()),
        ethnic: pick(&preset.ethnic_groups, rng).unwrap_or_else(|| "Unknown".to_string()),
        political_system: preset
            .political_systems
            .choose(rng)
            .copied()
            .unwrap_or(PoliticalSystem::Tribal),
        diplomacy_power: preset.diplomacy_power.sample(rng),
        diplomacy_efficiency: preset.diplomacy_efficiency.sample(rng),
        food_reserve: preset.food_reserve.sample(rng),
        population: preset.population.sample(rng),
        gold: preset.gold.sample(rng),
        gold_per_month: preset.gold_per_month.sample(rng),
        traits,
        enemies: BTreeSet::new(),
    }
}

fn pick<R: Rng + ?Sized>(options: &[String], rng: &mut R) -> Option<String> {
    options.choose(rng).cloned()
}
