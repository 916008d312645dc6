//! The simulated world of named states, exposed to the command bridge
//! through [`WorldGateway`].

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use bevy::prelude::Resource;
use bridge_runtime::{EventListener, StateAttributes, WorldEvent, WorldGateway};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::world_preset::WorldPreset;
use crate::worldgen::generate_states;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoliticalSystem {
    Monarchy,
    Republic,
    Theocracy,
    Tribal,
}

impl PoliticalSystem {
    /// Title used in the state's full name.
    pub fn title(self) -> &'static str {
        match self {
            PoliticalSystem::Monarchy => "Kingdom",
            PoliticalSystem::Republic => "Republic",
            PoliticalSystem::Theocracy => "Holy See",
            PoliticalSystem::Tribal => "Chiefdom",
        }
    }
}

impl fmt::Display for PoliticalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PoliticalSystem::Monarchy => "Monarchy",
            PoliticalSystem::Republic => "Republic",
            PoliticalSystem::Theocracy => "Theocracy",
            PoliticalSystem::Tribal => "Tribal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateTrait(pub String);

impl fmt::Display for StateTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateRecord {
    pub id: StateId,
    /// Stable name used to address capabilities.
    pub ui_name: String,
    /// Name shown to players; claimed through `register`.
    pub display_name: String,
    pub color: String,
    pub ethnic: String,
    pub political_system: PoliticalSystem,
    pub diplomacy_power: f32,
    pub diplomacy_efficiency: f32,
    pub food_reserve: f32,
    pub population: u64,
    pub gold: i64,
    pub gold_per_month: f32,
    pub traits: Vec<StateTrait>,
    pub enemies: BTreeSet<StateId>,
}

impl StateRecord {
    pub fn full_name(&self) -> String {
        format!("{} of {}", self.political_system.title(), self.display_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    WarDeclared,
    PeaceSigned,
    TributePaid,
    BorderIncident,
}

/// Entry of the world history log. Descriptions carry inline markup.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    pub tick: u64,
    pub kind: HistoryKind,
    pub description: String,
}

impl WorldEvent for HistoryEvent {
    fn description(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.description)
    }
}

#[derive(Resource)]
pub struct StateWorld {
    preset: Arc<WorldPreset>,
    rng: ChaCha8Rng,
    states: Vec<StateRecord>,
    history: Vec<HistoryEvent>,
    listeners: Vec<EventListener<HistoryEvent>>,
    label_refreshes: u64,
    generation: u32,
    tick: u64,
}

impl StateWorld {
    pub fn generate(preset: Arc<WorldPreset>, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let states = generate_states(&preset, &mut rng);
        info!(
            target: "state_sim::world",
            seed,
            states = states.len(),
            "world.generated"
        );
        Self {
            preset,
            rng,
            states,
            history: Vec::new(),
            listeners: Vec::new(),
            label_refreshes: 0,
            generation: 0,
            tick: 0,
        }
    }

    pub fn preset(&self) -> &WorldPreset {
        &self.preset
    }

    pub fn states(&self) -> &[StateRecord] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&StateRecord> {
        self.states
            .get(id.0 as usize)
            .filter(|state| state.id == id)
    }

    fn state_mut(&mut self, id: StateId) -> Option<&mut StateRecord> {
        self.states
            .get_mut(id.0 as usize)
            .filter(|state| state.id == id)
    }

    pub fn history(&self) -> &[HistoryEvent] {
        &self.history
    }

    /// How many times labels were refreshed after a rename.
    pub fn label_refreshes(&self) -> u64 {
        self.label_refreshes
    }

    /// Incremented on every regeneration.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn are_enemies(&self, a: StateId, b: StateId) -> bool {
        self.state(a)
            .map_or(false, |state| state.enemies.contains(&b))
    }

    /// Every unordered pair of states at war, lowest id first.
    pub fn enemy_pairs(&self) -> Vec<(StateId, StateId)> {
        self.states
            .iter()
            .flat_map(|state| {
                state
                    .enemies
                    .iter()
                    .filter(move |enemy| **enemy > state.id)
                    .map(move |enemy| (state.id, *enemy))
            })
            .collect()
    }

    pub fn set_war(&mut self, a: StateId, b: StateId, at_war: bool) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(state) = self.state_mut(from) {
                if at_war {
                    state.enemies.insert(to);
                } else {
                    state.enemies.remove(&to);
                }
            }
        }
    }

    /// Move up to `amount` gold. Returns what was actually moved.
    pub fn transfer_gold(&mut self, from: StateId, to: StateId, amount: i64) -> i64 {
        let Some(source) = self.state_mut(from) else {
            return 0;
        };
        let moved = amount.clamp(0, source.gold.max(0));
        source.gold -= moved;
        if let Some(target) = self.state_mut(to) {
            target.gold += moved;
        }
        moved
    }

    pub fn apply_casualties(&mut self, id: StateId, population: u64, food: f32) {
        if let Some(state) = self.state_mut(id) {
            state.population = state.population.saturating_sub(population);
            state.food_reserve = (state.food_reserve - food).max(0.0);
        }
    }

    /// Append to the history log and notify every listener.
    pub fn record_event(&mut self, kind: HistoryKind, description: impl Into<String>) {
        let event = HistoryEvent {
            tick: self.tick,
            kind,
            description: description.into(),
        };
        debug!(
            target: "state_sim::world",
            kind = ?event.kind,
            tick = event.tick,
            "history.recorded"
        );
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.history.push(event);
    }

    /// Display name wrapped in markup for history descriptions.
    pub fn tagged_name(&self, id: StateId) -> String {
        match self.state(id) {
            Some(state) => format!("<b>{}</b>", state.display_name),
            None => format!("<b>{id}</b>"),
        }
    }
}

impl WorldGateway for StateWorld {
    type EntityRef = StateId;
    type TraitRef = StateTrait;
    type Event = HistoryEvent;

    fn list_entities(&self) -> Vec<StateId> {
        self.states.iter().map(|state| state.id).collect()
    }

    fn display_name(&self, entity: StateId) -> Option<&str> {
        self.state(entity).map(|state| state.display_name.as_str())
    }

    fn find_by_display_name(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .find(|state| state.display_name == name)
            .map(|state| state.id)
    }

    fn find_by_ui_name(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .find(|state| state.ui_name == name)
            .map(|state| state.id)
    }

    fn rename(&mut self, entity: StateId, name: &str) {
        if let Some(state) = self.state_mut(entity) {
            debug!(
                target: "state_sim::world",
                ui_name = %state.ui_name,
                from = %state.display_name,
                to = name,
                "state.renamed"
            );
            state.display_name = name.to_string();
        }
    }

    fn notify_renamed(&mut self) {
        self.label_refreshes += 1;
    }

    fn reset_world(&mut self) {
        self.states = generate_states(&self.preset, &mut self.rng);
        self.history.clear();
        self.generation += 1;
        info!(
            target: "state_sim::world",
            generation = self.generation,
            states = self.states.len(),
            "world.regenerated"
        );
    }

    fn enemies_of(&self, entity: StateId) -> Vec<StateId> {
        self.state(entity)
            .map(|state| state.enemies.iter().copied().collect())
            .unwrap_or_default()
    }

    fn traits_of(&self, entity: StateId) -> Vec<StateTrait> {
        self.state(entity)
            .map(|state| state.traits.clone())
            .unwrap_or_default()
    }

    fn attributes(&self, entity: StateId) -> Option<StateAttributes> {
        let state = self.state(entity)?;
        Some(StateAttributes {
            full_name: state.full_name(),
            color: state.color.clone(),
            ethnic: state.ethnic.clone(),
            diplomacy_power: state.diplomacy_power,
            diplomacy_efficiency: state.diplomacy_efficiency,
            food_reserve: state.food_reserve,
            population: state.population,
            gold: state.gold,
            gold_per_month: state.gold_per_month,
            political_system: state.political_system.to_string(),
        })
    }

    fn subscribe_events(&mut self, listener: EventListener<HistoryEvent>) {
        self.listeners.push(listener);
    }
}
