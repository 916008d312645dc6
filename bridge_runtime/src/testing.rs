//! In-memory [`WorldGateway`] used by the unit tests of this crate.

use std::borrow::Cow;

use crate::capabilities::{CapabilityError, CapabilitySpec};
use crate::gateway::{EventListener, StateAttributes, WorldEvent, WorldGateway};

#[derive(Debug, Clone)]
pub(crate) struct FakeState {
    pub display_name: String,
    pub ui_name: String,
    pub traits: Vec<String>,
    pub enemies: Vec<usize>,
    pub gold: i64,
}

impl FakeState {
    pub fn named(name: &str) -> Self {
        Self {
            display_name: name.to_string(),
            ui_name: name.to_string(),
            traits: Vec::new(),
            enemies: Vec::new(),
            gold: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeEvent(pub String);

impl WorldEvent for FakeEvent {
    fn description(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.0)
    }
}

#[derive(Default)]
pub(crate) struct FakeWorld {
    pub states: Vec<FakeState>,
    pub initial: Vec<FakeState>,
    pub rename_notifications: usize,
    pub resets: usize,
    listeners: Vec<EventListener<FakeEvent>>,
}

impl FakeWorld {
    pub fn new(states: Vec<FakeState>) -> Self {
        Self {
            initial: states.clone(),
            states,
            ..Self::default()
        }
    }

    pub fn with_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|name| FakeState::named(name)).collect())
    }

    /// Arcadia (Coastal, Mercantile) at war with Boravia.
    pub fn arcadia() -> Self {
        let mut arcadia = FakeState::named("Arcadia");
        arcadia.traits = vec!["Coastal".to_string(), "Mercantile".to_string()];
        arcadia.enemies = vec![1];
        let mut boravia = FakeState::named("Boravia");
        boravia.enemies = vec![0];
        Self::new(vec![arcadia, boravia, FakeState::named("Calder")])
    }

    pub fn display_names(&self) -> Vec<&str> {
        self.states
            .iter()
            .map(|state| state.display_name.as_str())
            .collect()
    }

    pub fn emit(&mut self, description: &str) {
        let event = FakeEvent(description.to_string());
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl WorldGateway for FakeWorld {
    type EntityRef = usize;
    type TraitRef = String;
    type Event = FakeEvent;

    fn list_entities(&self) -> Vec<usize> {
        (0..self.states.len()).collect()
    }

    fn display_name(&self, entity: usize) -> Option<&str> {
        self.states
            .get(entity)
            .map(|state| state.display_name.as_str())
    }

    fn find_by_display_name(&self, name: &str) -> Option<usize> {
        self.states
            .iter()
            .position(|state| state.display_name == name)
    }

    fn find_by_ui_name(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.ui_name == name)
    }

    fn rename(&mut self, entity: usize, name: &str) {
        if let Some(state) = self.states.get_mut(entity) {
            state.display_name = name.to_string();
        }
    }

    fn notify_renamed(&mut self) {
        self.rename_notifications += 1;
    }

    fn reset_world(&mut self) {
        self.states = self.initial.clone();
        self.resets += 1;
    }

    fn enemies_of(&self, entity: usize) -> Vec<usize> {
        self.states
            .get(entity)
            .map(|state| state.enemies.clone())
            .unwrap_or_default()
    }

    fn traits_of(&self, entity: usize) -> Vec<String> {
        self.states
            .get(entity)
            .map(|state| state.traits.clone())
            .unwrap_or_default()
    }

    fn attributes(&self, entity: usize) -> Option<StateAttributes> {
        let state = self.states.get(entity)?;
        Some(StateAttributes {
            full_name: format!("Kingdom of {}", state.display_name),
            color: "#1f6feb".to_string(),
            ethnic: "Highlanders".to_string(),
            diplomacy_power: 12.5,
            diplomacy_efficiency: 0.8,
            food_reserve: 340.0,
            population: 120_000,
            gold: state.gold,
            gold_per_month: 14.5,
            political_system: "Monarchy".to_string(),
        })
    }

    fn subscribe_events(&mut self, listener: EventListener<FakeEvent>) {
        self.listeners.push(listener);
    }
}

fn declare_war(world: &mut FakeWorld, subject: usize, target: usize) -> Result<String, CapabilityError> {
    if subject == target {
        return Err(CapabilityError::SameState);
    }
    world.states[subject].enemies.push(target);
    world.states[target].enemies.push(subject);
    Ok(format!("{subject} now at war with {target}"))
}

fn levy(world: &mut FakeWorld, subject: usize, _target: usize) -> Result<String, CapabilityError> {
    if world.states[subject].gold <= 0 {
        return Err(CapabilityError::Rejected("treasury is empty".to_string()));
    }
    world.states[subject].gold -= 10;
    Ok("levied".to_string())
}

pub(crate) const FAKE_CAPABILITIES: &[CapabilitySpec<FakeWorld>] = &[
    CapabilitySpec {
        id: "declare_war",
        description: "Mark both states as enemies.",
        handler: declare_war,
    },
    CapabilitySpec {
        id: "levy",
        description: "Spend ten gold from the subject.",
        handler: levy,
    },
];
