//! The query/mutation surface the bridge consumes from the simulation.
//!
//! The world engine owns every entity; the bridge only holds copyable
//! references handed out by [`WorldGateway::list_entities`] and the two
//! lookup functions. States carry two distinct name axes: the display name
//! claimed through `register` and queried by `info`, and the UI name used to
//! address capability invocations. The two lookups are never conflated.

use std::borrow::Cow;
use std::fmt;

/// Attribute snapshot read for the `info` report.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAttributes {
    pub full_name: String,
    pub color: String,
    pub ethnic: String,
    pub diplomacy_power: f32,
    pub diplomacy_efficiency: f32,
    pub food_reserve: f32,
    pub population: u64,
    pub gold: i64,
    pub gold_per_month: f32,
    pub political_system: String,
}

/// A world history event relayed to the event channel.
pub trait WorldEvent {
    /// Human readable description; may contain markup tags.
    fn description(&self) -> Cow<'_, str>;
}

/// Callback registered with [`WorldGateway::subscribe_events`].
pub type EventListener<E> = Box<dyn FnMut(&E) + Send + Sync>;

pub trait WorldGateway {
    type EntityRef: Copy + Eq + fmt::Debug;
    type TraitRef: fmt::Display;
    type Event: WorldEvent;

    fn list_entities(&self) -> Vec<Self::EntityRef>;

    /// Current display name, or `None` when the reference is stale.
    fn display_name(&self, entity: Self::EntityRef) -> Option<&str>;

    fn find_by_display_name(&self, name: &str) -> Option<Self::EntityRef>;

    fn find_by_ui_name(&self, name: &str) -> Option<Self::EntityRef>;

    fn rename(&mut self, entity: Self::EntityRef, name: &str);

    /// Propagate display name changes to anything caching them (labels, UI).
    fn notify_renamed(&mut self);

    fn reset_world(&mut self);

    fn enemies_of(&self, entity: Self::EntityRef) -> Vec<Self::EntityRef>;

    fn traits_of(&self, entity: Self::EntityRef) -> Vec<Self::TraitRef>;

    fn attributes(&self, entity: Self::EntityRef) -> Option<StateAttributes>;

    /// Register a listener invoked synchronously for every recorded event.
    fn subscribe_events(&mut self, listener: EventListener<Self::Event>);
}
