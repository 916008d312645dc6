//! Runs the command bridge once per host update.

use bevy::prelude::*;
use bridge_runtime::{
    BridgeConfig, CapabilityTable, CommandBridge, DispatchOutcome, TickReport, WorldGateway,
};
use tracing::{error, warn};

use crate::capabilities::state_capability_table;
use crate::world::StateWorld;

#[derive(Resource)]
pub struct StateBridge(pub CommandBridge<StateWorld>);

/// Running totals, mostly for tests and diagnostics.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct BridgeStats {
    pub polls: u64,
    pub poll_failures: u64,
    pub dispatched: u64,
    pub malformed: u64,
    pub backlog: usize,
    pub last_outcomes: Vec<DispatchOutcome>,
}

impl BridgeStats {
    fn record(&mut self, report: TickReport) {
        if report.poll.is_some() {
            self.polls += 1;
        }
        if report.poll_failed {
            self.poll_failures += 1;
        }
        self.dispatched += report.outcomes.len() as u64;
        self.malformed += report
            .outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DispatchOutcome::Malformed { .. }))
            .count() as u64;
        self.backlog = report.remaining;
        if !report.outcomes.is_empty() {
            self.last_outcomes = report.outcomes;
        }
    }
}

/// Builds a [`StateBridge`] from the config and subscribes its event
/// forwarder to the [`StateWorld`], which must already be inserted.
pub struct CommandBridgePlugin {
    config: BridgeConfig,
}

impl CommandBridgePlugin {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl Plugin for CommandBridgePlugin {
    fn build(&self, app: &mut App) {
        let capabilities = state_capability_table().unwrap_or_else(|err| {
            error!(
                target: "state_bridge::capability",
                error = %err,
                "capabilities.disabled=invalid_table"
            );
            CapabilityTable::empty()
        });
        let bridge = CommandBridge::from_config(&self.config, capabilities);

        match app.world.get_resource_mut::<StateWorld>() {
            Some(mut world) => world.subscribe_events(bridge.event_forwarder().into_listener()),
            None => warn!(
                target: "state_bridge::events",
                "events.unsubscribed=missing_world"
            ),
        }

        app.insert_resource(StateBridge(bridge))
            .init_resource::<BridgeStats>()
            .add_systems(Update, run_command_bridge);
    }
}

/// Poll the queue and dispatch buffered commands against the world.
pub fn run_command_bridge(world: &mut World) {
    let now = world
        .get_resource::<Time>()
        .map(|time| time.elapsed())
        .unwrap_or_default();

    let report = world.try_resource_scope(|world, mut bridge: Mut<StateBridge>| {
        let mut state_world = world.get_resource_mut::<StateWorld>()?;
        Some(bridge.0.tick(&mut state_world, now))
    });

    if let Some(Some(report)) = report {
        if let Some(mut stats) = world.get_resource_mut::<BridgeStats>() {
            stats.record(report);
        }
    }
}
