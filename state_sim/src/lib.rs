//! Headless host for the state bridge.
//!
//! Owns a [`StateWorld`] of generated states and runs the command bridge on
//! every update, followed by the simulation systems that feed the world
//! history.

pub mod capabilities;
mod command_bridge;
mod resources;
mod systems;
pub mod world;
pub mod world_preset;
mod worldgen;

use std::sync::Arc;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bridge_runtime::BridgeConfig;
use tracing::info;

pub use capabilities::{state_capability_table, STATE_CAPABILITIES};
pub use command_bridge::{run_command_bridge, BridgeStats, CommandBridgePlugin, StateBridge};
pub use resources::{SimulationConfig, SimulationRng, SimulationTick};
pub use world::{HistoryEvent, HistoryKind, PoliticalSystem, StateId, StateRecord, StateTrait, StateWorld};
pub use world_preset::{
    load_world_preset, load_world_preset_from_env, Bounds, WorldPreset, WorldPresetError,
    WorldPresetMetadata,
};
pub use worldgen::generate_states;

/// Construct a Bevy [`App`] with the builtin world preset and the bridge
/// config found through the environment.
pub fn build_headless_app() -> App {
    let (bridge_config, _) = bridge_runtime::load_bridge_config_from_env();
    let (preset, metadata) = load_world_preset_from_env();
    let mut app = build_bridge_app(bridge_config, preset, SimulationConfig::default());
    app.insert_resource(metadata);
    app
}

/// Construct a Bevy [`App`] hosting a freshly generated world and the
/// command bridge.
pub fn build_bridge_app(
    bridge_config: BridgeConfig,
    preset: Arc<WorldPreset>,
    config: SimulationConfig,
) -> App {
    let seed = config.world_seed.unwrap_or_else(rand::random);
    info!(target: "state_sim::world", seed, "world.seed");

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(config.tick_interval)))
        .insert_resource(SimulationTick::default())
        .insert_resource(SimulationRng::seeded(seed.wrapping_add(1)))
        .insert_resource(StateWorld::generate(preset, seed))
        .insert_resource(config)
        .add_plugins(CommandBridgePlugin::new(bridge_config))
        .add_systems(
            Update,
            (systems::simulate_border_incidents, systems::advance_tick)
                .chain()
                .after(run_command_bridge),
        );

    app
}

/// Execute a single host update: bridge tick, then simulation systems.
pub fn run_tick(app: &mut App) {
    app.update();
}
