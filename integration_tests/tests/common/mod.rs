#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::app::App;
use bridge_runtime::BridgeConfig;
use state_sim::{build_bridge_app, SimulationConfig, WorldPreset};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Four states, all mutually at war, incidents every tick.
pub fn fixture_preset() -> Arc<WorldPreset> {
    let path = fixture_path("world_preset.json");
    Arc::new(WorldPreset::from_file(&path).expect("fixture preset loads"))
}

pub fn bridge_config(dir: &Path) -> BridgeConfig {
    BridgeConfig {
        queue_path: dir.join("commands_queue.txt"),
        feedback_path: dir.join("feedback.txt"),
        event_path: Some(dir.join("events.txt")),
        poll_interval_secs: 0.0,
        rng_seed: Some(2024),
        ..BridgeConfig::default()
    }
}

pub fn build_app(dir: &Path, preset: Arc<WorldPreset>, world_seed: u64) -> App {
    build_bridge_app(
        bridge_config(dir),
        preset,
        SimulationConfig {
            world_seed: Some(world_seed),
            ..SimulationConfig::default()
        },
    )
}

/// Lines of a channel file; a file never written reads as empty.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|contents| contents.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
