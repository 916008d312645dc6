use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bridge_runtime::{load_bridge_config, load_bridge_config_from_env, BridgeConfig};
use state_sim::{
    build_bridge_app, load_world_preset, load_world_preset_from_env, SimulationConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless state simulation driven by a command queue file", long_about = None)]
struct Args {
    /// Bridge config JSON (defaults to BRIDGE_CONFIG_PATH, then the bundled file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// World preset JSON (defaults to WORLD_PRESET_PATH, then the bundled file)
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Command queue file shared with the controller
    #[arg(long)]
    queue: Option<PathBuf>,

    /// Feedback file
    #[arg(long)]
    feedback: Option<PathBuf>,

    /// Separate file for world history events
    #[arg(long)]
    events: Option<PathBuf>,

    /// Seconds between queue polls
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Seed for name allocation
    #[arg(long)]
    seed: Option<u64>,

    /// Seed for world generation
    #[arg(long)]
    world_seed: Option<u64>,

    /// Milliseconds between host updates
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

impl Args {
    fn apply_overrides(&self, config: &mut BridgeConfig) {
        if let Some(path) = &self.queue {
            config.queue_path = path.clone();
        }
        if let Some(path) = &self.feedback {
            config.feedback_path = path.clone();
        }
        if let Some(path) = &self.events {
            config.event_path = Some(path.clone());
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let (mut bridge_config, _) = match &args.config {
        Some(path) => load_bridge_config(Some(path.clone())),
        None => load_bridge_config_from_env(),
    };
    args.apply_overrides(&mut bridge_config);
    bridge_config
        .validate()
        .context("Bridge configuration rejected after applying command line overrides")?;

    let (preset, _) = match &args.preset {
        Some(path) => load_world_preset(Some(path.clone())),
        None => load_world_preset_from_env(),
    };

    let config = SimulationConfig {
        tick_interval: Duration::from_millis(args.tick_ms),
        world_seed: args.world_seed,
    };

    info!(
        target: "state_sim::server",
        queue = %bridge_config.queue_path.display(),
        feedback = %bridge_config.feedback_path.display(),
        events = %bridge_config.event_path().display(),
        poll_interval_secs = bridge_config.poll_interval_secs,
        tick_ms = args.tick_ms,
        "State bridge headless server ready"
    );

    let mut app = build_bridge_app(bridge_config, preset, config);
    app.run();
    Ok(())
}
