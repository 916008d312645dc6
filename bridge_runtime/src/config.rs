//! Bridge configuration.
//!
//! Loaded from `bridge_config.json` with support for an environment variable
//! override (`BRIDGE_CONFIG_PATH`). A missing or broken file falls back to
//! the builtin copy embedded in the crate.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_BRIDGE_CONFIG: &str = include_str!("data/bridge_config.json");
pub const BRIDGE_CONFIG_ENV: &str = "BRIDGE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BridgeConfig {
    /// Command file shared with the controller.
    pub queue_path: PathBuf,
    /// Append-only file receiving user-visible replies.
    pub feedback_path: PathBuf,
    /// Separate file for world history events. Events share the feedback
    /// file when unset.
    pub event_path: Option<PathBuf>,
    pub poll_interval_secs: f64,
    /// Upper bound on commands dispatched in one tick. Unbounded when unset.
    pub max_commands_per_tick: Option<usize>,
    /// Age after which a queue lock file is treated as abandoned.
    pub lock_stale_after_secs: f64,
    /// Seed for name allocation. A random seed is drawn (and logged) when unset.
    pub rng_seed: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_path: PathBuf::from("data/commands_queue.txt"),
            feedback_path: PathBuf::from("data/feedback.txt"),
            event_path: None,
            poll_interval_secs: 5.0,
            max_commands_per_tick: None,
            lock_stale_after_secs: 30.0,
            rng_seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeConfigError {
    #[error("failed to parse bridge config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read bridge config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid bridge config: {0}")]
    Invalid(String),
}

impl BridgeConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_BRIDGE_CONFIG).expect("builtin bridge config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, BridgeConfigError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, BridgeConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| BridgeConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), BridgeConfigError> {
        check_seconds("poll_interval_secs", self.poll_interval_secs)?;
        check_seconds("lock_stale_after_secs", self.lock_stale_after_secs)?;
        if self.max_commands_per_tick == Some(0) {
            return Err(BridgeConfigError::Invalid(
                "max_commands_per_tick must be at least 1 when set".to_string(),
            ));
        }
        if self.queue_path.as_os_str().is_empty() || self.feedback_path.as_os_str().is_empty() {
            return Err(BridgeConfigError::Invalid(
                "queue_path and feedback_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        saturating_seconds(self.poll_interval_secs)
    }

    pub fn lock_stale_after(&self) -> Duration {
        saturating_seconds(self.lock_stale_after_secs)
    }

    /// Where history events are written.
    pub fn event_path(&self) -> &Path {
        self.event_path.as_deref().unwrap_or(&self.feedback_path)
    }
}

fn check_seconds(field: &str, value: f64) -> Result<(), BridgeConfigError> {
    Duration::try_from_secs_f64(value)
        .map(|_| ())
        .map_err(|_| {
            BridgeConfigError::Invalid(format!(
                "{field} must be a non-negative number of seconds within Duration range, got {value}"
            ))
        })
}

/// Unvalidated configs clamp instead of panicking: out-of-range values
/// become `Duration::MAX`, negative or NaN values become zero.
fn saturating_seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Metadata about the bridge configuration source.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigMetadata {
    path: Option<PathBuf>,
}

impl BridgeConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// `None` when the builtin config is in use.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the bridge configuration, honouring `BRIDGE_CONFIG_PATH`.
pub fn load_bridge_config_from_env() -> (BridgeConfig, BridgeConfigMetadata) {
    load_bridge_config(env::var(BRIDGE_CONFIG_ENV).ok().map(PathBuf::from))
}

/// Load from `override_path`, or the crate's default data file when `None`.
pub fn load_bridge_config(override_path: Option<PathBuf>) -> (BridgeConfig, BridgeConfigMetadata) {
    let path = override_path.unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/bridge_config.json")
    });

    match BridgeConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "state_bridge::config",
                path = %path.display(),
                "bridge_config.loaded=file"
            );
            return (config, BridgeConfigMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "state_bridge::config",
                path = %path.display(),
                error = %err,
                "bridge_config.load_failed"
            );
        }
    }

    tracing::info!(target: "state_bridge::config", "bridge_config.loaded=builtin");
    (BridgeConfig::builtin(), BridgeConfigMetadata::new(None))
}

/// JSON schema describing `bridge_config.json`.
pub fn bridge_config_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(BridgeConfig)
}
