//! World generation preset.
//!
//! Loaded from `world_preset.json` with support for the `WORLD_PRESET_PATH`
//! environment override; falls back to the builtin preset.

use std::{
    collections::HashSet,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::PoliticalSystem;

pub const BUILTIN_WORLD_PRESET: &str = include_str!("data/world_preset.json");
pub const WORLD_PRESET_ENV: &str = "WORLD_PRESET_PATH";

/// Inclusive sampling range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T> Bounds<T>
where
    T: SampleUniform + PartialOrd + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn fixed(value: T) -> Self {
        Self::new(value, value)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldPreset {
    pub state_count: Bounds<usize>,
    /// Pool of UI names. Each generated state takes one, so every entry must
    /// be a single token.
    pub state_names: Vec<String>,
    pub colors: Vec<String>,
    pub ethnic_groups: Vec<String>,
    pub political_systems: Vec<PoliticalSystem>,
    pub traits: Vec<String>,
    pub max_traits_per_state: usize,
    /// Chance that any pair of states starts out at war.
    pub rivalry_chance: f32,
    pub population: Bounds<u64>,
    pub gold: Bounds<i64>,
    pub gold_per_month: Bounds<f32>,
    pub food_reserve: Bounds<f32>,
    pub diplomacy_power: Bounds<f32>,
    pub diplomacy_efficiency: Bounds<f32>,
    /// Per-tick chance of a border incident between two enemies.
    pub border_incident_chance: f32,
}

impl Default for WorldPreset {
    fn default() -> Self {
        Self {
            state_count: Bounds::new(3, 3),
            state_names: vec![
                "Arcadia".to_string(),
                "Boravia".to_string(),
                "Calder".to_string(),
            ],
            colors: vec!["#1f6feb".to_string()],
            ethnic_groups: vec!["Highlanders".to_string()],
            political_systems: vec![PoliticalSystem::Monarchy],
            traits: Vec::new(),
            max_traits_per_state: 0,
            rivalry_chance: 0.0,
            population: Bounds::fixed(100_000),
            gold: Bounds::fixed(100),
            gold_per_month: Bounds::fixed(10.0),
            food_reserve: Bounds::fixed(200.0),
            diplomacy_power: Bounds::fixed(5.0),
            diplomacy_efficiency: Bounds::fixed(0.5),
            border_incident_chance: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorldPresetError {
    #[error("failed to parse world preset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read world preset from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid world preset: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl WorldPreset {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_WORLD_PRESET).expect("builtin world preset should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, WorldPresetError> {
        let preset: WorldPreset = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn from_file(path: &Path) -> Result<Self, WorldPresetError> {
        let contents = fs::read_to_string(path).map_err(|source| WorldPresetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// A preset with exactly the given states and neutral attributes.
    pub fn with_states<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            state_count: Bounds::fixed(names.len()),
            state_names: names.iter().map(|name| name.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), WorldPresetError> {
        let mut errors = Vec::new();

        if !self.state_count.is_ordered() {
            errors.push("state_count.min exceeds state_count.max".to_string());
        }
        if self.state_names.len() < self.state_count.max {
            errors.push(format!(
                "state_names has {} entries but up to {} states may be generated",
                self.state_names.len(),
                self.state_count.max
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.state_names {
            if name.is_empty() || name.contains(char::is_whitespace) {
                errors.push(format!("state name '{name}' must be a single token"));
            } else if !seen.insert(name.as_str()) {
                errors.push(format!("duplicate state name '{name}'"));
            }
        }
        for (field, empty) in [
            ("colors", self.colors.is_empty()),
            ("ethnic_groups", self.ethnic_groups.is_empty()),
            ("political_systems", self.political_systems.is_empty()),
        ] {
            if empty {
                errors.push(format!("{field} must not be empty"));
            }
        }
        for (field, chance) in [
            ("rivalry_chance", self.rivalry_chance),
            ("border_incident_chance", self.border_incident_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                errors.push(format!("{field} must be within [0, 1], got {chance}"));
            }
        }
        let ordered = [
            ("population", self.population.is_ordered()),
            ("gold", self.gold.is_ordered()),
            ("gold_per_month", self.gold_per_month.is_ordered()),
            ("food_reserve", self.food_reserve.is_ordered()),
            ("diplomacy_power", self.diplomacy_power.is_ordered()),
            ("diplomacy_efficiency", self.diplomacy_efficiency.is_ordered()),
        ];
        for (field, ok) in ordered {
            if !ok {
                errors.push(format!("{field}.min exceeds {field}.max"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WorldPresetError::Invalid(errors))
        }
    }
}

/// Metadata about the world preset source.
#[derive(Resource, Debug, Clone)]
pub struct WorldPresetMetadata {
    path: Option<PathBuf>,
}

impl WorldPresetMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

pub fn load_world_preset_from_env() -> (Arc<WorldPreset>, WorldPresetMetadata) {
    load_world_preset(env::var(WORLD_PRESET_ENV).ok().map(PathBuf::from))
}

pub fn load_world_preset(override_path: Option<PathBuf>) -> (Arc<WorldPreset>, WorldPresetMetadata) {
    let path = override_path.unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/world_preset.json")
    });

    match WorldPreset::from_file(&path) {
        Ok(preset) => {
            tracing::info!(
                target: "state_sim::world",
                path = %path.display(),
                "world_preset.loaded=file"
            );
            return (Arc::new(preset), WorldPresetMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "state_sim::world",
                path = %path.display(),
                error = %err,
                "world_preset.load_failed"
            );
        }
    }

    tracing::info!(target: "state_sim::world", "world_preset.loaded=builtin");
    (WorldPreset::builtin(), WorldPresetMetadata::new(None))
}
