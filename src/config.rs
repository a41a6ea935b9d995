//! TOML-based game configuration and difficulty presets.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buildings::EnergyType;
use crate::economy::market::DEFAULT_BASE_PRICE;
use crate::map::network::{DEFAULT_COVERAGE_RADIUS, DEFAULT_PROPAGATION_RADIUS};
use crate::sim::event::DEFAULT_EVENT_PROBABILITY;

/// Top-level game configuration parsed from TOML.
///
/// All fields have defaults matching the `normal` difficulty. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or pick a preset with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed, difficulty label, and tick pacing.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Grid dimensions and network reach.
    #[serde(default)]
    pub map: MapConfig,
    /// Starting purse and happiness limits.
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub events: EventsConfig,
    /// Structures present when the game starts.
    #[serde(default)]
    pub city: CityConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
}

/// Seed, difficulty label, and tick pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Difficulty label: `"easy"`, `"normal"`, or `"hard"`.
    pub difficulty: String,
    /// Number of ticks for batch runs.
    pub ticks: u64,
    /// Wall-clock interval between ticks at speed 1 (milliseconds).
    pub tick_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            difficulty: "normal".to_string(),
            ticks: 160,
            tick_interval_ms: 1000,
        }
    }
}

/// Grid dimensions and network reach.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    /// Euclidean reach of direct plant coverage (cells).
    pub coverage_radius: u32,
    /// Manhattan reach of one dwelling-to-dwelling relay hop (cells).
    pub propagation_radius: u32,
    /// Carve a north-south river at game start.
    pub river: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 15,
            coverage_radius: DEFAULT_COVERAGE_RADIUS,
            propagation_radius: DEFAULT_PROPAGATION_RADIUS,
            river: true,
        }
    }
}

/// Starting purse and happiness limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub initial_money: i64,
    /// City-wide happiness at game start (0–100).
    pub initial_happiness: i32,
    /// The game ends once happiness falls below this value (0–100).
    pub game_over_threshold: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_money: 10_000,
            initial_happiness: 75,
            game_over_threshold: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomyConfig {
    /// Reference energy price per unit.
    pub base_price: f64,
    /// Cost of building a basic dwelling.
    pub dwelling_cost: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_price: DEFAULT_BASE_PRICE,
            dwelling_cost: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Chance per tick that a random event fires (0.0–1.0).
    pub probability: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            probability: DEFAULT_EVENT_PROBABILITY,
        }
    }
}

/// A plant placed for free when the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StartingPlant {
    pub kind: EnergyType,
    pub x: i32,
    pub y: i32,
}

/// Structures present when the game starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CityConfig {
    /// Basic dwellings placed around the grid centre.
    pub starting_dwellings: usize,
    /// Occupants moved into each starting dwelling.
    pub occupants_per_dwelling: usize,
    pub starting_plants: Vec<StartingPlant>,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            starting_dwellings: 3,
            occupants_per_dwelling: 3,
            starting_plants: vec![StartingPlant {
                kind: EnergyType::Coal,
                x: 6,
                y: 7,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionConfig {
    /// When set, only dwellings the network powers can be supplied.
    pub require_grid_connection: bool,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"map.width"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["easy", "normal", "hard"];

    /// The baseline difficulty.
    pub fn normal() -> Self {
        Self::default()
    }

    /// More money, happier citizens, and a very forgiving threshold.
    pub fn easy() -> Self {
        Self {
            simulation: SimulationConfig {
                difficulty: "easy".to_string(),
                ..SimulationConfig::default()
            },
            player: PlayerConfig {
                initial_money: 15_000,
                initial_happiness: 85,
                game_over_threshold: 3,
            },
            ..Self::default()
        }
    }

    /// Tight budget and a grumpier city.
    pub fn hard() -> Self {
        Self {
            simulation: SimulationConfig {
                difficulty: "hard".to_string(),
                ..SimulationConfig::default()
            },
            player: PlayerConfig {
                initial_money: 5_000,
                initial_happiness: 60,
                game_over_threshold: 10,
            },
            ..Self::default()
        }
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "easy" => Ok(Self::easy()),
            "normal" => Ok(Self::normal()),
            "hard" => Ok(Self::hard()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !Self::PRESETS.contains(&s.difficulty.as_str()) {
            errors.push(ConfigError::new(
                "simulation.difficulty",
                format!(
                    "must be one of {}, got \"{}\"",
                    Self::PRESETS.join(", "),
                    s.difficulty
                ),
            ));
        }
        if s.tick_interval_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_interval_ms", "must be > 0"));
        }

        let m = &self.map;
        if m.width == 0 {
            errors.push(ConfigError::new("map.width", "must be > 0"));
        }
        if m.height == 0 {
            errors.push(ConfigError::new("map.height", "must be > 0"));
        }

        let p = &self.player;
        if !(0..=100).contains(&p.initial_happiness) {
            errors.push(ConfigError::new("player.initial_happiness", "must be in [0, 100]"));
        }
        if !(0..=100).contains(&p.game_over_threshold) {
            errors.push(ConfigError::new("player.game_over_threshold", "must be in [0, 100]"));
        }

        let e = &self.economy;
        // negated so NaN is rejected too
        if !(e.base_price > 0.0) {
            errors.push(ConfigError::new("economy.base_price", "must be > 0"));
        }
        if e.dwelling_cost < 0 {
            errors.push(ConfigError::new("economy.dwelling_cost", "must be >= 0"));
        }

        if !(0.0..=1.0).contains(&self.events.probability) {
            errors.push(ConfigError::new("events.probability", "must be in [0.0, 1.0]"));
        }

        for (i, plant) in self.city.starting_plants.iter().enumerate() {
            let in_bounds = plant.x >= 0
                && plant.y >= 0
                && (plant.x as usize) < m.width
                && (plant.y as usize) < m.height;
            if !in_bounds {
                errors.push(ConfigError::new(
                    format!("city.starting_plants[{i}]"),
                    format!("({}, {}) is outside the {}x{} map", plant.x, plant.y, m.width, m.height),
                ));
            }
        }

        errors
    }
}
