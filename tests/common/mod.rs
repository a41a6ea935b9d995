//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use energy_tycoon::buildings::EnergyType;
use energy_tycoon::config::{ScenarioConfig, StartingPlant};
use energy_tycoon::map::CityMap;
use energy_tycoon::map::network::ElectricityNetwork;
use energy_tycoon::sim::engine::Engine;

/// Normal difficulty with no river, no random events, and no starting plants.
pub fn quiet_config() -> ScenarioConfig {
    let mut config = ScenarioConfig::normal();
    config.map.river = false;
    config.events.probability = 0.0;
    config.city.starting_plants.clear();
    config
}

/// `quiet_config` plus one free plant at `(x, y)`.
pub fn config_with_plant(kind: EnergyType, x: i32, y: i32) -> ScenarioConfig {
    let mut config = quiet_config();
    config.city.starting_plants.push(StartingPlant { kind, x, y });
    config
}

/// Builds and initializes an engine, discarding the start notification.
pub fn started(config: ScenarioConfig) -> Engine {
    let mut engine = Engine::new(config);
    engine.initialize();
    engine.drain_notifications();
    engine
}

/// Empty 20×10 map with default coverage (5) and propagation (3) radii.
pub fn empty_map() -> CityMap {
    CityMap::new(20, 10, ElectricityNetwork::new(5, 3))
}
