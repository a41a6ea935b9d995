//! Core simulation types: lifecycle state, notifications, and tick records.

use std::fmt;

use serde::Serialize;

use crate::buildings::{DwellingId, LineId, PlantId};
use crate::map::Position;

use super::event::GameEvent;

/// Lifecycle of a game.
///
/// `NotStarted → Running ⇄ Paused`, and `Running → GameOver`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimState {
    NotStarted,
    Running,
    Paused,
    GameOver,
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SimState::NotStarted => "not started",
            SimState::Running => "running",
            SimState::Paused => "paused",
            SimState::GameOver => "game over",
        };
        f.write_str(label)
    }
}

/// Typed message appended to the engine's outbound queue.
///
/// Messages are queued in emission order and drained by the caller with
/// [`Engine::drain_notifications`](super::engine::Engine::drain_notifications).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Notification {
    GameStarted,
    Paused,
    Resumed,
    DayPassed,
    MonthPassed,
    YearPassed,
    /// New purse balance.
    MoneyChanged(i64),
    /// New city happiness.
    HappinessChanged(i32),
    /// Happiness fell below the game-over threshold.
    HappinessCritical(i32),
    PlantBuilt(PlantId),
    PlantUpgraded(PlantId),
    DwellingBuilt(DwellingId),
    DwellingUpgraded(DwellingId),
    Demolished(Position),
    PowerLineCreated(LineId),
    /// Unmet demand in energy units.
    EnergyShortage(u32),
    OccupantsArrived(u32),
    RandomEvent(GameEvent),
    /// Human-readable cause.
    GameOver(String),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::GameStarted => write!(f, "Game started"),
            Notification::Paused => write!(f, "Paused"),
            Notification::Resumed => write!(f, "Resumed"),
            Notification::DayPassed => write!(f, "A new day begins"),
            Notification::MonthPassed => write!(f, "A new month begins"),
            Notification::YearPassed => write!(f, "A new year begins"),
            Notification::MoneyChanged(m) => write!(f, "Money: {m}"),
            Notification::HappinessChanged(h) => write!(f, "Happiness: {h}%"),
            Notification::HappinessCritical(h) => write!(f, "Happiness critical: {h}%"),
            Notification::PlantBuilt(id) => write!(f, "Plant {id} built"),
            Notification::PlantUpgraded(id) => write!(f, "Plant {id} upgraded"),
            Notification::DwellingBuilt(id) => write!(f, "Dwelling {id} built"),
            Notification::DwellingUpgraded(id) => write!(f, "Dwelling {id} upgraded"),
            Notification::Demolished(pos) => write!(f, "Demolished {pos}"),
            Notification::PowerLineCreated(id) => write!(f, "Power line {id} created"),
            Notification::EnergyShortage(deficit) => write!(f, "Energy shortage: {deficit} units"),
            Notification::OccupantsArrived(n) => write!(f, "{n} new occupants arrived"),
            Notification::RandomEvent(event) => write!(f, "Event: {}", event.title),
            Notification::GameOver(cause) => write!(f, "GAME OVER: {cause}"),
        }
    }
}

/// Occupant counts by mood band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulationMood {
    pub happy: usize,
    pub very_unhappy: usize,
}

/// Complete record of one engine tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Tick index, starting at 0.
    pub tick: u64,
    /// Calendar day count after this tick's advance.
    pub day: u32,
    /// Formatted calendar date and time.
    pub date: String,
    /// Production after event modifiers (energy units).
    pub production: u32,
    /// Sum of dwelling energy needs (energy units).
    pub demand: u32,
    /// Market price after repricing.
    pub price: f64,
    /// Dwellings supplied by this tick's distribution.
    pub supplied_dwellings: usize,
    pub total_dwellings: usize,
    pub revenue: i64,
    pub taxes: i64,
    pub maintenance: i64,
    /// Whether the purse covered maintenance.
    pub maintenance_paid: bool,
    pub happiness: i32,
    pub money: i64,
    pub active_events: usize,
    pub population: usize,
}

impl TickReport {
    /// `production / demand`, or 1.0 when there is no demand.
    pub fn supply_ratio(&self) -> f64 {
        if self.demand == 0 {
            1.0
        } else {
            f64::from(self.production) / f64::from(self.demand)
        }
    }

    /// Whether demand exceeded production on this tick.
    pub fn is_shortage(&self) -> bool {
        self.production < self.demand
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} day={:>3} | prod={:>5} demand={:>5} price={:.3} | \
             supplied={}/{} | rev={:>4} tax={:>4} maint={:>4}{} | \
             happy={:>3}% money={:>6} | events={} pop={}",
            self.tick,
            self.day,
            self.production,
            self.demand,
            self.price,
            self.supplied_dwellings,
            self.total_dwellings,
            self.revenue,
            self.taxes,
            self.maintenance,
            if self.maintenance_paid { "" } else { " (unpaid)" },
            self.happiness,
            self.money,
            self.active_events,
            self.population,
        )
    }
}
