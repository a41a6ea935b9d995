//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::map::CityMap;
use crate::map::grid::{Cell, OccupantKind, Terrain};
use crate::sim::kpi::KpiReport;
use crate::sim::engine::Engine;
use crate::sim::types::{PopulationMood, SimState, TickReport};

/// Combined state response: config, KPIs, and the latest tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: ScenarioConfig,
    pub kpi: KpiReport,
    pub state: SimState,
    /// Present only when the run ended in game over.
    pub game_over_cause: Option<String>,
    /// Most recent tick report; `null` for a run with no ticks.
    pub latest_tick: Option<TickReport>,
    pub population: PopulationSummary,
    pub ledger_totals: LedgerTotals,
}

/// Occupant aggregates of the final city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub occupants: usize,
    /// `null` when the city has no occupants.
    pub average_satisfaction: Option<f64>,
    pub mood: PopulationMood,
}

impl PopulationSummary {
    pub fn from_engine(engine: &Engine) -> Self {
        Self {
            occupants: engine.population(),
            average_satisfaction: engine.average_satisfaction(),
            mood: engine.mood(),
        }
    }
}

/// Ledger sums over the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerTotals {
    pub income: i64,
    pub expenses: i64,
}

/// One cell of the map snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub x: i32,
    pub y: i32,
    pub terrain: Terrain,
    pub occupant: OccupantKind,
    /// Propagation depth, or `null` when unpowered.
    pub power_level: Option<u32>,
    pub line: bool,
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        let pos = cell.position();
        Self {
            x: pos.x,
            y: pos.y,
            terrain: cell.terrain(),
            occupant: cell.occupant_kind(),
            power_level: cell.power().level(),
            line: cell.has_line(),
        }
    }
}

/// Row-major snapshot of every cell plus a text rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellRecord>,
    /// One string per row, using the same glyphs as the terminal view.
    pub rows: Vec<String>,
}

impl MapSnapshot {
    pub fn from_map(map: &CityMap) -> Self {
        Self {
            width: map.width(),
            height: map.height(),
            cells: map.grid().cells().map(CellRecord::from).collect(),
            rows: map.render_ascii(),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start tick (inclusive).
    pub from: Option<u64>,
    /// End tick (inclusive).
    pub to: Option<u64>,
}

/// Optional size limit for the ledger endpoint.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Number of most recent transactions to return. All when absent.
    pub limit: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
