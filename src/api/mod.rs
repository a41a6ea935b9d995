//! Read-only REST API over a finished run.
//!
//! Provides four GET endpoints:
//! - `/state`: scenario config, KPI report, population, ledger totals and the latest tick
//! - `/telemetry`: tick reports with optional range filtering
//! - `/map`: per-cell snapshot of the final city
//! - `/ledger`: most recent market transactions

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::economy::Transaction;
use crate::sim::engine::Engine;
use crate::sim::kpi::KpiReport;
use crate::sim::types::{SimState, TickReport};

pub use types::{CellRecord, LedgerTotals, MapSnapshot, PopulationSummary};

/// Immutable application state shared across all request handlers.
///
/// Captured once after the run completes and wrapped in `Arc`; nothing
/// is mutated afterwards, so handlers need no locks.
pub struct AppState {
    /// Scenario used for this run.
    pub config: ScenarioConfig,
    /// Aggregate KPI report.
    pub kpi: KpiReport,
    /// Per-tick reports in execution order.
    pub reports: Vec<TickReport>,
    /// Lifecycle state when the run stopped.
    pub final_state: SimState,
    /// Why the run ended early, if it did.
    pub game_over_cause: Option<String>,
    /// Final map.
    pub map: MapSnapshot,
    /// Full transaction ledger, oldest first.
    pub ledger: Vec<Transaction>,
    pub ledger_totals: LedgerTotals,
    pub population: PopulationSummary,
}

impl AppState {
    /// Captures everything the API serves from an engine and its reports.
    pub fn capture(engine: &Engine, reports: Vec<TickReport>) -> Self {
        Self {
            config: engine.config().clone(),
            kpi: KpiReport::from_reports(&reports),
            reports,
            final_state: engine.state(),
            game_over_cause: engine.game_over_cause().map(str::to_owned),
            map: MapSnapshot::from_map(engine.map()),
            ledger: engine.market().history().to_vec(),
            ledger_totals: LedgerTotals {
                income: engine.market().total_income(),
                expenses: engine.market().total_expenses(),
            },
            population: PopulationSummary::from_engine(engine),
        }
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/map", get(handlers::get_map))
        .route("/ledger", get(handlers::get_ledger))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
