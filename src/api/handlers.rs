//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, LedgerQuery, MapSnapshot, StateResponse, TelemetryQuery};
use crate::economy::Transaction;
use crate::sim::types::TickReport;

/// Returns scenario config, KPI report, population, ledger totals and the
/// latest tick report.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        kpi: state.kpi.clone(),
        state: state.final_state,
        game_over_cause: state.game_over_cause.clone(),
        latest_tick: state.reports.last().cloned(),
        population: state.population.clone(),
        ledger_totals: state.ledger_totals,
    })
}

/// Returns tick reports, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TickReport>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(u64::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let reports: Vec<TickReport> = state
        .reports
        .iter()
        .filter(|r| r.tick >= from && r.tick <= to)
        .cloned()
        .collect();

    Ok(Json(reports))
}

/// `GET /map` → 200 + `MapSnapshot` JSON
pub async fn get_map(State(state): State<Arc<AppState>>) -> Json<MapSnapshot> {
    Json(state.map.clone())
}

/// Returns the most recent transactions, oldest first.
///
/// `GET /ledger` → every transaction
/// `GET /ledger?limit=N` → the last `N`
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LedgerQuery>,
) -> Json<Vec<Transaction>> {
    let limit = query.limit.unwrap_or(state.ledger.len());
    let skip = state.ledger.len().saturating_sub(limit);
    Json(state.ledger[skip..].to_vec())
}
