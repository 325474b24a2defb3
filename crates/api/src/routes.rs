use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use core_sim::{Era, EraSummary};
use runtime::export::series_to_csv;
use serde::{Deserialize, Serialize};
use strategy::AllocationInput;

use crate::{
    error::{AppError, AppResult},
    state::{AppState, RunSnapshot},
    ws,
};

pub const CURRENT_RUN_PATH: &str = "/api/runs/current";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/eras", get(list_eras))
        .route("/api/data/:era_id", get(era_data))
        .route("/api/data/:era_id/tickers", get(era_tickers))
        .route("/api/eras/:era_id/runs", post(start_run))
        .route(CURRENT_RUN_PATH, get(current_run).delete(cancel_run))
        .route("/api/runs/current/series.csv", get(current_series_csv))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

async fn list_eras(State(state): State<AppState>) -> Json<Vec<EraSummary>> {
    Json(state.scenarios())
}

async fn era_data(
    State(state): State<AppState>,
    Path(era_id): Path<String>,
) -> AppResult<Json<Era>> {
    let era = state.era(&era_id)?;
    Ok(Json(Era::clone(&era)))
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    #[serde(default)]
    search: String,
}

#[derive(Debug, Serialize)]
struct TickersResponse {
    tickers: Vec<String>,
}

async fn era_tickers(
    State(state): State<AppState>,
    Path(era_id): Path<String>,
    Query(query): Query<TickerQuery>,
) -> AppResult<Json<TickersResponse>> {
    let era = state.era(&era_id)?;
    let tickers = era
        .dataset()
        .search_tickers(&query.search)
        .into_iter()
        .map(str::to_owned)
        .collect();

    Ok(Json(TickersResponse { tickers }))
}

async fn start_run(
    State(state): State<AppState>,
    Path(era_id): Path<String>,
    Json(input): Json<AllocationInput>,
) -> AppResult<impl IntoResponse> {
    let started = state.start_run(&era_id, input).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, CURRENT_RUN_PATH)],
        Json(started),
    ))
}

async fn current_run(State(state): State<AppState>) -> AppResult<Json<RunSnapshot>> {
    Ok(Json(state.current_run().await?))
}

async fn cancel_run(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.cancel_run().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_series_csv(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.current_run().await?;
    let csv = series_to_csv(&snapshot.series.points)
        .map_err(|err| AppError::Internal(err.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}
