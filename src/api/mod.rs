use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::lottery::{self, odds_table, pre_draw_probability_for, LotterySetup, DEFAULT_TRIALS};
use crate::scenario::Scenario;

#[derive(Clone)]
pub struct AppState {
    /// Fixed seed for reproducible responses; `None` draws fresh entropy per request
    pub seed: Option<u64>,
    pub max_trials: usize,
}

type ApiError = (StatusCode, String);

/// Build the Axum router for the lottery API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/balls", post(balls_handler))
        .route("/api/odds", post(odds_handler))
        .route("/api/draw", post(draw_handler))
        .route("/api/simulate", post(simulate_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn bad_request(e: impl ToString) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn build_setup(scenario: Scenario) -> Result<LotterySetup, ApiError> {
    scenario.into_setup().map_err(bad_request)
}

/// Run CPU-bound engine work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, lottery::ConfigurationError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(bad_request)
}

/// GET /api/health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct BallsRow {
    team_id: String,
    rank: usize,
    balls: u32,
    share_percent: f64,
}

/// POST /api/balls
async fn balls_handler(Json(scenario): Json<Scenario>) -> Result<impl IntoResponse, ApiError> {
    let setup = build_setup(scenario)?;
    let total: u64 = (0..setup.len()).map(|i| setup.balls(i) as u64).sum();
    let rows: Vec<BallsRow> = setup
        .record_order()
        .iter()
        .map(|&idx| BallsRow {
            team_id: setup.team(idx).id.clone(),
            rank: setup.rank(idx),
            balls: setup.balls(idx),
            share_percent: if total == 0 {
                0.0
            } else {
                lottery::models::round1(setup.balls(idx) as f64 / total as f64 * 100.0)
            },
        })
        .collect();
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct OddsParams {
    team: Option<String>,
    pick: Option<usize>,
}

#[derive(Debug, Serialize)]
struct OddsCell {
    team_id: String,
    pick: usize,
    percent: f64,
}

/// POST /api/odds[?team=ID&pick=N]
///
/// With both `team` and `pick` returns a single cell, otherwise the full table.
async fn odds_handler(
    Query(params): Query<OddsParams>,
    Json(scenario): Json<Scenario>,
) -> Result<axum::response::Response, ApiError> {
    let setup = build_setup(scenario)?;
    match (params.team, params.pick) {
        (Some(team_id), Some(pick)) => {
            let percent = pre_draw_probability_for(&setup, &team_id, pick).map_err(bad_request)?;
            Ok(Json(OddsCell {
                team_id,
                pick,
                percent: lottery::models::round1(percent),
            })
            .into_response())
        }
        _ => Ok(Json(odds_table(&setup)).into_response()),
    }
}

/// POST /api/draw
async fn draw_handler(
    State(state): State<Arc<AppState>>,
    Json(scenario): Json<Scenario>,
) -> Result<impl IntoResponse, ApiError> {
    let setup = build_setup(scenario)?;
    let seed = state.seed;
    let result = run_blocking(move || {
        let mut rng = lottery::rng_from_seed(seed);
        lottery::draw(&setup, &mut rng)
    })
    .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct SimulateParams {
    trials: Option<usize>,
}

/// POST /api/simulate[?trials=N]
async fn simulate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimulateParams>,
    Json(scenario): Json<Scenario>,
) -> Result<impl IntoResponse, ApiError> {
    let trials = params.trials.unwrap_or(DEFAULT_TRIALS);
    if trials > state.max_trials {
        return Err(bad_request(format!(
            "trials must not exceed {}",
            state.max_trials
        )));
    }
    let setup = build_setup(scenario)?;
    let seed = state.seed;
    info!("Simulating {} trials over {} teams", trials, setup.len());
    let report = run_blocking(move || {
        let mut rng = lottery::rng_from_seed(seed);
        lottery::simulate(&setup, trials, &mut rng)
    })
    .await?;
    Ok(Json(report))
}
