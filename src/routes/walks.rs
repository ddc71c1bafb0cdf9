// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walk tracking routes.

use crate::error::Result;
use crate::models::{PositionFix, SessionSummary, WalkStats};
use crate::services::{FinishedWalk, FixOutcome, LocationRequest};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/walks", get(list_walks))
        .route("/api/walks/start", post(start_walk))
        .route("/api/walks/fixes", post(submit_fix))
        .route("/api/walks/stop", post(stop_walk))
        .route("/api/walks/current", get(current_walk))
        .route("/api/walks/summary", get(walk_summary))
}

// ─── Session Lifecycle ───────────────────────────────────────

#[derive(Deserialize)]
pub struct StartWalkRequest {
    /// Whether the client holds fine location permission
    #[serde(default)]
    pub permission_granted: bool,
}

#[derive(Serialize)]
pub struct StartWalkResponse {
    pub session: SessionSummary,
    pub resumed: bool,
    pub location_request: LocationRequest,
}

async fn start_walk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartWalkRequest>,
) -> Result<Json<StartWalkResponse>> {
    let started = state.walks.start(req.permission_granted).await?;
    Ok(Json(StartWalkResponse {
        session: started.session,
        resumed: started.resumed,
        location_request: state.walks.location_request(),
    }))
}

/// Accept one position fix. The reply reflects the fix after it has been
/// applied, including an automatic stop.
async fn submit_fix(
    State(state): State<Arc<AppState>>,
    Json(fix): Json<PositionFix>,
) -> Result<(StatusCode, Json<FixOutcome>)> {
    let outcome = state.walks.submit_fix(fix).await?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

async fn stop_walk(State(state): State<Arc<AppState>>) -> Result<Json<FinishedWalk>> {
    Ok(Json(state.walks.stop().await?))
}

#[derive(Serialize)]
pub struct CurrentWalkResponse {
    pub session: Option<SessionSummary>,
    pub stats: WalkStats,
}

async fn current_walk(State(state): State<Arc<AppState>>) -> Json<CurrentWalkResponse> {
    let tracker = state.walks.tracker();
    Json(CurrentWalkResponse {
        session: tracker.current().await,
        stats: tracker.stats(),
    })
}

// ─── History ─────────────────────────────────────────────────

async fn list_walks(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    Json(state.quests.walk_history().await)
}

#[derive(Serialize)]
pub struct WalkSummaryResponse {
    pub today_minutes: u32,
    pub week_minutes: u32,
    pub total_walks: usize,
}

async fn walk_summary(State(state): State<Arc<AppState>>) -> Json<WalkSummaryResponse> {
    let stats = state.quests.stats().await;
    Json(WalkSummaryResponse {
        today_minutes: stats.today_walking_minutes,
        week_minutes: stats.week_walking_minutes,
        total_walks: stats.total_walks,
    })
}
