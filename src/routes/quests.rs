// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quest, profile and notification routes.

use crate::error::{AppError, Result};
use crate::models::{Notification, Quest, QuestCategory};
use crate::services::{QuestStats, RefreshOutcome};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quests", get(list_quests))
        .route("/api/quests/completed", get(list_completed))
        .route("/api/quests/stats", get(quest_stats))
        .route("/api/quests/refresh", post(refresh_quests))
        .route("/api/quests/{id}/progress", post(update_progress))
        .route("/api/quests/{id}/complete", post(complete_quest))
        .route("/api/profile", get(get_profile))
        .route("/api/notifications", get(list_notifications))
}

// ─── Quests ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct QuestQuery {
    pub category: Option<String>,
}

async fn list_quests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestQuery>,
) -> Result<Json<Vec<Quest>>> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<QuestCategory>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    Ok(Json(state.quests.active_quests(category).await))
}

async fn list_completed(State(state): State<Arc<AppState>>) -> Json<Vec<Quest>> {
    Json(state.quests.completed_quests().await)
}

async fn quest_stats(State(state): State<Arc<AppState>>) -> Json<QuestStats> {
    Json(state.quests.stats().await)
}

async fn refresh_quests(State(state): State<Arc<AppState>>) -> Result<Json<RefreshOutcome>> {
    Ok(Json(state.quests.refresh_if_stale().await?))
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub progress: u32,
}

async fn update_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<Quest>> {
    Ok(Json(state.quests.update_progress(&id, req.progress).await?))
}

async fn complete_quest(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Quest>> {
    Ok(Json(state.quests.mark_completed(&id).await?))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub level: u32,
    pub exp: u32,
    pub exp_to_next_level: u32,
    pub coins: u32,
    pub quests_completed: u32,
}

async fn get_profile(State(state): State<Arc<AppState>>) -> Json<ProfileResponse> {
    let profile = state.rewards.profile().await;
    Json(ProfileResponse {
        level: profile.level(),
        exp: profile.exp,
        exp_to_next_level: profile.exp_to_next_level(),
        coins: profile.coins,
        quests_completed: profile.quests_completed,
    })
}

async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.rewards.notifications().await)
}
