// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end quest progress: walks credited to quests, refresh cadence and
//! persistence across restarts.

use axum::http::StatusCode;
use chrono::Duration;
use ppet_tracker::config::Config;
use ppet_tracker::db::{keys, PrefsStore};
use ppet_tracker::models::{Quest, QuestCadence};
use ppet_tracker::time_utils::Clock;
use serde_json::json;

mod common;
use common::{is_daily_walk, TestApp};

/// Run a walk of `minutes` through the HTTP API.
async fn walk_for(app: &TestApp, minutes: i64) -> serde_json::Value {
    let start = app.clock.now();
    app.post("/api/walks/start", json!({ "permission_granted": true }))
        .await;
    app.post_fix(0.0, start).await;
    app.post_fix(1e-3, start + Duration::minutes(1)).await;
    app.clock.advance(Duration::minutes(minutes));
    let (status, finished) = app.post("/api/walks/stop", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    finished
}

#[tokio::test]
async fn test_twelve_minute_walk_advances_progress() {
    let app = common::create_test_app().await;
    app.post("/api/quests/refresh", json!({})).await;
    let walk_id = app.quest_id(is_daily_walk).await;

    let (status, _) = app
        .post(
            &format!("/api/quests/{}/progress", walk_id),
            json!({ "progress": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    walk_for(&app, 12).await;

    let (_, quests) = app.get("/api/quests").await;
    let quest = quests
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["id"] == walk_id.as_str())
        .unwrap();
    assert_eq!(quest["current_progress"], 22);
    assert_eq!(quest["status"], "in_progress");
}

#[tokio::test]
async fn test_walk_past_target_completes_and_clamps() {
    let app = common::create_test_app().await;
    app.post("/api/quests/refresh", json!({})).await;
    let walk_id = app.quest_id(is_daily_walk).await;

    app.post(
        &format!("/api/quests/{}/progress", walk_id),
        json!({ "progress": 25 }),
    )
    .await;

    let finished = walk_for(&app, 12).await;
    assert_eq!(finished["credit"]["completed"][0]["id"], walk_id.as_str());

    let (_, active) = app.get("/api/quests").await;
    assert!(active
        .as_array()
        .unwrap()
        .iter()
        .all(|q| q["id"] != walk_id.as_str()));

    let (_, completed) = app.get("/api/quests/completed").await;
    let done = &completed[0];
    assert_eq!(done["id"], walk_id.as_str());
    assert_eq!(done["current_progress"], 30);
    assert_eq!(done["status"], "completed");

    // Reward collaborator was invoked
    let (_, profile) = app.get("/api/profile").await;
    assert_eq!(profile["exp"], 50);
    assert_eq!(profile["coins"], 10);
    let (_, notifications) = app.get("/api/notifications").await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_short_walk_leaves_quests_untouched() {
    let app = common::create_test_app().await;
    app.post("/api/quests/refresh", json!({})).await;
    let (_, before) = app.get("/api/quests").await;

    let finished = walk_for(&app, 4).await;

    assert_eq!(finished["credit"]["applied"], false);
    let (_, after) = app.get("/api/quests").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_refresh_twice_same_day_is_idempotent() {
    let app = common::create_test_app().await;

    let (_, first) = app.post("/api/quests/refresh", json!({})).await;
    assert_eq!(first["refreshed"], true);
    assert_eq!(first["cadences"], json!(["daily", "weekly"]));
    let (_, quests_after_first) = app.get("/api/quests").await;

    app.clock.advance(Duration::hours(3));
    let (_, second) = app.post("/api/quests/refresh", json!({})).await;
    assert_eq!(second["refreshed"], false);

    let (_, quests_after_second) = app.get("/api/quests").await;
    assert_eq!(quests_after_first, quests_after_second);
}

#[tokio::test]
async fn test_next_day_replaces_daily_but_keeps_weekly_progress() {
    let app = common::create_test_app().await;
    app.post("/api/quests/refresh", json!({})).await;

    walk_for(&app, 12).await;

    app.clock.advance(Duration::days(1));
    let (_, refresh) = app.post("/api/quests/refresh", json!({})).await;
    assert_eq!(refresh["cadences"], json!(["daily"]));

    let (_, quests) = app.get("/api/quests?category=exercise").await;
    let quests = quests.as_array().unwrap();
    let daily = quests.iter().find(|q| q["cadence"] == "daily").unwrap();
    let weekly = quests.iter().find(|q| q["cadence"] == "weekly").unwrap();
    assert_eq!(daily["current_progress"], 0);
    assert_eq!(weekly["current_progress"], 12);
}

#[tokio::test]
async fn test_quests_survive_restart() {
    let path = std::env::temp_dir()
        .join(format!("ppet-restart-{}", uuid::Uuid::new_v4()))
        .join("prefs.json");

    let (active, completed) = {
        let store = PrefsStore::open(&path).await.unwrap();
        let app = common::create_test_app_with(Config::test_default(), store).await;
        app.post("/api/quests/refresh", json!({})).await;
        let water = app.quest_id(|q| q["title"] == "Fresh water").await;
        app.post(&format!("/api/quests/{}/complete", water), json!({}))
            .await;
        walk_for(&app, 12).await;

        (
            app.state.quests.active_quests(None).await,
            app.state.quests.completed_quests().await,
        )
    };
    assert_eq!(completed.len(), 1);

    let reopened = PrefsStore::open(&path).await.unwrap();
    let stored_active: Vec<Quest> = reopened.load(keys::ACTIVE_QUESTS).unwrap().unwrap();
    assert_eq!(stored_active, active);

    let app = common::create_test_app_with(Config::test_default(), reopened).await;
    assert_eq!(app.state.quests.active_quests(None).await, active);
    assert_eq!(app.state.quests.completed_quests().await, completed);
    assert_eq!(app.state.rewards.profile().await.quests_completed, 1);

    // Same day: the restored refresh marker prevents regeneration
    let (_, refresh) = app.post("/api/quests/refresh", json!({})).await;
    assert_eq!(refresh["refreshed"], false);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_expired_quests_are_dropped_on_load() {
    let store = PrefsStore::in_memory();
    {
        let app = common::create_test_app_with(Config::test_default(), store.clone()).await;
        app.post("/api/quests/refresh", json!({})).await;
    }

    // Restart on Wednesday, before any refresh: the daily set has expired
    let wednesday = common::monday_morning() + Duration::days(2);
    let app = common::create_test_app_at(Config::test_default(), store, wednesday).await;

    let quests = app.state.quests.active_quests(None).await;
    assert_eq!(quests.len(), 3);
    assert!(quests.iter().all(|q| q.cadence == QuestCadence::Weekly));
    assert!(app.state.quests.completed_quests().await.is_empty());
}
