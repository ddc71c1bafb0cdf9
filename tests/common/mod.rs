// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use ppet_tracker::config::Config;
use ppet_tracker::db::PrefsStore;
use ppet_tracker::routes::create_router;
use ppet_tracker::time_utils::ManualClock;
use ppet_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Monday 2026-03-02 09:00 UTC.
#[allow(dead_code)]
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// Test app over an in-memory store and a manual clock.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub clock: ManualClock,
}

/// Create a test app with in-memory storage, starting on a Monday morning.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), PrefsStore::in_memory()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with(config: Config, store: PrefsStore) -> TestApp {
    create_test_app_at(config, store, monday_morning()).await
}

/// Create a test app whose clock starts at `start`.
#[allow(dead_code)]
pub async fn create_test_app_at(config: Config, store: PrefsStore, start: DateTime<Utc>) -> TestApp {
    let clock = ManualClock::new(start);
    let state = Arc::new(
        AppState::build(config, store, Arc::new(clock.clone()))
            .await
            .expect("Failed to build app state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response body (`Null` if empty).
    #[allow(dead_code)]
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[allow(dead_code)]
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    #[allow(dead_code)]
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Post a fix taken at `at`, `lat_offset` degrees north of the base point.
    #[allow(dead_code)]
    pub async fn post_fix(&self, lat_offset: f64, at: DateTime<Utc>) -> (StatusCode, Value) {
        self.post(
            "/api/walks/fixes",
            serde_json::json!({
                "latitude": 37.5665 + lat_offset,
                "longitude": 126.978,
                "timestamp": at.timestamp_millis(),
                "accuracy": 4.0,
            }),
        )
        .await
    }

    /// Id of the first active quest matching `pred`.
    #[allow(dead_code)]
    pub async fn quest_id(&self, pred: impl Fn(&Value) -> bool) -> String {
        let (_, quests) = self.get("/api/quests").await;
        quests
            .as_array()
            .unwrap()
            .iter()
            .find(|q| pred(q))
            .map(|q| q["id"].as_str().unwrap().to_string())
            .expect("no matching quest")
    }
}

/// Matches the daily auto-detected walk quest.
#[allow(dead_code)]
pub fn is_daily_walk(q: &Value) -> bool {
    q["cadence"] == "daily" && q["category"] == "exercise" && q["auto_detectable"] == true
}
