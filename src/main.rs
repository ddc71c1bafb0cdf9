// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PPet Walk Tracker API Server
//!
//! Tracks pet walks from position fixes and credits them to daily, weekly
//! and monthly care quests.

use ppet_tracker::{config::Config, db::PrefsStore, time_utils::SystemClock, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting PPet walk tracker API");

    // Open the preference store
    let store = match &config.data_path {
        Some(path) => PrefsStore::open(path).await?,
        None => {
            tracing::warn!("DATA_PATH=memory, nothing will be persisted");
            PrefsStore::in_memory()
        }
    };

    // Build shared state and bring quests up to date
    let state = Arc::new(AppState::build(config.clone(), store, Arc::new(SystemClock)).await?);
    let refresh = state.quests.refresh_if_stale().await?;
    tracing::info!(
        refreshed = refresh.refreshed,
        day = %refresh.day,
        cadences = ?refresh.cadences,
        "Startup quest refresh"
    );

    // Build router
    let app = ppet_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ppet_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
