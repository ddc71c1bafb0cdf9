// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! PPet walk tracker: walk metrics, stationary detection and quest progress
//!
//! This crate provides the backend API that records walk sessions from
//! position fixes and credits finished walks to the user's pet-care quests.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::PrefsStore;
use services::{QuestService, RewardLedger, WalkService};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub walks: WalkService,
    pub quests: Arc<QuestService>,
    pub rewards: Arc<RewardLedger>,
}

impl AppState {
    /// Wire up every service on top of `store`. Spawns the fix ingestor,
    /// so it must run inside a Tokio runtime.
    pub async fn build(
        config: Config,
        store: PrefsStore,
        clock: Arc<dyn Clock>,
    ) -> error::Result<Self> {
        let rewards = Arc::new(RewardLedger::load(store.clone(), Arc::clone(&clock)));
        let quests = Arc::new(
            QuestService::load(
                store,
                Arc::clone(&clock),
                config.quests.clone(),
                rewards.clone(),
            )
            .await?,
        );
        let tracker = Arc::new(services::WalkTracker::new(config.tracking.clone(), clock));
        let walks = WalkService::spawn(tracker, Arc::clone(&quests));

        Ok(Self {
            config,
            walks,
            quests,
            rewards,
        })
    }
}
