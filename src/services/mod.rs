// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod metrics;
pub mod quest;
pub mod rewards;
pub mod stationary;
pub mod tracker;
pub mod walk;

pub use quest::{CompletionListener, NoRewards, QuestService, QuestStats, RefreshOutcome, WalkCredit};
pub use rewards::RewardLedger;
pub use tracker::{Ingested, StartedSession, WalkTracker};
pub use walk::{FinishedWalk, FixOutcome, LocationRequest, WalkService};
