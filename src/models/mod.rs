// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod fix;
pub mod profile;
pub mod quest;
pub mod walk;

pub use fix::PositionFix;
pub use profile::{Notification, UserProfile};
pub use quest::{
    Quest, QuestBook, QuestCadence, QuestCategory, QuestStatus, WalkCreditOutcome,
};
pub use walk::{SessionSummary, WalkSession, WalkStats};
