//! Reward ledger and notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const EXP_PER_LEVEL: u32 = 1000;

/// Experience and coins earned by completing quests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub exp: u32,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub quests_completed: u32,
}

impl UserProfile {
    /// Levels start at 1 and advance every 1000 exp.
    pub fn level(&self) -> u32 {
        1 + self.exp / EXP_PER_LEVEL
    }

    /// Exp needed to reach the next level.
    pub fn exp_to_next_level(&self) -> u32 {
        EXP_PER_LEVEL - self.exp % EXP_PER_LEVEL
    }

    pub fn credit(&mut self, exp: u32, coins: u32) {
        self.exp = self.exp.saturating_add(exp);
        self.coins = self.coins.saturating_add(coins);
        self.quests_completed = self.quests_completed.saturating_add(1);
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}
