//! Persistence layer (JSON key-value store).

pub mod prefs;

pub use prefs::{PrefsStore, StoreError};

/// Logical key names as constants.
pub mod keys {
    pub const ACTIVE_QUESTS: &str = "active_quests";
    pub const COMPLETED_QUESTS: &str = "completed_quests";
    pub const WALK_SESSIONS: &str = "walk_sessions";
    /// Local calendar day of the last cadence refresh
    pub const LAST_QUEST_REFRESH: &str = "last_quest_refresh";
    pub const USER_PROFILE: &str = "user_profile";
    pub const NOTIFICATIONS: &str = "notifications";
}
