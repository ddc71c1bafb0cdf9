// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quest model, cadence templates and the active/completed quest book.

use chrono::{DateTime, FixedOffset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::time_utils::{first_of_next_month, local_day, local_midnight, next_weekday};

/// Recurrence period of a quest template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCadence {
    Daily,
    Weekly,
    Monthly,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestCategory {
    Exercise,
    Care,
    Feeding,
    Health,
    Social,
    Learning,
}

impl FromStr for QuestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exercise" => Ok(Self::Exercise),
            "care" => Ok(Self::Care),
            "feeding" => Ok(Self::Feeding),
            "health" => Ok(Self::Health),
            "social" => Ok(Self::Social),
            "learning" => Ok(Self::Learning),
            other => Err(format!("unknown quest category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    NotStarted,
    InProgress,
    Completed,
    Expired,
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestStatus::NotStarted => "not_started",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
            QuestStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A goal with a target value, a reward and a validity window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: QuestCategory,
    pub cadence: QuestCadence,
    pub target_value: u32,
    /// Always `<= target_value`
    #[serde(default)]
    pub current_progress: u32,
    /// Unit of progress ("min", "times")
    pub unit: String,
    pub reward_exp: u32,
    #[serde(default)]
    pub reward_coins: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: QuestStatus,
    pub auto_detectable: bool,
    #[serde(default)]
    pub pet_id: Option<String>,
}

fn default_status() -> QuestStatus {
    QuestStatus::NotStarted
}

impl Quest {
    /// Set progress to `progress`, clamped to the target, and derive the status.
    pub fn apply_progress(&mut self, progress: u32) {
        self.current_progress = progress.min(self.target_value);
        self.status = if progress >= self.target_value {
            QuestStatus::Completed
        } else {
            QuestStatus::InProgress
        };
    }

    /// Whether the validity window has elapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }

    /// Auto-detectable exercise quests are advanced by tracked walks.
    pub fn accepts_walk_minutes(&self) -> bool {
        self.category == QuestCategory::Exercise && self.auto_detectable
    }
}

/// Result of changing one quest's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub quest: Quest,
    /// The quest reached its target and moved to the completed set
    pub completed: bool,
}

/// Quests touched by crediting walking minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkCreditOutcome {
    /// Ids of every quest that received progress
    pub credited: Vec<String>,
    /// Quests that reached their target
    pub completed: Vec<Quest>,
}

/// The active/completed partition of a user's quests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestBook {
    pub active: Vec<Quest>,
    pub completed: Vec<Quest>,
}

impl QuestBook {
    pub fn new(active: Vec<Quest>, completed: Vec<Quest>) -> Self {
        Self { active, completed }
    }

    pub fn find_active(&self, id: &str) -> Option<&Quest> {
        self.active.iter().find(|q| q.id == id)
    }

    /// Set an active quest's progress; completed quests move to the completed set.
    ///
    /// Returns `None` if no active quest has this id.
    pub fn set_progress(&mut self, id: &str, progress: u32) -> Option<ProgressUpdate> {
        let index = self.active.iter().position(|q| q.id == id)?;
        self.active[index].apply_progress(progress);

        if self.active[index].status == QuestStatus::Completed {
            let quest = self.active.remove(index);
            self.completed.push(quest.clone());
            Some(ProgressUpdate {
                quest,
                completed: true,
            })
        } else {
            Some(ProgressUpdate {
                quest: self.active[index].clone(),
                completed: false,
            })
        }
    }

    /// Add `minutes` to every walk-driven active quest. Each quest is credited
    /// the full amount independently.
    pub fn credit_walk_minutes(&mut self, minutes: u32) -> WalkCreditOutcome {
        let targets: Vec<(String, u32)> = self
            .active
            .iter()
            .filter(|q| q.accepts_walk_minutes())
            .map(|q| (q.id.clone(), q.current_progress))
            .collect();

        let mut outcome = WalkCreditOutcome::default();
        for (id, progress) in targets {
            if let Some(update) = self.set_progress(&id, progress.saturating_add(minutes)) {
                outcome.credited.push(id);
                if update.completed {
                    outcome.completed.push(update.quest);
                }
            }
        }
        outcome
    }

    /// Remove active quests whose window has elapsed. They are returned marked
    /// expired and are not moved to the completed set.
    pub fn drop_expired(&mut self, now: DateTime<Utc>) -> Vec<Quest> {
        let (expired, live): (Vec<Quest>, Vec<Quest>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|q| q.is_expired(now));
        self.active = live;

        expired
            .into_iter()
            .map(|mut q| {
                q.status = QuestStatus::Expired;
                q
            })
            .collect()
    }

    /// Replace every active quest of `cadence` with `fresh`. Returns how many
    /// were removed.
    pub fn regenerate(&mut self, cadence: QuestCadence, fresh: Vec<Quest>) -> usize {
        let before = self.active.len();
        self.active.retain(|q| q.cadence != cadence);
        let removed = before - self.active.len();
        self.active.extend(fresh);
        removed
    }

    /// Completed share of all known quests, `0.0` when there are none.
    pub fn completion_rate(&self) -> f64 {
        let total = self.active.len() + self.completed.len();
        if total == 0 {
            0.0
        } else {
            self.completed.len() as f64 / total as f64
        }
    }
}

// ─── Templates ───────────────────────────────────────────────

struct Template {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    category: QuestCategory,
    target_value: u32,
    unit: &'static str,
    reward_exp: u32,
    reward_coins: u32,
    auto_detectable: bool,
}

const DAILY: &[Template] = &[
    Template {
        slug: "walk",
        title: "Go for a walk",
        description: "Walk with your pet for at least 30 minutes",
        category: QuestCategory::Exercise,
        target_value: 30,
        unit: "min",
        reward_exp: 50,
        reward_coins: 10,
        auto_detectable: true,
    },
    Template {
        slug: "feed",
        title: "Regular meals",
        description: "Feed your pet three times at the usual hours",
        category: QuestCategory::Feeding,
        target_value: 3,
        unit: "times",
        reward_exp: 30,
        reward_coins: 5,
        auto_detectable: false,
    },
    Template {
        slug: "play",
        title: "Play time",
        description: "Play with your pet for at least 15 minutes",
        category: QuestCategory::Care,
        target_value: 15,
        unit: "min",
        reward_exp: 40,
        reward_coins: 8,
        auto_detectable: false,
    },
    Template {
        slug: "water",
        title: "Fresh water",
        description: "Replace the water bowl with fresh water",
        category: QuestCategory::Care,
        target_value: 1,
        unit: "times",
        reward_exp: 20,
        reward_coins: 3,
        auto_detectable: false,
    },
];

const WEEKLY: &[Template] = &[
    Template {
        slug: "long_walk",
        title: "Long-distance walker",
        description: "Walk for a total of 3 hours this week",
        category: QuestCategory::Exercise,
        target_value: 180,
        unit: "min",
        reward_exp: 200,
        reward_coins: 50,
        auto_detectable: true,
    },
    Template {
        slug: "vet_visit",
        title: "Health check",
        description: "Visit the veterinary clinic",
        category: QuestCategory::Health,
        target_value: 1,
        unit: "times",
        reward_exp: 150,
        reward_coins: 30,
        auto_detectable: false,
    },
    Template {
        slug: "grooming",
        title: "Grooming",
        description: "Brush or bathe your pet at least three times",
        category: QuestCategory::Care,
        target_value: 3,
        unit: "times",
        reward_exp: 100,
        reward_coins: 25,
        auto_detectable: false,
    },
];

const MONTHLY: &[Template] = &[
    Template {
        slug: "exercise_master",
        title: "Exercise master",
        description: "Walk for a total of 20 hours this month",
        category: QuestCategory::Exercise,
        target_value: 1200,
        unit: "min",
        reward_exp: 1000,
        reward_coins: 200,
        auto_detectable: true,
    },
    Template {
        slug: "social_pet",
        title: "Social butterfly",
        description: "Meet other pets ten times",
        category: QuestCategory::Social,
        target_value: 10,
        unit: "times",
        reward_exp: 500,
        reward_coins: 100,
        auto_detectable: false,
    },
];

impl Template {
    fn instantiate(&self, cadence: QuestCadence, now: DateTime<Utc>, end: DateTime<Utc>) -> Quest {
        let prefix = match cadence {
            QuestCadence::Daily => "daily",
            QuestCadence::Weekly => "weekly",
            QuestCadence::Monthly => "monthly",
            QuestCadence::Special => "special",
        };
        Quest {
            id: format!("{}_{}_{}", prefix, self.slug, now.timestamp_millis()),
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: self.category,
            cadence,
            target_value: self.target_value,
            current_progress: 0,
            unit: self.unit.to_string(),
            reward_exp: self.reward_exp,
            reward_coins: self.reward_coins,
            start_date: now,
            end_date: end,
            status: QuestStatus::NotStarted,
            auto_detectable: self.auto_detectable,
            pet_id: None,
        }
    }
}

/// Fresh quests for `cadence`, valid from `now` until the next boundary of
/// that cadence in local time. Special quests have no templates.
pub fn instantiate_templates(
    cadence: QuestCadence,
    now: DateTime<Utc>,
    offset: FixedOffset,
    weekly_anchor: Weekday,
) -> Vec<Quest> {
    let today = local_day(now, offset);
    let (templates, end_day) = match cadence {
        QuestCadence::Daily => (DAILY, today.succ_opt().unwrap_or(today)),
        QuestCadence::Weekly => (WEEKLY, next_weekday(today, weekly_anchor)),
        QuestCadence::Monthly => (MONTHLY, first_of_next_month(today)),
        QuestCadence::Special => return Vec::new(),
    };
    let end = local_midnight(end_day, offset);

    templates
        .iter()
        .map(|t| t.instantiate(cadence, now, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap()
    }

    fn walk_quest(id: &str, target: u32, progress: u32) -> Quest {
        let mut quest = instantiate_templates(QuestCadence::Daily, now(), Utc.fix(), Weekday::Mon)
            .into_iter()
            .find(|q| q.category == QuestCategory::Exercise)
            .unwrap();
        quest.id = id.to_string();
        quest.target_value = target;
        quest.current_progress = progress;
        quest
    }

    #[test]
    fn test_apply_progress_clamps_and_completes() {
        let mut quest = walk_quest("q", 30, 10);

        quest.apply_progress(22);
        assert_eq!(quest.current_progress, 22);
        assert_eq!(quest.status, QuestStatus::InProgress);

        quest.apply_progress(37);
        assert_eq!(quest.current_progress, 30);
        assert_eq!(quest.status, QuestStatus::Completed);
    }

    #[test]
    fn test_credit_walk_moves_completed_quests() {
        let mut feed = walk_quest("feed", 3, 0);
        feed.category = QuestCategory::Feeding;
        let mut manual_walk = walk_quest("manual", 30, 0);
        manual_walk.auto_detectable = false;

        let mut book = QuestBook::new(
            vec![
                walk_quest("a", 30, 10),
                walk_quest("b", 30, 25),
                feed,
                manual_walk,
            ],
            vec![],
        );

        let outcome = book.credit_walk_minutes(12);

        assert_eq!(outcome.credited, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(outcome.completed[0].id, "b");
        assert_eq!(outcome.completed[0].current_progress, 30);

        assert_eq!(book.find_active("a").unwrap().current_progress, 22);
        assert!(book.find_active("b").is_none());
        assert_eq!(book.completed.len(), 1);
        assert_eq!(book.find_active("feed").unwrap().current_progress, 0);
        assert_eq!(book.find_active("manual").unwrap().current_progress, 0);
    }

    #[test]
    fn test_set_progress_unknown_id() {
        let mut book = QuestBook::default();
        assert!(book.set_progress("missing", 5).is_none());
    }

    #[test]
    fn test_drop_expired_does_not_complete() {
        let mut stale = walk_quest("stale", 30, 5);
        stale.end_date = now() - chrono::Duration::seconds(1);
        let mut boundary = walk_quest("boundary", 30, 5);
        boundary.end_date = now();
        let fresh = walk_quest("fresh", 30, 5);

        let mut book = QuestBook::new(vec![stale, boundary, fresh], vec![]);
        let expired = book.drop_expired(now());

        assert_eq!(expired.len(), 2);
        assert!(expired.iter().all(|q| q.status == QuestStatus::Expired));
        assert_eq!(book.active.len(), 1);
        assert_eq!(book.active[0].id, "fresh");
        assert!(book.completed.is_empty());
    }

    #[test]
    fn test_regenerate_replaces_only_matching_cadence() {
        let daily = instantiate_templates(QuestCadence::Daily, now(), Utc.fix(), Weekday::Mon);
        let weekly = instantiate_templates(QuestCadence::Weekly, now(), Utc.fix(), Weekday::Mon);
        let mut book = QuestBook::new([daily.clone(), weekly.clone()].concat(), vec![]);

        let later = now() + chrono::Duration::days(1);
        let fresh_daily = instantiate_templates(QuestCadence::Daily, later, Utc.fix(), Weekday::Mon);
        let removed = book.regenerate(QuestCadence::Daily, fresh_daily.clone());

        assert_eq!(removed, daily.len());
        assert_eq!(book.active.len(), fresh_daily.len() + weekly.len());
        assert!(book
            .active
            .iter()
            .filter(|q| q.cadence == QuestCadence::Daily)
            .all(|q| q.start_date == later));
    }

    #[test]
    fn test_template_windows() {
        let daily = instantiate_templates(QuestCadence::Daily, now(), Utc.fix(), Weekday::Mon);
        assert_eq!(daily.len(), 4);
        assert!(daily
            .iter()
            .all(|q| q.end_date == Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap()));

        let weekly = instantiate_templates(QuestCadence::Weekly, now(), Utc.fix(), Weekday::Mon);
        assert_eq!(weekly.len(), 3);
        assert_eq!(
            weekly[0].end_date,
            Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap()
        );

        let monthly = instantiate_templates(QuestCadence::Monthly, now(), Utc.fix(), Weekday::Mon);
        assert_eq!(monthly.len(), 2);
        assert_eq!(
            monthly[0].end_date,
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
        );

        assert!(instantiate_templates(QuestCadence::Special, now(), Utc.fix(), Weekday::Mon).is_empty());
    }

    #[test]
    fn test_completion_rate() {
        let mut book = QuestBook::default();
        assert_eq!(book.completion_rate(), 0.0);

        book.active.push(walk_quest("a", 30, 0));
        book.completed.push(walk_quest("b", 30, 30));
        assert_eq!(book.completion_rate(), 0.5);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Exercise".parse::<QuestCategory>(), Ok(QuestCategory::Exercise));
        assert!("swimming".parse::<QuestCategory>().is_err());
    }
}
