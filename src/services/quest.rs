// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quest progress service.
//!
//! Handles the quest lifecycle:
//! 1. Load active/completed quests, dropping expired ones
//! 2. Regenerate cadence quests once per local day
//! 3. Credit finished walks to walk-driven exercise quests
//! 4. Manual progress updates and completion
//! 5. Hand completed quests to the reward collaborator
//!
//! Every read-modify-persist cycle runs under one lock, so concurrent
//! updates from walk completion and manual edits never lose each other.
//! Changes are made on a copy and only become visible once they are saved.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::QuestSettings;
use crate::db::{keys, prefs, PrefsStore};
use crate::error::{AppError, Result};
use crate::models::quest::instantiate_templates;
use crate::models::{
    Quest, QuestBook, QuestCadence, QuestCategory, SessionSummary, WalkSession,
};
use crate::time_utils::{local_day, local_midnight, week_start, Clock};

/// Receives quests the moment they are completed.
pub trait CompletionListener: Send + Sync {
    fn quest_completed<'a>(&'a self, quest: &'a Quest) -> BoxFuture<'a, Result<()>>;
}

/// Listener that ignores completions.
pub struct NoRewards;

impl CompletionListener for NoRewards {
    fn quest_completed<'a>(&'a self, _quest: &'a Quest) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Result of crediting one finished walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkCredit {
    pub session_id: String,
    pub walking_minutes: u32,
    /// False when the walk was shorter than the credit threshold
    pub applied: bool,
    pub credited: Vec<String>,
    pub completed: Vec<Quest>,
}

/// Result of a cadence refresh check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub refreshed: bool,
    /// Local calendar day the check ran for
    pub day: NaiveDate,
    pub cadences: Vec<QuestCadence>,
    pub expired: usize,
}

/// Aggregate view over quests and walk history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestStats {
    pub active: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub today_walking_minutes: u32,
    pub week_walking_minutes: u32,
    pub total_walks: usize,
}

pub struct QuestService {
    book: Mutex<QuestBook>,
    sessions: Mutex<Vec<WalkSession>>,
    store: PrefsStore,
    clock: Arc<dyn Clock>,
    settings: QuestSettings,
    listener: Arc<dyn CompletionListener>,
}

impl QuestService {
    /// Load persisted quests and walk history. Quests whose window has
    /// already elapsed are dropped.
    pub async fn load(
        store: PrefsStore,
        clock: Arc<dyn Clock>,
        settings: QuestSettings,
        listener: Arc<dyn CompletionListener>,
    ) -> Result<Self> {
        let mut book = QuestBook::new(
            store.load_or_default(keys::ACTIVE_QUESTS),
            store.load_or_default(keys::COMPLETED_QUESTS),
        );
        let sessions: Vec<WalkSession> = store.load_or_default(keys::WALK_SESSIONS);

        let expired = book.drop_expired(clock.now());
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Dropped expired quests on load");
            persist(&store, &book).await?;
        }

        tracing::info!(
            active = book.active.len(),
            completed = book.completed.len(),
            walks = sessions.len(),
            "Loaded quest book"
        );

        Ok(Self {
            book: Mutex::new(book),
            sessions: Mutex::new(sessions),
            store,
            clock,
            settings,
            listener,
        })
    }

    /// Regenerate cadence quests if the last refresh was before today.
    ///
    /// Daily quests are replaced every day, weekly ones on the anchor weekday
    /// and monthly ones on the 1st. Running twice on the same local day is a
    /// no-op the second time.
    pub async fn refresh_if_stale(&self) -> Result<RefreshOutcome> {
        let now = self.clock.now();
        let offset = self.settings.offset();
        let today = local_day(now, offset);

        let mut book = self.book.lock().await;

        let last_refresh = self
            .store
            .load::<NaiveDate>(keys::LAST_QUEST_REFRESH)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Unreadable last refresh date, refreshing");
                None
            });

        if last_refresh.is_some_and(|day| day >= today) {
            tracing::debug!(%today, "Quests already refreshed today");
            return Ok(RefreshOutcome {
                refreshed: false,
                day: today,
                cadences: Vec::new(),
                expired: 0,
            });
        }

        let mut next = book.clone();
        let expired = next.drop_expired(now).len();

        let mut cadences = vec![QuestCadence::Daily];
        if today.weekday() == self.settings.weekly_anchor {
            cadences.push(QuestCadence::Weekly);
        }
        if today.day() == 1 {
            cadences.push(QuestCadence::Monthly);
        }

        for cadence in &cadences {
            let fresh = instantiate_templates(*cadence, now, offset, self.settings.weekly_anchor);
            let created = fresh.len();
            let removed = next.regenerate(*cadence, fresh);
            tracing::info!(?cadence, removed, created, "Regenerated quests");
        }

        let mut values = book_values(&next)?;
        values.push((
            keys::LAST_QUEST_REFRESH,
            prefs::encode(keys::LAST_QUEST_REFRESH, &today)?,
        ));
        self.store.put_all_raw(values).await?;
        *book = next;

        Ok(RefreshOutcome {
            refreshed: true,
            day: today,
            cadences,
            expired,
        })
    }

    /// Store a finished walk and credit its whole minutes to every
    /// walk-driven exercise quest.
    ///
    /// Walks shorter than the configured minimum are kept in history but
    /// change no quest.
    pub async fn record_walk(&self, session: WalkSession) -> Result<WalkCredit> {
        if session.is_active {
            return Err(AppError::BadRequest(format!(
                "Walk session {} is still active",
                session.id
            )));
        }

        let minutes = session.walking_minutes();
        let session_id = session.id.clone();

        // Lock order: sessions, then book
        let mut sessions = self.sessions.lock().await;
        let mut next_sessions = sessions.clone();
        next_sessions.push(session);
        let history = (
            keys::WALK_SESSIONS,
            prefs::encode(keys::WALK_SESSIONS, &next_sessions)?,
        );

        if minutes < self.settings.min_walk_minutes {
            self.store.put_all_raw(vec![history]).await?;
            *sessions = next_sessions;

            tracing::debug!(
                session_id = %session_id,
                minutes,
                min = self.settings.min_walk_minutes,
                "Walk too short to credit quests"
            );
            return Ok(WalkCredit {
                session_id,
                walking_minutes: minutes,
                applied: false,
                credited: Vec::new(),
                completed: Vec::new(),
            });
        }

        let outcome = {
            let mut book = self.book.lock().await;
            let mut next = book.clone();
            let outcome = next.credit_walk_minutes(minutes);

            let mut values = book_values(&next)?;
            values.push(history);
            self.store.put_all_raw(values).await?;

            *book = next;
            *sessions = next_sessions;
            outcome
        };
        drop(sessions);

        tracing::info!(
            session_id = %session_id,
            minutes,
            credited = outcome.credited.len(),
            completed = outcome.completed.len(),
            "Credited walk to quests"
        );

        self.notify_completed(&outcome.completed).await;

        Ok(WalkCredit {
            session_id,
            walking_minutes: minutes,
            applied: true,
            credited: outcome.credited,
            completed: outcome.completed,
        })
    }

    /// Set an active quest's progress, clamped to its target.
    pub async fn update_progress(&self, quest_id: &str, progress: u32) -> Result<Quest> {
        let update = {
            let mut book = self.book.lock().await;
            let mut next = book.clone();
            let update = next
                .set_progress(quest_id, progress)
                .ok_or_else(|| AppError::NotFound(format!("Active quest {}", quest_id)))?;
            persist(&self.store, &next).await?;
            *book = next;
            update
        };

        tracing::info!(
            quest_id,
            progress = update.quest.current_progress,
            status = %update.quest.status,
            "Updated quest progress"
        );

        if update.completed {
            self.notify_completed(std::slice::from_ref(&update.quest))
                .await;
        }
        Ok(update.quest)
    }

    /// Complete an active quest outright.
    pub async fn mark_completed(&self, quest_id: &str) -> Result<Quest> {
        let target = {
            let book = self.book.lock().await;
            book.find_active(quest_id)
                .map(|q| q.target_value)
                .ok_or_else(|| AppError::NotFound(format!("Active quest {}", quest_id)))?
        };
        self.update_progress(quest_id, target).await
    }

    pub async fn active_quests(&self, category: Option<QuestCategory>) -> Vec<Quest> {
        let book = self.book.lock().await;
        book.active
            .iter()
            .filter(|q| category.is_none_or(|c| q.category == c))
            .cloned()
            .collect()
    }

    pub async fn completed_quests(&self) -> Vec<Quest> {
        self.book.lock().await.completed.clone()
    }

    /// Finished walks, most recent first.
    pub async fn walk_history(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.lock().await;
        sessions.iter().rev().map(WalkSession::summary).collect()
    }

    pub async fn stats(&self) -> QuestStats {
        let now = self.clock.now();
        let offset = self.settings.offset();
        let today = local_day(now, offset);
        let day_start = local_midnight(today, offset);
        let week_begin = local_midnight(week_start(today, self.settings.weekly_anchor), offset);

        let (active, completed, completion_rate) = {
            let book = self.book.lock().await;
            (book.active.len(), book.completed.len(), book.completion_rate())
        };

        let sessions = self.sessions.lock().await;
        QuestStats {
            active,
            completed,
            completion_rate,
            today_walking_minutes: minutes_since(&sessions, day_start),
            week_walking_minutes: minutes_since(&sessions, week_begin),
            total_walks: sessions.len(),
        }
    }

    // A failed reward does not undo the completion; the quest stays completed.
    async fn notify_completed(&self, quests: &[Quest]) {
        for quest in quests {
            if let Err(e) = self.listener.quest_completed(quest).await {
                tracing::warn!(quest_id = %quest.id, error = %e, "Failed to grant quest reward");
            }
        }
    }
}

// Active and completed lists are always written together.
fn book_values(book: &QuestBook) -> Result<Vec<(&'static str, String)>> {
    Ok(vec![
        (keys::ACTIVE_QUESTS, prefs::encode(keys::ACTIVE_QUESTS, &book.active)?),
        (
            keys::COMPLETED_QUESTS,
            prefs::encode(keys::COMPLETED_QUESTS, &book.completed)?,
        ),
    ])
}

async fn persist(store: &PrefsStore, book: &QuestBook) -> Result<()> {
    store.put_all_raw(book_values(book)?).await?;
    Ok(())
}

fn minutes_since(sessions: &[WalkSession], since: DateTime<Utc>) -> u32 {
    sessions
        .iter()
        .filter(|s| !s.is_active && s.start_time >= since)
        .map(WalkSession::walking_minutes)
        .sum()
}
