// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward ledger: credits quest rewards to the user profile and records
//! notifications.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{keys, PrefsStore};
use crate::error::Result;
use crate::models::{Notification, Quest, UserProfile};
use crate::services::quest::CompletionListener;
use crate::time_utils::Clock;

/// Oldest notifications beyond this are discarded.
const MAX_NOTIFICATIONS: usize = 100;

pub struct RewardLedger {
    profile: Mutex<UserProfile>,
    notifications: Mutex<Vec<Notification>>,
    store: PrefsStore,
    clock: Arc<dyn Clock>,
}

impl RewardLedger {
    pub fn load(store: PrefsStore, clock: Arc<dyn Clock>) -> Self {
        let profile: UserProfile = store.load_or_default(keys::USER_PROFILE);
        let notifications: Vec<Notification> = store.load_or_default(keys::NOTIFICATIONS);

        tracing::debug!(
            level = profile.level(),
            notifications = notifications.len(),
            "Loaded reward ledger"
        );

        Self {
            profile: Mutex::new(profile),
            notifications: Mutex::new(notifications),
            store,
            clock,
        }
    }

    pub async fn profile(&self) -> UserProfile {
        self.profile.lock().await.clone()
    }

    /// Notifications, newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        let notifications = self.notifications.lock().await;
        notifications.iter().rev().cloned().collect()
    }

    /// Credit a completed quest's reward and announce it.
    pub async fn grant(&self, quest: &Quest) -> Result<UserProfile> {
        let (profile, leveled_up) = {
            let mut profile = self.profile.lock().await;
            let mut next = profile.clone();
            next.credit(quest.reward_exp, quest.reward_coins);
            self.store.save(keys::USER_PROFILE, &next).await?;
            let leveled_up = next.level() > profile.level();
            *profile = next;
            (profile.clone(), leveled_up)
        };

        tracing::info!(
            quest_id = %quest.id,
            exp = quest.reward_exp,
            coins = quest.reward_coins,
            level = profile.level(),
            "Granted quest reward"
        );

        let mut notes = vec![self.notification(
            "Quest complete!",
            format!(
                "{}: +{} EXP, +{} coins",
                quest.title, quest.reward_exp, quest.reward_coins
            ),
        )];
        if leveled_up {
            notes.push(self.notification(
                "Level up!",
                format!("You reached level {}", profile.level()),
            ));
        }
        self.push_notifications(notes).await?;

        Ok(profile)
    }

    fn notification(&self, title: &str, body: String) -> Notification {
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            body,
            created_at: self.clock.now(),
            read: false,
        }
    }

    async fn push_notifications(&self, notes: Vec<Notification>) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        let mut next = notifications.clone();
        next.extend(notes);
        if next.len() > MAX_NOTIFICATIONS {
            let excess = next.len() - MAX_NOTIFICATIONS;
            next.drain(..excess);
        }
        self.store.save(keys::NOTIFICATIONS, &next).await?;
        *notifications = next;
        Ok(())
    }
}

impl CompletionListener for RewardLedger {
    fn quest_completed<'a>(&'a self, quest: &'a Quest) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.grant(quest).await.map(|_| ()) })
    }
}
