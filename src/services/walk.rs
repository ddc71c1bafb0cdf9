// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walk service: session lifecycle plus the fix ingestion task.
//!
//! Fixes are handed to a single ingestor task over a bounded channel, so they
//! are applied one at a time in arrival order. The same task runs the idle
//! sweep that stops sessions left stationary. Any session that ends, by
//! request or automatically, is credited to quests.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use validator::Validate;

use crate::config::TrackingSettings;
use crate::error::{AppError, Result};
use crate::models::{PositionFix, SessionSummary, WalkSession, WalkStats};
use crate::services::quest::{QuestService, WalkCredit};
use crate::services::tracker::{Ingested, StartedSession, WalkTracker};

/// Location request parameters for the position provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationRequest {
    pub interval_ms: u64,
    pub fastest_interval_ms: u64,
    pub min_update_distance_m: f64,
}

impl From<&TrackingSettings> for LocationRequest {
    fn from(settings: &TrackingSettings) -> Self {
        Self {
            interval_ms: settings.location_interval_ms,
            fastest_interval_ms: settings.fastest_interval_ms,
            min_update_distance_m: settings.min_update_distance_m,
        }
    }
}

/// What the ingestor did with a submitted fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FixOutcome {
    Ignored,
    Recorded {
        stats: WalkStats,
    },
    AutoStopped {
        session: SessionSummary,
        credit: Option<WalkCredit>,
    },
}

/// A closed session and what it earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedWalk {
    pub session: SessionSummary,
    pub credit: WalkCredit,
}

struct FixEnvelope {
    fix: PositionFix,
    reply: oneshot::Sender<FixOutcome>,
}

pub struct WalkService {
    tracker: Arc<WalkTracker>,
    quests: Arc<QuestService>,
    fixes: mpsc::Sender<FixEnvelope>,
}

impl WalkService {
    /// Create the service and spawn its ingestor task. Must be called from
    /// within a Tokio runtime. The task exits when the service is dropped.
    pub fn spawn(tracker: Arc<WalkTracker>, quests: Arc<QuestService>) -> Self {
        let settings = tracker.settings();
        let (tx, rx) = mpsc::channel(settings.fix_channel_capacity.max(1));
        let sweep_every = Duration::from_secs(settings.sweep_interval_secs.max(1));

        tokio::spawn(run_ingestor(
            rx,
            Arc::clone(&tracker),
            Arc::clone(&quests),
            sweep_every,
        ));

        Self {
            tracker,
            quests,
            fixes: tx,
        }
    }

    pub fn tracker(&self) -> &WalkTracker {
        &self.tracker
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest::from(self.tracker.settings())
    }

    /// Start tracking. Quests are refreshed first so the walk is credited
    /// against today's set.
    pub async fn start(&self, permission_granted: bool) -> Result<StartedSession> {
        if permission_granted {
            if let Err(e) = self.quests.refresh_if_stale().await {
                tracing::warn!(error = %e, "Quest refresh failed before walk start");
            }
        }
        self.tracker.start(permission_granted).await
    }

    /// Queue a fix for the ingestor and wait for its outcome.
    ///
    /// Rejects invalid coordinates, and fails fast with `Busy` when the
    /// queue is full rather than blocking the caller.
    pub async fn submit_fix(&self, fix: PositionFix) -> Result<FixOutcome> {
        fix.validate()?;

        let (reply, outcome) = oneshot::channel();
        self.fixes
            .try_send(FixEnvelope { fix, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    AppError::Busy("Fix queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    AppError::Internal(anyhow::anyhow!("Fix ingestor is not running"))
                }
            })?;

        outcome
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Fix ingestor dropped the reply")))
    }

    /// Stop the active session and credit it to quests.
    pub async fn stop(&self) -> Result<FinishedWalk> {
        let session = self
            .tracker
            .stop()
            .await
            .ok_or_else(|| AppError::NotFound("No active walk session".to_string()))?;

        let summary = session.summary();
        let credit = self.quests.record_walk(session).await?;
        Ok(FinishedWalk {
            session: summary,
            credit,
        })
    }
}

async fn run_ingestor(
    mut rx: mpsc::Receiver<FixEnvelope>,
    tracker: Arc<WalkTracker>,
    quests: Arc<QuestService>,
    sweep_every: Duration,
) {
    let mut sweep = tokio::time::interval(sweep_every);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately
    sweep.tick().await;

    tracing::debug!(sweep_secs = sweep_every.as_secs(), "Fix ingestor started");

    loop {
        tokio::select! {
            envelope = rx.recv() => {
                let Some(FixEnvelope { fix, reply }) = envelope else {
                    tracing::debug!("Fix channel closed, ingestor exiting");
                    break;
                };
                let outcome = match tracker.ingest(fix).await {
                    Ingested::Ignored => FixOutcome::Ignored,
                    Ingested::Recorded(stats) => FixOutcome::Recorded { stats },
                    Ingested::AutoStopped(session) => {
                        let summary = session.summary();
                        FixOutcome::AutoStopped {
                            session: summary,
                            credit: credit_finished(&quests, session).await,
                        }
                    }
                };
                // The submitter may have gone away
                let _ = reply.send(outcome);
            }
            _ = sweep.tick() => {
                if let Some(session) = tracker.sweep().await {
                    credit_finished(&quests, session).await;
                }
            }
        }
    }
}

async fn credit_finished(quests: &QuestService, session: WalkSession) -> Option<WalkCredit> {
    let session_id = session.id.clone();
    match quests.record_walk(session).await {
        Ok(credit) => Some(credit),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed to credit finished walk");
            None
        }
    }
}
