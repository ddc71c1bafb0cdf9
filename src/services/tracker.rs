// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walk session tracker.
//!
//! Owns the current session and the rolling fix history behind one lock,
//! applies the metrics calculator to every fix and publishes the resulting
//! [`WalkStats`] snapshot on a watch channel.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::config::TrackingSettings;
use crate::error::{AppError, Result};
use crate::models::{PositionFix, SessionSummary, WalkSession, WalkStats};
use crate::services::{metrics, stationary};
use crate::time_utils::Clock;

/// What happened to an ingested fix.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// No session is active; the fix was dropped
    Ignored,
    /// Recorded; carries the snapshot published for it
    Recorded(WalkStats),
    /// Recorded, then the session was force-stopped as stationary
    AutoStopped(WalkSession),
}

/// Result of a start request.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    pub session: SessionSummary,
    /// A session was already running and is being reused
    pub resumed: bool,
}

struct TrackerState {
    session: Option<WalkSession>,
    // Shared across sessions; only used for stationary detection
    history: VecDeque<PositionFix>,
}

/// Walk tracker with exclusive access to the current session.
pub struct WalkTracker {
    state: Mutex<TrackerState>,
    stats_tx: watch::Sender<WalkStats>,
    settings: TrackingSettings,
    clock: Arc<dyn Clock>,
}

impl WalkTracker {
    pub fn new(settings: TrackingSettings, clock: Arc<dyn Clock>) -> Self {
        let (stats_tx, _) = watch::channel(WalkStats::default());
        Self {
            state: Mutex::new(TrackerState {
                session: None,
                history: VecDeque::with_capacity(settings.history_capacity),
            }),
            stats_tx,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    /// Start a session. Fails without location permission; returns the
    /// running session if one is already active.
    pub async fn start(&self, permission_granted: bool) -> Result<StartedSession> {
        if !permission_granted {
            tracing::warn!("Walk tracking requested without location permission");
            return Err(AppError::PermissionDenied(
                "Fine location permission is required to track walks".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        if let Some(session) = state.session.as_ref().filter(|s| s.is_active) {
            tracing::debug!(session_id = %session.id, "Walk already in progress");
            return Ok(StartedSession {
                session: session.summary(),
                resumed: true,
            });
        }

        let session = WalkSession::start(self.clock.now());
        tracing::info!(session_id = %session.id, "Walk tracking started");

        let summary = session.summary();
        state.session = Some(session);
        self.stats_tx.send_replace(WalkStats::default());

        Ok(StartedSession {
            session: summary,
            resumed: false,
        })
    }

    /// Record a fix into the active session, update metrics and run the
    /// stationary check. Fixes arriving with no active session are ignored.
    pub async fn ingest(&self, fix: PositionFix) -> Ingested {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(session) = state.session.as_mut().filter(|s| s.is_active) else {
            tracing::debug!("Ignoring fix, no active walk session");
            return Ingested::Ignored;
        };

        let previous = session.last_fix().copied();
        session.record(fix);

        state.history.push_back(fix);
        while state.history.len() > self.settings.history_capacity.max(1) {
            state.history.pop_front();
        }

        let stats = match previous {
            Some(previous) => {
                let update = metrics::advance(
                    &previous,
                    &fix,
                    session.total_distance,
                    session.start_time.timestamp_millis(),
                    &self.settings,
                );
                session.add_distance(update.distance_delta);
                self.stats_tx.send_replace(update.stats);
                update.stats
            }
            // A single fix yields no metrics
            None => *self.stats_tx.borrow(),
        };

        if let Some(closed) = self.close_if_stationary(state) {
            return Ingested::AutoStopped(closed);
        }

        Ingested::Recorded(stats)
    }

    /// Run the stationary check without a new fix. Returns the session if it
    /// was force-stopped; a no-op when nothing is active.
    pub async fn sweep(&self) -> Option<WalkSession> {
        let mut state = self.state.lock().await;
        self.close_if_stationary(&mut state)
    }

    /// Stop the active session, if any, and reset the published stats.
    pub async fn stop(&self) -> Option<WalkSession> {
        let mut state = self.state.lock().await;
        self.close_locked(&mut state)
    }

    /// Latest published stats snapshot.
    pub fn stats(&self) -> WalkStats {
        *self.stats_tx.borrow()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<WalkStats> {
        self.stats_tx.subscribe()
    }

    /// Summary of the active session, if any.
    pub async fn current(&self) -> Option<SessionSummary> {
        let state = self.state.lock().await;
        state
            .session
            .as_ref()
            .filter(|s| s.is_active)
            .map(WalkSession::summary)
    }

    fn close_if_stationary(&self, state: &mut TrackerState) -> Option<WalkSession> {
        let session = state.session.as_ref().filter(|s| s.is_active)?;

        // The trailing window must consist of this session's own fixes
        if session.fixes.len() < self.settings.stationary_window.max(2) {
            return None;
        }
        let last_fix_ms = session.last_fix()?.timestamp;
        let now_ms = self.clock.now().timestamp_millis();

        if !stationary::should_auto_stop(&state.history, last_fix_ms, now_ms, &self.settings) {
            return None;
        }

        tracing::info!(
            session_id = %session.id,
            idle_ms = now_ms.saturating_sub(last_fix_ms),
            "Stationary too long, stopping walk"
        );
        self.close_locked(state)
    }

    fn close_locked(&self, state: &mut TrackerState) -> Option<WalkSession> {
        let mut session = state.session.take()?;
        session.close(self.clock.now());
        self.stats_tx.send_replace(WalkStats::default());

        tracing::info!(
            session_id = %session.id,
            distance_m = session.total_distance,
            duration_ms = session.total_duration,
            fixes = session.fixes.len(),
            "Walk tracking stopped"
        );
        Some(session)
    }
}
