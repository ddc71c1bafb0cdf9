// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walk session and derived walking statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PositionFix;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// One continuous walk-tracking interval.
///
/// While `is_active` the fix log is append-only and `total_distance` only
/// grows. Once closed the session is never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Accumulated ground distance (meters)
    pub total_distance: f64,
    /// `end_time - start_time` once closed (milliseconds)
    pub total_duration: i64,
    pub is_active: bool,
    /// Every fix recorded, in arrival order
    #[serde(default)]
    pub fixes: Vec<PositionFix>,
}

impl WalkSession {
    /// Open a new session starting at `now`.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_time: now,
            end_time: None,
            total_distance: 0.0,
            total_duration: 0,
            is_active: true,
            fixes: Vec::new(),
        }
    }

    /// Most recently recorded fix.
    pub fn last_fix(&self) -> Option<&PositionFix> {
        self.fixes.last()
    }

    /// Append a fix. Returns `false` (and changes nothing) once closed.
    pub fn record(&mut self, fix: PositionFix) -> bool {
        if !self.is_active {
            return false;
        }
        self.fixes.push(fix);
        true
    }

    /// Add ground distance covered since the previous fix.
    pub fn add_distance(&mut self, meters: f64) {
        if self.is_active && meters.is_finite() && meters > 0.0 {
            self.total_distance += meters;
        }
    }

    /// Close the session at `now`. Closing twice is a no-op.
    pub fn close(&mut self, now: DateTime<Utc>) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.end_time = Some(now);
        self.total_duration = (now - self.start_time).num_milliseconds().max(0);
    }

    /// Whole minutes walked, truncated.
    pub fn walking_minutes(&self) -> u32 {
        (self.total_duration / MILLIS_PER_MINUTE).max(0) as u32
    }

    /// Compact view without the fix log.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            total_distance: self.total_distance,
            total_duration: self.total_duration,
            is_active: self.is_active,
            fix_count: self.fixes.len(),
        }
    }
}

/// Session view for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_distance: f64,
    pub total_duration: i64,
    pub is_active: bool,
    pub fix_count: usize,
}

/// Snapshot of walking metrics, replaced wholesale on every fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkStats {
    pub is_walking: bool,
    /// Instantaneous speed between the last two fixes (m/s)
    pub current_speed: f64,
    /// Cumulative distance (meters)
    pub total_distance: f64,
    /// Newest fix time minus session start (milliseconds)
    pub duration: i64,
    /// Cumulative distance over cumulative duration (m/s)
    pub average_speed: f64,
    /// Distance divided by an assumed stride length
    pub steps: u32,
}
