// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walking metrics derived from consecutive position fixes.
//!
//! Everything here is a pure function of the session state and the newest
//! fix, so it can be tested without a tracker or a clock.

use crate::config::TrackingSettings;
use crate::models::{PositionFix, WalkStats};

/// New session totals and the stats snapshot to publish.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsUpdate {
    /// Ground distance between the previous fix and the new one (meters)
    pub distance_delta: f64,
    pub stats: WalkStats,
}

/// Compute metrics for `current` given the fix recorded just before it.
///
/// `prior_distance` is the session distance before this fix and
/// `session_start_ms` the session start in epoch milliseconds.
pub fn advance(
    previous: &PositionFix,
    current: &PositionFix,
    prior_distance: f64,
    session_start_ms: i64,
    settings: &TrackingSettings,
) -> MetricsUpdate {
    let distance_delta = previous.distance_to(current);
    let time_delta_ms = current.timestamp.saturating_sub(previous.timestamp);

    // Duplicate or out-of-order fixes must not divide by zero or go negative
    let current_speed = if time_delta_ms > 0 {
        distance_delta / (time_delta_ms as f64 / 1000.0)
    } else {
        0.0
    };

    let total_distance = prior_distance + distance_delta;
    let duration = current.timestamp.saturating_sub(session_start_ms);
    let average_speed = if duration > 0 {
        total_distance / (duration as f64 / 1000.0)
    } else {
        0.0
    };

    MetricsUpdate {
        distance_delta,
        stats: WalkStats {
            is_walking: is_walking_speed(current_speed, settings),
            current_speed,
            total_distance,
            duration,
            average_speed,
            steps: estimate_steps(total_distance, settings.stride_length_m),
        },
    }
}

/// Speeds inside the walking band (inclusive) count as walking. Slower is
/// standing still, faster is running; neither counts.
pub fn is_walking_speed(speed: f64, settings: &TrackingSettings) -> bool {
    speed >= settings.walking_speed_min && speed <= settings.walking_speed_max
}

/// Heuristic step count: distance over stride length, truncated.
pub fn estimate_steps(distance: f64, stride_length: f64) -> u32 {
    if stride_length <= 0.0 || !distance.is_finite() || distance <= 0.0 {
        return 0;
    }
    (distance / stride_length) as u32
}
