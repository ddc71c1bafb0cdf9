//! Stationary detection for sessions the walker forgot to stop.

use std::collections::VecDeque;

use crate::config::TrackingSettings;
use crate::models::PositionFix;

/// True when the trailing `stationary_window` fixes are all closer than the
/// minimum update distance to their predecessor. Needs a full window.
pub fn is_stationary(history: &VecDeque<PositionFix>, settings: &TrackingSettings) -> bool {
    let window = settings.stationary_window.max(2);
    if history.len() < window {
        return false;
    }

    let recent: Vec<&PositionFix> = history.iter().skip(history.len() - window).collect();
    recent
        .windows(2)
        .all(|pair| pair[0].distance_to(pair[1]) < settings.min_update_distance_m)
}

/// Whether a session should be force-stopped: stationary, and more than the
/// timeout has passed between `last_fix_ms` and `now_ms`.
pub fn should_auto_stop(
    history: &VecDeque<PositionFix>,
    last_fix_ms: i64,
    now_ms: i64,
    settings: &TrackingSettings,
) -> bool {
    is_stationary(history, settings)
        && now_ms.saturating_sub(last_fix_ms) > settings.stationary_timeout_ms
}
