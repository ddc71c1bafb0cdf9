// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Every value has a default so the service runs without any environment;
//! unparsable values are rejected at startup instead of silently ignored.

use chrono::{FixedOffset, Offset, Utc, Weekday};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// JSON file backing the key-value store (`None` keeps data in memory)
    pub data_path: Option<PathBuf>,
    /// Walk tracking knobs
    pub tracking: TrackingSettings,
    /// Quest aggregation and cadence knobs
    pub quests: QuestSettings,
}

/// Location provider and walking heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Requested fix interval for the location provider (ms)
    pub location_interval_ms: u64,
    /// Fastest fix interval the provider may deliver (ms)
    pub fastest_interval_ms: u64,
    /// Minimum movement between fixes, also the stationary threshold (m)
    pub min_update_distance_m: f64,
    /// Lower bound of the walking speed band (m/s)
    pub walking_speed_min: f64,
    /// Upper bound of the walking speed band (m/s)
    pub walking_speed_max: f64,
    /// Assumed stride used for step estimation (m)
    pub stride_length_m: f64,
    /// Idle time after which a stationary session is force-stopped (ms)
    pub stationary_timeout_ms: i64,
    /// Number of trailing fixes inspected by the stationary detector
    pub stationary_window: usize,
    /// Rolling fix history kept for stationary detection
    pub history_capacity: usize,
    /// Capacity of the fix ingestion channel
    pub fix_channel_capacity: usize,
    /// Period of the idle-session sweep (seconds)
    pub sweep_interval_secs: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            location_interval_ms: 5_000,
            fastest_interval_ms: 2_000,
            min_update_distance_m: 2.0,
            walking_speed_min: 0.5,
            walking_speed_max: 4.0,
            stride_length_m: 0.7,
            stationary_timeout_ms: 300_000,
            stationary_window: 3,
            history_capacity: 100,
            fix_channel_capacity: 64,
            sweep_interval_secs: 30,
        }
    }
}

/// Quest progress and regeneration settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestSettings {
    /// Walks shorter than this many minutes earn no quest progress
    pub min_walk_minutes: u32,
    /// Day of the week on which weekly quests are regenerated
    pub weekly_anchor: Weekday,
    /// Offset from UTC used to decide which calendar day it is
    pub utc_offset_minutes: i32,
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            min_walk_minutes: 5,
            weekly_anchor: Weekday::Mon,
            utc_offset_minutes: 0,
        }
    }
}

impl QuestSettings {
    /// The fixed offset that defines local calendar days.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl Config {
    /// Default config for testing only (in-memory storage).
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            data_path: None,
            tracking: TrackingSettings::default(),
            quests: QuestSettings::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let tracking_defaults = TrackingSettings::default();
        let quest_defaults = QuestSettings::default();

        let data_path = match env::var("DATA_PATH") {
            Ok(v) if v.trim().is_empty() || v.trim() == "memory" => None,
            Ok(v) => Some(PathBuf::from(v.trim())),
            Err(_) => Some(PathBuf::from("data/ppet_prefs.json")),
        };

        let utc_offset_minutes = parse_var("QUEST_UTC_OFFSET_MINUTES", 0i32)?;
        if FixedOffset::east_opt(utc_offset_minutes * 60).is_none() {
            return Err(ConfigError::Invalid {
                name: "QUEST_UTC_OFFSET_MINUTES",
                value: utc_offset_minutes.to_string(),
            });
        }

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            data_path,
            tracking: TrackingSettings {
                location_interval_ms: parse_var(
                    "LOCATION_INTERVAL_MS",
                    tracking_defaults.location_interval_ms,
                )?,
                fastest_interval_ms: parse_var(
                    "LOCATION_FASTEST_INTERVAL_MS",
                    tracking_defaults.fastest_interval_ms,
                )?,
                min_update_distance_m: parse_var(
                    "LOCATION_MIN_DISTANCE_M",
                    tracking_defaults.min_update_distance_m,
                )?,
                walking_speed_min: parse_var(
                    "WALKING_SPEED_MIN",
                    tracking_defaults.walking_speed_min,
                )?,
                walking_speed_max: parse_var(
                    "WALKING_SPEED_MAX",
                    tracking_defaults.walking_speed_max,
                )?,
                stride_length_m: parse_var("STRIDE_LENGTH_M", tracking_defaults.stride_length_m)?,
                stationary_timeout_ms: parse_var(
                    "STATIONARY_TIMEOUT_MS",
                    tracking_defaults.stationary_timeout_ms,
                )?,
                stationary_window: tracking_defaults.stationary_window,
                history_capacity: parse_var(
                    "FIX_HISTORY_CAPACITY",
                    tracking_defaults.history_capacity,
                )?,
                fix_channel_capacity: parse_var(
                    "FIX_CHANNEL_CAPACITY",
                    tracking_defaults.fix_channel_capacity,
                )?,
                sweep_interval_secs: parse_var(
                    "IDLE_SWEEP_INTERVAL_SECS",
                    tracking_defaults.sweep_interval_secs,
                )?,
            },
            quests: QuestSettings {
                min_walk_minutes: parse_var(
                    "QUEST_MIN_WALK_MINUTES",
                    quest_defaults.min_walk_minutes,
                )?,
                weekly_anchor: parse_var("QUEST_WEEKLY_ANCHOR", quest_defaults.weekly_anchor)?,
                utc_offset_minutes,
            },
        })
    }
}

/// Read an optional environment variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
