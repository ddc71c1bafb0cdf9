// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS position fix as delivered by the location provider.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Latest accepted fix time: 9999-12-31T23:59:59.999Z in epoch milliseconds.
pub const MAX_FIX_TIMESTAMP_MS: i64 = 253_402_300_799_999;

/// A single location reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct PositionFix {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Fix time in milliseconds since the Unix epoch
    #[validate(range(min = 0, max = MAX_FIX_TIMESTAMP_MS))]
    pub timestamp: i64,
    /// Horizontal accuracy radius (meters)
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub accuracy: f64,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy,
        }
    }

    /// Great-circle ground distance to `other`, in meters.
    pub fn distance_to(&self, other: &PositionFix) -> f64 {
        Haversine.distance(self.point(), other.point())
    }

    fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}
