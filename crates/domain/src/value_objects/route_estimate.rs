//! Normalized route estimate produced by route resolution

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which backend produced a route estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Credentialed directions API with traffic-aware durations
    PrimaryDirections,
    /// Free-tier directions API
    SecondaryDirections,
    /// Great-circle fallback, no network call
    Haversine,
}

impl RouteSource {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryDirections => "primary_directions",
            Self::SecondaryDirections => "secondary_directions",
            Self::Haversine => "haversine",
        }
    }

    /// Parse the stored string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary_directions" => Some(Self::PrimaryDirections),
            "secondary_directions" => Some(Self::SecondaryDirections),
            "haversine" => Some(Self::Haversine),
            _ => None,
        }
    }
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance, duration and arrival for a single origin/destination/departure
///
/// Produced fresh on every resolution, never cached across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimate {
    /// Road distance in kilometres, one decimal place
    pub distance_km: f64,
    /// Travel time in whole minutes
    pub duration_minutes: u32,
    /// `departure_at + duration_minutes`
    pub estimated_arrival: DateTime<Utc>,
    /// Provider-encoded route geometry, if the provider returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
    /// Backend that produced this estimate
    pub source: RouteSource,
}

impl RouteEstimate {
    /// Build an estimate from raw provider units (metres and seconds)
    ///
    /// Distance is rounded to 0.1 km and duration is rounded up to whole
    /// minutes so arrival is never under-promised.
    #[must_use]
    pub fn from_meters_and_seconds(
        distance_m: f64,
        duration_s: f64,
        departure_at: DateTime<Utc>,
        source: RouteSource,
    ) -> Self {
        let duration_minutes = crate::geo_math::minutes_from_seconds(duration_s);
        Self {
            distance_km: crate::geo_math::round_distance_km(distance_m / 1000.0),
            duration_minutes,
            estimated_arrival: crate::geo_math::arrival_after(departure_at, duration_minutes),
            polyline: None,
            source,
        }
    }

    /// Attach an encoded polyline
    #[must_use]
    pub fn with_polyline(mut self, polyline: impl Into<String>) -> Self {
        self.polyline = Some(polyline.into());
        self
    }

    /// Whether the numbers are usable (finite and non-negative)
    #[must_use]
    pub fn is_sane(&self) -> bool {
        self.distance_km.is_finite() && self.distance_km >= 0.0
    }
}
