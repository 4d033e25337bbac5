//! Great-circle distance and travel-time heuristics
//!
//! Pure numeric helpers behind the always-available route fallback. The
//! heuristic inflates straight-line distance by a fixed road-indirection
//! factor and assumes a constant average speed.

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{GeoPoint, RouteEstimate, RouteSource};

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier approximating real road distance from great-circle distance
pub const ROAD_INDIRECTION_FACTOR: f64 = 1.3;

/// Assumed average driving speed for the fallback estimate
pub const AVERAGE_SPEED_KMH: f64 = 60.0;

/// Great-circle distance between two points in kilometres (haversine)
#[must_use]
pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1_rad = from.latitude().to_radians();
    let lat2_rad = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lon = (to.longitude() - from.longitude()).to_radians();

    let a = (lat1_rad.cos() * lat2_rad.cos()).mul_add(
        (delta_lon / 2.0).sin().powi(2),
        (delta_lat / 2.0).sin().powi(2),
    )
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Approximate road distance: haversine inflated by the indirection factor
#[must_use]
pub fn road_distance_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    haversine_km(from, to) * ROAD_INDIRECTION_FACTOR
}

/// Round a distance to one decimal place
#[must_use]
pub fn round_distance_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Convert raw seconds to whole minutes, rounding up
///
/// Negative or non-finite input yields zero.
#[must_use]
pub fn minutes_from_seconds(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    let minutes = (seconds / 60.0).ceil();
    if minutes >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
    let minutes = minutes as u32;
    minutes
}

/// Travel time in whole minutes for a distance at a constant speed
#[must_use]
pub fn travel_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if speed_kmh <= 0.0 {
        return 0;
    }
    minutes_from_seconds(distance_km / speed_kmh * 3600.0)
}

/// Departure plus a whole number of minutes
#[must_use]
pub fn arrival_after(departure_at: DateTime<Utc>, duration_minutes: u32) -> DateTime<Utc> {
    departure_at + Duration::minutes(i64::from(duration_minutes))
}

/// Offline route estimate between two points
///
/// Applies the indirection factor exactly once to the great-circle distance
/// and derives duration at [`AVERAGE_SPEED_KMH`].
#[must_use]
pub fn fallback_estimate(
    origin: &GeoPoint,
    destination: &GeoPoint,
    departure_at: DateTime<Utc>,
) -> RouteEstimate {
    let road_km = road_distance_km(origin, destination);
    let duration_minutes = travel_minutes(road_km, AVERAGE_SPEED_KMH);

    RouteEstimate {
        distance_km: round_distance_km(road_km),
        duration_minutes,
        estimated_arrival: arrival_after(departure_at, duration_minutes),
        polyline: None,
        source: RouteSource::Haversine,
    }
}
