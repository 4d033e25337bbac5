//! Provider-specific coordinate order
//!
//! Google-style APIs take `lat,lng`; OpenRouteService (and GeoJSON in
//! general) takes `[lng, lat]`. Each client accepts only its own order so a
//! swap cannot compile.

use std::fmt;

use domain::value_objects::GeoPoint;
use serde::{Serialize, Serializer, ser::SerializeTuple};

/// Latitude-first coordinate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<&GeoPoint> for LatLng {
    fn from(point: &GeoPoint) -> Self {
        Self {
            lat: point.latitude(),
            lng: point.longitude(),
        }
    }
}

/// Renders as `lat,lng` for query strings
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Longitude-first coordinate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl From<&GeoPoint> for LngLat {
    fn from(point: &GeoPoint) -> Self {
        Self {
            lng: point.longitude(),
            lat: point.latitude(),
        }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lng, self.lat)
    }
}

/// Serializes as the two-element array `[lng, lat]`
impl Serialize for LngLat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.lng)?;
        pair.serialize_element(&self.lat)?;
        pair.end()
    }
}
