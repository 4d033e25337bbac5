//! Directions and geocoding data models

use serde::{Deserialize, Serialize};

/// A route as reported by a directions provider, in provider units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    /// Road distance in metres
    pub distance_meters: f64,
    /// Static travel time in seconds
    pub duration_seconds: f64,
    /// Traffic-aware travel time in seconds, when the provider has one
    pub duration_in_traffic_seconds: Option<f64>,
    /// Encoded polyline of the route geometry
    pub polyline: Option<String>,
}

impl DirectionsRoute {
    /// Traffic-aware duration if present, else the static one
    #[must_use]
    pub fn best_duration_seconds(&self) -> f64 {
        self.duration_in_traffic_seconds
            .unwrap_or(self.duration_seconds)
    }
}

/// A geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

// ---- Google Directions wire format ----

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleDirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleRoute {
    #[serde(default)]
    pub legs: Vec<GoogleLeg>,
    #[serde(default)]
    pub overview_polyline: Option<GooglePolyline>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleLeg {
    pub distance: GoogleValue,
    pub duration: GoogleValue,
    #[serde(default)]
    pub duration_in_traffic: Option<GoogleValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleValue {
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GooglePolyline {
    pub points: String,
}

// ---- OpenRouteService wire format ----

#[derive(Debug, Deserialize)]
pub(crate) struct OrsDirectionsResponse {
    #[serde(default)]
    pub routes: Vec<OrsRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrsRoute {
    pub summary: OrsSummary,
    #[serde(default)]
    pub geometry: Option<String>,
}

/// ORS omits zero-valued fields for trivial routes
#[derive(Debug, Deserialize)]
pub(crate) struct OrsSummary {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrsErrorResponse {
    pub error: OrsError,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrsError {
    Detailed { code: Option<i64>, message: String },
    Plain(String),
}

impl OrsError {
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Detailed { code, .. } => *code,
            Self::Plain(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Detailed { message, .. } | Self::Plain(message) => message,
        }
    }
}

// ---- Nominatim wire format ----

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimReverse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
