//! Geographic point value object

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// A geographic point with latitude and longitude in degrees
///
/// Always embedded in another record (trip origin, last known location,
/// geocoding result); never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    longitude: f64,
}

/// Unvalidated wire shape, checked on deserialization
#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = DomainError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a new point with validation
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoordinates` if latitude is not in
    /// [-90, 90], longitude is not in [-180, 180], or either is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinates(format!(
                "latitude must be -90 to 90, longitude must be -180 to 180 (got {latitude}, {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create a point without validation (for trusted constants)
    ///
    /// Caller must ensure latitude is in [-90, 90] and longitude in [-180, 180].
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Well-known points used in tests and examples
impl GeoPoint {
    /// São Paulo, Brazil
    #[must_use]
    pub const fn sao_paulo() -> Self {
        Self::new_unchecked(-23.5505, -46.6333)
    }

    /// Rio de Janeiro, Brazil
    #[must_use]
    pub const fn rio_de_janeiro() -> Self {
        Self::new_unchecked(-22.9068, -43.1729)
    }

    /// Curitiba, Brazil
    #[must_use]
    pub const fn curitiba() -> Self {
        Self::new_unchecked(-25.4284, -49.2733)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        let point = GeoPoint::new(-23.5505, -46.6333).expect("valid coordinates");
        assert!((point.latitude() + 23.5505).abs() < f64::EPSILON);
        assert!((point.longitude() + 46.6333).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boundary_coordinates() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(GeoPoint::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn test_invalid_longitude() {
        assert!(GeoPoint::new(0.0, 181.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_nan_rejected() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_display() {
        let point = GeoPoint::sao_paulo();
        let display = format!("{point}");
        assert!(display.contains("-23.5505"));
        assert!(display.contains("-46.6333"));
    }

    #[test]
    fn test_deserialization_validates_range() {
        let ok: Result<GeoPoint, _> =
            serde_json::from_str(r#"{"latitude": -22.9068, "longitude": -43.1729}"#);
        assert_eq!(ok.unwrap(), GeoPoint::rio_de_janeiro());

        let bad: Result<GeoPoint, _> =
            serde_json::from_str(r#"{"latitude": 123.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialization() {
        let point = GeoPoint::curitiba();
        let json = serde_json::to_string(&point).expect("serialize");
        assert!(json.contains("\"latitude\":-25.4284"));
        assert!(json.contains("\"longitude\":-49.2733"));
    }
}
