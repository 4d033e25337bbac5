//! Geocoding port
//!
//! Address-to-coordinate and coordinate-to-address lookups against a single
//! external provider.

use async_trait::async_trait;
use domain::{DomainError, value_objects::GeoPoint};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A forward geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    /// Provider's full label for the match
    pub display_name: String,
}

impl GeocodeResult {
    /// The hit as a validated point
    pub fn point(&self) -> Result<GeoPoint, DomainError> {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Port for geocoding lookups
///
/// `Ok(None)` means the provider answered but found nothing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Resolve a free-form address to coordinates
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, ApplicationError>;

    /// Resolve coordinates to a display address
    async fn reverse_geocode(&self, point: &GeoPoint) -> Result<Option<String>, ApplicationError>;
}
