//! Forward and reverse geocoding with absence instead of errors

use std::sync::Arc;

use domain::value_objects::GeoPoint;
use tracing::{debug, instrument, warn};

use crate::ports::{GeocodeResult, GeocodingPort};

/// Geocoding facade over a single provider
///
/// Provider failures are logged and reported as "nothing found"; geocoding is
/// not on the trip-creation path.
pub struct GeocodeResolver {
    provider: Option<Arc<dyn GeocodingPort>>,
}

impl std::fmt::Debug for GeocodeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeResolver")
            .field("configured", &self.provider.is_some())
            .finish()
    }
}

impl GeocodeResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodingPort>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A resolver that always reports absence
    #[must_use]
    pub const fn disabled() -> Self {
        Self { provider: None }
    }

    /// Look up an address
    #[instrument(skip(self))]
    pub async fn geocode(&self, address: &str) -> Option<GeocodeResult> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        let provider = self.provider.as_ref()?;

        match provider.geocode(address).await {
            Ok(Some(hit)) if hit.point().is_ok() => Some(hit),
            Ok(Some(hit)) => {
                warn!(
                    latitude = hit.latitude,
                    longitude = hit.longitude,
                    "Geocoder returned out-of-range coordinates"
                );
                None
            },
            Ok(None) => {
                debug!("No geocoding match");
                None
            },
            Err(e) => {
                warn!(error = %e, "Geocoding failed");
                None
            },
        }
    }

    /// Look up the display address of a point
    #[instrument(skip(self), fields(point = %point))]
    pub async fn reverse_geocode(&self, point: &GeoPoint) -> Option<String> {
        let provider = self.provider.as_ref()?;

        match provider.reverse_geocode(point).await {
            Ok(Some(address)) if !address.trim().is_empty() => Some(address),
            Ok(_) => {
                debug!("No reverse geocoding match");
                None
            },
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                None
            },
        }
    }
}
