//! Geocoding adapter - Implements `GeocodingPort` using integration_routing

use std::sync::Arc;

use application::{
    GeocodeResolver,
    error::ApplicationError,
    ports::{GeocodeResult, GeocodingPort},
};
use async_trait::async_trait;
use domain::value_objects::GeoPoint;
use integration_routing::{
    GeocodingClient, LatLng, NominatimConfig, NominatimGeocodingClient, RoutingError,
};
use tracing::{info, instrument};

use crate::config::GeocodingAppConfig;

/// Adapter for address lookups backed by Nominatim
pub struct NominatimGeocodingAdapter {
    client: Arc<dyn GeocodingClient>,
}

impl std::fmt::Debug for NominatimGeocodingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocodingAdapter")
            .field("client", &"NominatimGeocodingClient")
            .finish()
    }
}

impl NominatimGeocodingAdapter {
    /// Create an adapter from Nominatim configuration
    pub fn new(config: &NominatimConfig) -> Result<Self, RoutingError> {
        Ok(Self::with_client(Arc::new(NominatimGeocodingClient::new(
            config,
        )?)))
    }

    /// Wrap an existing geocoding client
    #[must_use]
    pub fn with_client(client: Arc<dyn GeocodingClient>) -> Self {
        Self { client }
    }
}

/// "Nothing matched" is an answer, everything else is a provider failure
fn map_lookup<T>(result: Result<T, RoutingError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RoutingError::LocationNotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::ExternalService(format!(
            "Geocoding failed: {e}"
        ))),
    }
}

#[async_trait]
impl GeocodingPort for NominatimGeocodingAdapter {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, ApplicationError> {
        let place = map_lookup(self.client.geocode(address).await)?;
        Ok(place.map(|p| GeocodeResult {
            latitude: p.latitude,
            longitude: p.longitude,
            display_name: p.display_name,
        }))
    }

    #[instrument(skip(self), fields(point = %point))]
    async fn reverse_geocode(&self, point: &GeoPoint) -> Result<Option<String>, ApplicationError> {
        map_lookup(self.client.reverse_geocode(LatLng::from(point)).await)
    }
}

/// Build the geocode resolver from configuration
///
/// A disabled resolver answers every lookup with "not found".
pub fn build_geocode_resolver(config: &GeocodingAppConfig) -> Result<GeocodeResolver, RoutingError> {
    if !config.enabled {
        info!("Geocoding disabled");
        return Ok(GeocodeResolver::disabled());
    }
    let adapter = NominatimGeocodingAdapter::new(&config.nominatim)?;
    Ok(GeocodeResolver::new(Arc::new(adapter)))
}
