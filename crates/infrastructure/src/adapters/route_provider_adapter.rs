//! Route provider adapters - Implement `RouteProvider` using integration_routing

use std::{sync::Arc, time::Duration};

use application::{
    RouteResolver,
    ports::{ProviderError, RouteProvider},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::value_objects::{GeoPoint, RouteEstimate, RouteSource};
use integration_routing::{
    DirectionsRoute, GoogleDirectionsClient, GoogleDirectionsConfig, LatLng, LngLat,
    OpenRouteServiceClient, OpenRouteServiceConfig, RoutingError,
};
use tracing::{info, instrument};

use crate::config::RoutingAppConfig;

/// Classify an integration failure for the resolver's logs
fn to_provider_error(err: RoutingError) -> ProviderError {
    match err {
        RoutingError::Timeout { .. } => ProviderError::Timeout,
        RoutingError::ConnectionFailed(_)
        | RoutingError::RequestFailed(_)
        | RoutingError::RateLimitExceeded { .. } => ProviderError::Unavailable(err.to_string()),
        RoutingError::Denied(_) | RoutingError::ConfigurationError(_) => {
            ProviderError::Refused(err.to_string())
        },
        RoutingError::ParseError(msg) => ProviderError::InvalidResponse(msg),
        RoutingError::NoRouteFound { .. } | RoutingError::LocationNotFound(_) => {
            ProviderError::NoRoute
        },
    }
}

fn to_estimate(
    route: DirectionsRoute,
    departure_at: DateTime<Utc>,
    source: RouteSource,
) -> RouteEstimate {
    let estimate = RouteEstimate::from_meters_and_seconds(
        route.distance_meters,
        route.best_duration_seconds(),
        departure_at,
        source,
    );
    match route.polyline {
        Some(polyline) => estimate.with_polyline(polyline),
        None => estimate,
    }
}

/// Primary provider backed by the Google Directions API
///
/// Uses the traffic-aware duration when the API returns one.
pub struct GoogleRouteProvider {
    client: GoogleDirectionsClient,
}

impl std::fmt::Debug for GoogleRouteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleRouteProvider").finish_non_exhaustive()
    }
}

impl GoogleRouteProvider {
    /// Create a provider from client configuration
    pub fn new(config: &GoogleDirectionsConfig) -> Result<Self, RoutingError> {
        Ok(Self {
            client: GoogleDirectionsClient::new(config)?,
        })
    }
}

#[async_trait]
impl RouteProvider for GoogleRouteProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn source(&self) -> RouteSource {
        RouteSource::PrimaryDirections
    }

    #[instrument(skip(self))]
    async fn route(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> Result<RouteEstimate, ProviderError> {
        let route = self
            .client
            .directions(LatLng::from(origin), LatLng::from(destination), departure_at)
            .await
            .map_err(to_provider_error)?;
        Ok(to_estimate(route, departure_at, self.source()))
    }
}

/// Secondary provider backed by OpenRouteService
pub struct OpenRouteServiceRouteProvider {
    client: OpenRouteServiceClient,
}

impl std::fmt::Debug for OpenRouteServiceRouteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouteServiceRouteProvider")
            .finish_non_exhaustive()
    }
}

impl OpenRouteServiceRouteProvider {
    /// Create a provider from client configuration
    pub fn new(config: &OpenRouteServiceConfig) -> Result<Self, RoutingError> {
        Ok(Self {
            client: OpenRouteServiceClient::new(config)?,
        })
    }
}

#[async_trait]
impl RouteProvider for OpenRouteServiceRouteProvider {
    fn name(&self) -> &'static str {
        "openrouteservice"
    }

    fn source(&self) -> RouteSource {
        RouteSource::SecondaryDirections
    }

    #[instrument(skip(self))]
    async fn route(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> Result<RouteEstimate, ProviderError> {
        let route = self
            .client
            .directions(LngLat::from(origin), LngLat::from(destination))
            .await
            .map_err(to_provider_error)?;
        Ok(to_estimate(route, departure_at, self.source()))
    }
}

/// Build the resolver's provider chain from configuration
///
/// Google first, OpenRouteService second, each only when its key is set.
/// With neither configured every estimate comes from the great-circle fallback.
pub fn build_route_resolver(config: &RoutingAppConfig) -> Result<RouteResolver, RoutingError> {
    let mut providers: Vec<Arc<dyn RouteProvider>> = Vec::new();

    if let Some(google) = config.enabled_google() {
        providers.push(Arc::new(GoogleRouteProvider::new(
            &google.to_client_config(),
        )?));
    }
    if let Some(ors) = config.enabled_openrouteservice() {
        providers.push(Arc::new(OpenRouteServiceRouteProvider::new(
            &ors.to_client_config(),
        )?));
    }

    let resolver = RouteResolver::new(providers)
        .with_attempt_timeout(Duration::from_secs(config.attempt_timeout_secs));
    info!(providers = ?resolver.provider_names(), "Route resolver configured");
    Ok(resolver)
}
