//! Application state shared across handlers

use std::sync::Arc;

use application::{GeocodeResolver, RouteResolver, TripService, ports::DatabaseHealthPort};
use infrastructure::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Trip lifecycle operations
    pub trip_service: Arc<TripService>,
    /// Route estimates for the calculate endpoint
    pub route_resolver: Arc<RouteResolver>,
    /// Address lookups
    pub geocoder: Arc<GeocodeResolver>,
    /// Database probe for the readiness endpoint
    pub database_health: Option<Arc<dyn DatabaseHealthPort>>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("route_resolver", &self.route_resolver)
            .field("geocoder", &self.geocoder)
            .field("database_health", &self.database_health.is_some())
            .finish_non_exhaustive()
    }
}
