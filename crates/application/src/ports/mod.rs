//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod database_health_port;
mod geocoding_port;
mod route_provider;
mod trip_store;
mod vehicle_registry;

#[cfg(test)]
pub use database_health_port::MockDatabaseHealthPort;
pub use database_health_port::{DatabaseHealth, DatabaseHealthPort};
#[cfg(test)]
pub use geocoding_port::MockGeocodingPort;
pub use geocoding_port::{GeocodeResult, GeocodingPort};
#[cfg(test)]
pub use route_provider::MockRouteProvider;
pub use route_provider::{ProviderError, RouteProvider};
#[cfg(test)]
pub use trip_store::MockTripStore;
pub use trip_store::{DEFAULT_TRIP_LIMIT, TripQuery, TripStore};
#[cfg(test)]
pub use vehicle_registry::MockVehicleRegistry;
pub use vehicle_registry::VehicleRegistry;
