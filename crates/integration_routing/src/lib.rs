//! Directions and geocoding clients for Cargolink
//!
//! - [`GoogleDirectionsClient`]: credentialed directions with traffic-aware
//!   durations; takes [`LatLng`].
//! - [`OpenRouteServiceClient`]: free-tier directions; takes [`LngLat`].
//! - [`NominatimGeocodingClient`]: forward and reverse geocoding with request
//!   spacing and a forward-lookup cache.
//!
//! Clients report raw provider units ([`DirectionsRoute`] in metres and
//! seconds); conversion to route estimates happens in the adapters.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_routing::{LngLat, OpenRouteServiceClient, OpenRouteServiceConfig};
//!
//! let client = OpenRouteServiceClient::new(&OpenRouteServiceConfig::new(key))?;
//! let route = client
//!     .directions(LngLat { lng: -46.6333, lat: -23.5505 }, LngLat { lng: -43.1729, lat: -22.9068 })
//!     .await?;
//! ```

mod config;
mod coords;
mod error;
mod geocoding;
mod google;
mod models;
mod openrouteservice;

pub use config::{DEFAULT_USER_AGENT, GoogleDirectionsConfig, NominatimConfig, OpenRouteServiceConfig};
pub use coords::{LatLng, LngLat};
pub use error::RoutingError;
pub use geocoding::{GeocodingClient, NominatimGeocodingClient};
pub use google::GoogleDirectionsClient;
pub use models::{DirectionsRoute, GeocodedPlace};
pub use openrouteservice::OpenRouteServiceClient;
