//! Adapters - Implementations of application ports

mod api_key_hasher;
mod geocoding_adapter;
mod route_provider_adapter;

pub use api_key_hasher::{ApiKeyHashError, ApiKeyHasher};
pub use geocoding_adapter::{NominatimGeocodingAdapter, build_geocode_resolver};
pub use route_provider_adapter::{
    GoogleRouteProvider, OpenRouteServiceRouteProvider, build_route_resolver,
};
