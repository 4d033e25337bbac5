//! Cargolink HTTP presentation layer
//!
//! This crate provides the HTTP API: route estimates, geocoding and the trip
//! lifecycle, behind API key authentication.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::{ApiError, set_expose_internal_errors};
pub use middleware::{
    ANONYMOUS_USER_ID, ApiKeyAuthLayer, RequestIdLayer, SecurityHeadersLayer, ValidatedJson,
    ValidatedQuery, ValidationError,
};
pub use routes::create_router;
pub use state::AppState;
