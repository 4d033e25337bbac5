//! Route definitions

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    handlers,
    middleware::{ApiKeyAuthLayer, RequestIdLayer, SecurityHeadersLayer},
    openapi::create_openapi_routes,
    state::AppState,
};

/// Create the main router with all routes
///
/// Authentication follows `state.config.security.api_keys`; documentation
/// routes are public and skip the API security headers.
pub fn create_router(state: AppState) -> Router {
    let auth_layer = ApiKeyAuthLayer::from_api_keys(state.config.security.api_keys.clone());

    Router::new()
        .merge(api_routes().layer(SecurityHeadersLayer::new()))
        .merge(create_openapi_routes())
        // Last layer runs first: the request ID must exist before auth reads it
        .layer(auth_layer)
        .layer(RequestIdLayer::new())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Route estimates and geocoding
        .route("/routes/calculate", post(handlers::routing::calculate_route))
        .route("/routes/geocode", get(handlers::routing::geocode))
        .route(
            "/routes/reverse-geocode",
            get(handlers::routing::reverse_geocode),
        )
        // Trips
        .route(
            "/trips",
            get(handlers::trips::list_trips).post(handlers::trips::create_trip),
        )
        .route("/trips/my-trips", get(handlers::trips::my_trips))
        .route(
            "/trips/{id}",
            get(handlers::trips::get_trip)
                .put(handlers::trips::update_trip)
                .delete(handlers::trips::delete_trip),
        )
        .route("/trips/{id}/start", put(handlers::trips::start_trip))
        .route("/trips/{id}/complete", put(handlers::trips::complete_trip))
        .route("/trips/{id}/cancel", put(handlers::trips::cancel_trip))
        .route("/trips/{id}/location", put(handlers::trips::update_location))
}
