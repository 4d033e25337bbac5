//! OpenAPI documentation module
//!
//! Provides OpenAPI 3.0 documentation for the Cargolink HTTP API.
//! Includes Swagger UI and ReDoc for interactive API exploration.

// Allow clippy warnings from macro-generated code in utoipa derive
#![allow(clippy::needless_for_each)]

use axum::{Router, response::Html, routing::get};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::{handlers, state::AppState};

/// Path the OpenAPI document is served under
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI documentation for Cargolink
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cargolink API",
        version = "0.1.0",
        description = "Trip publishing, route estimates and geocoding for a drivers and shippers marketplace",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health check and readiness endpoints"),
        (name = "routes", description = "Route estimates and address lookups"),
        (name = "trips", description = "Trip publishing and lifecycle")
    ),
    paths(
        // Health endpoints
        handlers::health::health_check,
        handlers::health::readiness_check,
        // Route endpoints
        handlers::routing::calculate_route,
        handlers::routing::geocode,
        handlers::routing::reverse_geocode,
        // Trip endpoints
        handlers::trips::create_trip,
        handlers::trips::list_trips,
        handlers::trips::my_trips,
        handlers::trips::get_trip,
        handlers::trips::update_trip,
        handlers::trips::start_trip,
        handlers::trips::complete_trip,
        handlers::trips::cancel_trip,
        handlers::trips::update_location,
        handlers::trips::delete_trip,
    ),
    components(
        schemas(
            // Health schemas
            handlers::health::HealthResponse,
            handlers::health::ReadinessResponse,
            handlers::health::DatabaseStatus,
            // Route schemas
            handlers::routing::CalculateRouteRequest,
            handlers::routing::RouteEstimateResponse,
            handlers::routing::GeocodeResponse,
            handlers::routing::ReverseGeocodeResponse,
            // Trip schemas
            handlers::trips::PlaceDto,
            handlers::trips::CreateTripRequest,
            handlers::trips::UpdateTripRequest,
            handlers::trips::UpdateLocationRequest,
            handlers::trips::LocationResponse,
            handlers::trips::TripResponse,
            // Error schemas
            crate::error::ErrorResponse,
        )
    ),
    security(
        ("api_key" = [])
    ),
    modifiers(&SecurityAddon)
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("API key sent as `Authorization: Bearer <key>`"))
                        .build(),
                ),
            );
        }
    }
}

/// Create OpenAPI documentation routes
///
/// Adds the following routes:
/// - `/api-docs/openapi.json` - OpenAPI document (used by Swagger UI)
/// - `/swagger-ui/*` - Swagger UI interactive documentation
/// - `/redoc` - ReDoc documentation
pub fn create_openapi_routes() -> Router<AppState> {
    let redoc = Redoc::with_url(OPENAPI_JSON_PATH, ApiDoc::openapi());
    let redoc_html = redoc.to_html();

    Router::new()
        .route("/redoc", get(|| async move { Html(redoc_html) }))
        // SwaggerUi also serves the JSON document
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_is_valid() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&doc).expect("Failed to serialize OpenAPI document");
        assert!(json.contains("Cargolink API"));
        assert!(json.contains("/health"));
        assert!(json.contains("/routes/calculate"));
        assert!(json.contains("/trips/{id}/location"));
    }

    #[test]
    fn openapi_has_all_tags() {
        let doc = ApiDoc::openapi();
        let tags: Vec<&str> = doc
            .tags
            .as_ref()
            .map(|t| t.iter().map(|tag| tag.name.as_str()).collect())
            .unwrap_or_default();

        assert_eq!(tags, ["health", "routes", "trips"]);
    }

    #[test]
    fn openapi_has_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("Missing components");

        assert!(components.security_schemes.contains_key("api_key"));
    }

    #[test]
    fn update_request_documents_clearable_fields() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let props = &json["components"]["schemas"]["UpdateTripRequest"]["properties"];

        assert!(props.get("availableSeats").is_some());
        assert!(props.get("notes").is_some());
    }
}
