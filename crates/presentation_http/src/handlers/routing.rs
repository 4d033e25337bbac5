//! Route estimate and geocoding handlers
//!
//! Stateless lookups: nothing here touches stored trips.

use application::navigation_links::{google_maps_url, waze_url};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use domain::{RouteEstimate, value_objects::GeoPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::ApiError,
    middleware::{ValidatedJson, ValidatedQuery},
    state::AppState,
};

/// Route calculation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "originLat": -23.5505,
    "originLng": -46.6333,
    "destLat": -22.9068,
    "destLng": -43.1729
}))]
pub struct CalculateRouteRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub origin_lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub origin_lng: f64,
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub dest_lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub dest_lng: f64,
    /// Planned departure (ISO 8601); defaults to now
    pub departure_at: Option<DateTime<Utc>>,
}

/// Route estimate with navigation links
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimateResponse {
    /// Road distance in kilometres
    pub distance_km: f64,
    /// Travel time in whole minutes
    pub duration_minutes: u32,
    pub estimated_arrival: DateTime<Utc>,
    /// Encoded route geometry, when the provider returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
    /// `primary_directions`, `secondary_directions` or `haversine`
    pub source: String,
    /// Waze navigation to the destination
    pub waze_url: String,
    /// Google Maps directions from origin to destination
    pub google_maps_url: String,
}

impl RouteEstimateResponse {
    fn new(estimate: RouteEstimate, origin: &GeoPoint, destination: &GeoPoint) -> Self {
        Self {
            distance_km: estimate.distance_km,
            duration_minutes: estimate.duration_minutes,
            estimated_arrival: estimate.estimated_arrival,
            polyline: estimate.polyline,
            source: estimate.source.to_string(),
            waze_url: waze_url(destination),
            google_maps_url: google_maps_url(origin, destination),
        }
    }
}

/// Forward geocoding query
#[derive(Debug, Deserialize, Validate, IntoParams, ToSchema)]
pub struct GeocodeQuery {
    /// Free-form address
    #[validate(length(min = 1, max = 512, message = "must be 1-512 characters"))]
    pub address: String,
}

/// Forward geocoding result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Reverse geocoding query
#[derive(Debug, Deserialize, Validate, IntoParams, ToSchema)]
pub struct ReverseGeocodeQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub lng: f64,
}

/// Reverse geocoding result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReverseGeocodeResponse {
    pub address: String,
}

/// Estimate distance, duration and arrival between two points
///
/// POST /routes/calculate
#[utoipa::path(
    post,
    path = "/routes/calculate",
    tag = "routes",
    request_body = CalculateRouteRequest,
    responses(
        (status = 200, description = "Route estimate", body = RouteEstimateResponse),
        (status = 400, description = "Invalid coordinates", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, request))]
pub async fn calculate_route(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CalculateRouteRequest>,
) -> Result<Json<RouteEstimateResponse>, ApiError> {
    let origin = GeoPoint::new(request.origin_lat, request.origin_lng)?;
    let destination = GeoPoint::new(request.dest_lat, request.dest_lng)?;
    let departure_at = request.departure_at.unwrap_or_else(Utc::now);

    let estimate = state
        .route_resolver
        .resolve(&origin, &destination, departure_at)
        .await;

    debug!(
        distance_km = estimate.distance_km,
        source = %estimate.source,
        "Route calculated"
    );
    Ok(Json(RouteEstimateResponse::new(
        estimate,
        &origin,
        &destination,
    )))
}

/// Resolve an address to coordinates
///
/// GET /routes/geocode?address=
#[utoipa::path(
    get,
    path = "/routes/geocode",
    tag = "routes",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Best match", body = GeocodeResponse),
        (status = 400, description = "Missing or oversized address", body = crate::error::ErrorResponse),
        (status = 404, description = "No match", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, query))]
pub async fn geocode(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    if query.address.trim().is_empty() {
        return Err(ApiError::BadRequest("address must not be blank".to_string()));
    }

    let hit = state
        .geocoder
        .geocode(&query.address)
        .await
        .ok_or_else(|| ApiError::NotFound("Address not found".to_string()))?;

    Ok(Json(GeocodeResponse {
        latitude: hit.latitude,
        longitude: hit.longitude,
        display_name: hit.display_name,
    }))
}

/// Resolve coordinates to a display address
///
/// GET /routes/reverse-geocode?lat=&lng=
#[utoipa::path(
    get,
    path = "/routes/reverse-geocode",
    tag = "routes",
    params(ReverseGeocodeQuery),
    responses(
        (status = 200, description = "Display address", body = ReverseGeocodeResponse),
        (status = 400, description = "Invalid coordinates", body = crate::error::ErrorResponse),
        (status = 404, description = "No address for these coordinates", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state))]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ReverseGeocodeQuery>,
) -> Result<Json<ReverseGeocodeResponse>, ApiError> {
    let point = GeoPoint::new(query.lat, query.lng)?;

    let address = state
        .geocoder
        .reverse_geocode(&point)
        .await
        .ok_or_else(|| ApiError::NotFound("Address not found".to_string()))?;

    Ok(Json(ReverseGeocodeResponse { address }))
}
