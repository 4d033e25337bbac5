//! Trip handlers
//!
//! REST API endpoints for publishing trips and driving them through their
//! lifecycle. Every endpoint runs as the caller in the injected
//! [`RequestContext`]; ownership and transition rules live in the service.

use std::str::FromStr;

use application::{NewTrip, RequestContext, TripQuery, TripUpdate};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use domain::{
    DomainError, LocationFix, Trip, TripStatus,
    value_objects::{GeoPoint, Place, TripId, VehicleId},
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    middleware::{ValidatedJson, ValidatedQuery},
    state::AppState,
};

/// Upper bound for a single trip listing
pub const MAX_LIST_LIMIT: u32 = 100;

/// Named location in requests and responses
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Terminal Rodoviário Tietê",
    "latitude": -23.5163,
    "longitude": -46.6250
}))]
pub struct PlaceDto {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: f64,
}

impl PlaceDto {
    fn into_place(self) -> Result<Place, DomainError> {
        Place::new(self.name, GeoPoint::new(self.latitude, self.longitude)?)
    }
}

impl From<&Place> for PlaceDto {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            latitude: place.point.latitude(),
            longitude: place.point.longitude(),
        }
    }
}

/// Trip creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    #[validate(nested)]
    pub origin: PlaceDto,
    #[validate(nested)]
    pub destination: PlaceDto,
    pub departure_at: DateTime<Utc>,
    /// Vehicle to use; the driver's approved vehicle when absent
    pub vehicle_id: Option<Uuid>,
    pub available_seats: Option<u32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub available_capacity_kg: Option<f64>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl CreateTripRequest {
    fn into_new_trip(self) -> Result<NewTrip, DomainError> {
        let mut new_trip = NewTrip::new(
            self.origin.into_place()?,
            self.destination.into_place()?,
            self.departure_at,
        );
        if let Some(vehicle_id) = self.vehicle_id {
            new_trip = new_trip.with_vehicle(VehicleId::from_uuid(vehicle_id));
        }
        new_trip.available_seats = self.available_seats;
        new_trip.available_capacity_kg = self.available_capacity_kg;
        new_trip.notes = self.notes;
        Ok(new_trip)
    }
}

/// Present-but-null becomes `Some(None)`, absent stays `None` via `default`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trip edit request
///
/// Omitted fields are left untouched. `availableSeats`, `availableCapacityKg`
/// and `notes` are cleared by sending `null`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    #[validate(nested)]
    pub origin: Option<PlaceDto>,
    #[validate(nested)]
    pub destination: Option<PlaceDto>,
    pub departure_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u32>)]
    pub available_seats: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub available_capacity_kg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<Option<String>>,
}

impl UpdateTripRequest {
    fn into_update(self) -> Result<TripUpdate, DomainError> {
        Ok(TripUpdate {
            origin: self.origin.map(PlaceDto::into_place).transpose()?,
            destination: self.destination.map(PlaceDto::into_place).transpose()?,
            departure_at: self.departure_at,
            available_seats: self.available_seats,
            available_capacity_kg: self.available_capacity_kg,
            notes: self.notes,
        })
    }
}

/// Driver position report
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub longitude: f64,
    /// When the fix was taken; defaults to now
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Trip listing filters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTripsQuery {
    /// `scheduled`, `active`, `completed` or `cancelled`
    pub status: Option<String>,
    /// Maximum number of results (default 50, capped at 100)
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub limit: Option<u32>,
    /// Only trips departing at or after this time
    pub departing_after: Option<DateTime<Utc>>,
}

impl ListTripsQuery {
    fn into_query(self) -> Result<TripQuery, DomainError> {
        Ok(TripQuery {
            driver_id: None,
            status: parse_status(self.status.as_deref())?,
            departing_after: self.departing_after,
            limit: self.limit.map(|limit| limit.min(MAX_LIST_LIMIT)),
        })
    }
}

/// Filters for the caller's own trips
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MyTripsQuery {
    /// `scheduled`, `active`, `completed` or `cancelled`
    pub status: Option<String>,
}

fn parse_status(status: Option<&str>) -> Result<Option<TripStatus>, DomainError> {
    status.map(TripStatus::from_str).transpose()
}

/// Last reported driver position
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<&LocationFix> for LocationResponse {
    fn from(fix: &LocationFix) -> Self {
        Self {
            latitude: fix.point.latitude(),
            longitude: fix.point.longitude(),
            recorded_at: fix.recorded_at,
        }
    }
}

/// Trip as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub origin: PlaceDto,
    pub destination: PlaceDto,
    pub departure_at: DateTime<Utc>,
    pub estimated_arrival: DateTime<Utc>,
    pub distance_km: f64,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_polyline: Option<String>,
    /// Which backend produced the route estimate
    pub route_source: String,
    pub available_seats: Option<u32>,
    pub available_capacity_kg: Option<f64>,
    pub status: String,
    pub notes: Option<String>,
    pub last_location: Option<LocationResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Trip> for TripResponse {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.to_string(),
            driver_id: trip.driver_id.to_string(),
            vehicle_id: trip.vehicle_id.to_string(),
            origin: PlaceDto::from(&trip.origin),
            destination: PlaceDto::from(&trip.destination),
            departure_at: trip.departure_at,
            estimated_arrival: trip.estimated_arrival,
            distance_km: trip.distance_km,
            duration_minutes: trip.duration_minutes,
            route_polyline: trip.route_polyline.clone(),
            route_source: trip.route_source.to_string(),
            available_seats: trip.available_seats,
            available_capacity_kg: trip.available_capacity_kg,
            status: trip.status.to_string(),
            notes: trip.notes.clone(),
            last_location: trip.last_location.as_ref().map(LocationResponse::from),
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

fn parse_trip_id(id: &str) -> Result<TripId, ApiError> {
    TripId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid trip ID: {e}")))
}

/// Publish a trip
///
/// POST /trips
#[utoipa::path(
    post,
    path = "/trips",
    tag = "trips",
    request_body = CreateTripRequest,
    responses(
        (status = 201, description = "Trip created", body = TripResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a driver", body = crate::error::ErrorResponse),
        (status = 422, description = "No approved vehicle", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx, request))]
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(request): ValidatedJson<CreateTripRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_trip = request.into_new_trip()?;
    let trip = state.trip_service.create(&ctx, new_trip).await?;

    Ok((StatusCode::CREATED, Json(TripResponse::from(&trip))))
}

/// List trips
///
/// GET /trips
#[utoipa::path(
    get,
    path = "/trips",
    tag = "trips",
    params(ListTripsQuery),
    responses(
        (status = 200, description = "Trips, soonest departure first", body = Vec<TripResponse>),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state))]
pub async fn list_trips(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListTripsQuery>,
) -> Result<Json<Vec<TripResponse>>, ApiError> {
    let query = query.into_query()?;
    let trips = state.trip_service.list(&query).await?;

    debug!(count = trips.len(), "Listed trips");
    Ok(Json(trips.iter().map(TripResponse::from).collect()))
}

/// List the caller's own trips
///
/// GET /trips/my-trips
#[utoipa::path(
    get,
    path = "/trips/my-trips",
    tag = "trips",
    params(MyTripsQuery),
    responses(
        (status = 200, description = "Caller's trips", body = Vec<TripResponse>),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx))]
pub async fn my_trips(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    axum::extract::Query(query): axum::extract::Query<MyTripsQuery>,
) -> Result<Json<Vec<TripResponse>>, ApiError> {
    let status = parse_status(query.status.as_deref())?;
    let trips = state.trip_service.list_mine(&ctx, status).await?;

    Ok(Json(trips.iter().map(TripResponse::from).collect()))
}

/// Get a trip by ID
///
/// GET /trips/:id
#[utoipa::path(
    get,
    path = "/trips/{id}",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip details", body = TripResponse),
        (status = 400, description = "Invalid trip ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state))]
pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TripResponse>, ApiError> {
    let trip = state.trip_service.get(&parse_trip_id(&id)?).await?;
    Ok(Json(TripResponse::from(&trip)))
}

/// Edit a scheduled trip
///
/// PUT /trips/:id
#[utoipa::path(
    put,
    path = "/trips/{id}",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    request_body = UpdateTripRequest,
    responses(
        (status = 200, description = "Trip updated", body = TripResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip is no longer scheduled", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx, request))]
pub async fn update_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateTripRequest>,
) -> Result<Json<TripResponse>, ApiError> {
    let id = parse_trip_id(&id)?;
    let update = request.into_update()?;
    let trip = state.trip_service.update(&ctx, &id, update).await?;

    Ok(Json(TripResponse::from(&trip)))
}

/// Start a scheduled trip
///
/// PUT /trips/:id/start
#[utoipa::path(
    put,
    path = "/trips/{id}/start",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip is active", body = TripResponse),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip is not scheduled", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx))]
pub async fn start_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<TripResponse>, ApiError> {
    let trip = state.trip_service.start(&ctx, &parse_trip_id(&id)?).await?;
    Ok(Json(TripResponse::from(&trip)))
}

/// Complete an active trip
///
/// PUT /trips/:id/complete
#[utoipa::path(
    put,
    path = "/trips/{id}/complete",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip is completed", body = TripResponse),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip is not active", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx))]
pub async fn complete_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<TripResponse>, ApiError> {
    let trip = state
        .trip_service
        .complete(&ctx, &parse_trip_id(&id)?)
        .await?;
    Ok(Json(TripResponse::from(&trip)))
}

/// Cancel a scheduled or active trip
///
/// PUT /trips/:id/cancel
#[utoipa::path(
    put,
    path = "/trips/{id}/cancel",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    responses(
        (status = 200, description = "Trip is cancelled", body = TripResponse),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip already finished", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx))]
pub async fn cancel_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<TripResponse>, ApiError> {
    let trip = state
        .trip_service
        .cancel(&ctx, &parse_trip_id(&id)?)
        .await?;
    Ok(Json(TripResponse::from(&trip)))
}

/// Report the driver's position on an active trip
///
/// PUT /trips/:id/location
#[utoipa::path(
    put,
    path = "/trips/{id}/location",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Position recorded", body = TripResponse),
        (status = 400, description = "Invalid coordinates", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip is not active", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx, request))]
pub async fn update_location(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateLocationRequest>,
) -> Result<Json<TripResponse>, ApiError> {
    let id = parse_trip_id(&id)?;
    let point = GeoPoint::new(request.latitude, request.longitude)?;
    let trip = state
        .trip_service
        .update_location(&ctx, &id, point, request.recorded_at)
        .await?;

    Ok(Json(TripResponse::from(&trip)))
}

/// Delete a trip that is not active
///
/// DELETE /trips/:id
#[utoipa::path(
    delete,
    path = "/trips/{id}",
    tag = "trips",
    params(("id" = String, Path, description = "Trip ID")),
    responses(
        (status = 204, description = "Trip deleted"),
        (status = 403, description = "Not the trip's driver", body = crate::error::ErrorResponse),
        (status = 404, description = "Trip not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Trip is active", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = []))
)]
#[instrument(skip(state, ctx))]
pub async fn delete_trip(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .trip_service
        .delete(&ctx, &parse_trip_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_json(name: &str, lat: f64) -> serde_json::Value {
        serde_json::json!({"name": name, "latitude": lat, "longitude": -46.6333})
    }

    #[test]
    fn update_distinguishes_absent_from_null() {
        let req: UpdateTripRequest =
            serde_json::from_str(r#"{"notes":null,"availableSeats":3}"#).unwrap();
        assert_eq!(req.notes, Some(None));
        assert_eq!(req.available_seats, Some(Some(3)));
        assert_eq!(req.available_capacity_kg, None);
        assert!(req.origin.is_none());

        let update = req.into_update().unwrap();
        assert_eq!(update.notes, Some(None));
        assert!(update.departure_at.is_none());
    }

    #[test]
    fn empty_update_body_changes_nothing() {
        let req: UpdateTripRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.into_update().unwrap(), TripUpdate::default());
    }

    #[test]
    fn create_request_validates_nested_places() {
        let body = serde_json::json!({
            "origin": place_json("São Paulo", -23.5505),
            "destination": place_json("Nowhere", -95.0),
            "departureAt": "2026-03-01T08:00:00Z"
        });
        let req: CreateTripRequest = serde_json::from_value(body).unwrap();
        let err = req.validate().unwrap_err().to_string();
        assert!(err.contains("destination"));
    }

    #[test]
    fn create_request_rejects_negative_capacity() {
        let body = serde_json::json!({
            "origin": place_json("São Paulo", -23.5505),
            "destination": place_json("Rio de Janeiro", -22.9068),
            "departureAt": "2026-03-01T08:00:00Z",
            "availableCapacityKg": -1.0
        });
        let req: CreateTripRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_maps_vehicle_and_extras() {
        let vehicle = Uuid::new_v4();
        let body = serde_json::json!({
            "origin": place_json("São Paulo", -23.5505),
            "destination": place_json("Rio de Janeiro", -22.9068),
            "departureAt": "2026-03-01T08:00:00Z",
            "vehicleId": vehicle,
            "availableSeats": 2,
            "notes": "Sem fumantes"
        });
        let req: CreateTripRequest = serde_json::from_value(body).unwrap();
        let new_trip = req.into_new_trip().unwrap();

        assert_eq!(new_trip.vehicle_id, Some(VehicleId::from_uuid(vehicle)));
        assert_eq!(new_trip.available_seats, Some(2));
        assert_eq!(new_trip.notes.as_deref(), Some("Sem fumantes"));
        assert_eq!(new_trip.origin.name, "São Paulo");
    }

    #[test]
    fn blank_place_name_is_a_domain_error() {
        let dto = PlaceDto {
            name: "   ".to_string(),
            latitude: -23.5505,
            longitude: -46.6333,
        };
        assert!(dto.into_place().is_err());
    }

    #[test]
    fn list_query_clamps_limit_and_parses_status() {
        let query = ListTripsQuery {
            status: Some("Active".to_string()),
            limit: Some(500),
            departing_after: None,
        }
        .into_query()
        .unwrap();

        assert_eq!(query.status, Some(TripStatus::Active));
        assert_eq!(query.limit, Some(MAX_LIST_LIMIT));
        assert!(query.driver_id.is_none());
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = ListTripsQuery {
            status: Some("paused".to_string()),
            ..Default::default()
        };
        assert!(query.into_query().is_err());
    }

    #[test]
    fn trip_id_must_be_uuid() {
        assert!(matches!(
            parse_trip_id("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(parse_trip_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
