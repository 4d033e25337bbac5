//! Trip Service - Creation, mutation and guarded transitions of trips
//!
//! Every mutation loads the trip, checks ownership before status, applies the
//! change in memory, then writes it back conditionally on the status it was
//! loaded with. Edits rewrite the whole row; status transitions and location
//! fixes write only their own columns, so they never undo an edit committed
//! after the load. A write that loses a race against another transition is
//! reported as an invalid transition from whatever status won.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{
    entities::{Trip, TripOperation, TripStatus},
    value_objects::{GeoPoint, Place, TripId, VehicleId},
};
use tracing::{debug, error, info, instrument, warn};

use super::{RouteResolver, VehicleAssigner};
use crate::{
    error::ApplicationError,
    ports::{TripQuery, TripStore},
    request_context::RequestContext,
};

/// Data for publishing a new trip
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub origin: Place,
    pub destination: Place,
    pub departure_at: DateTime<Utc>,
    /// Vehicle to use; assigned from the registry when absent
    pub vehicle_id: Option<VehicleId>,
    pub available_seats: Option<u32>,
    pub available_capacity_kg: Option<f64>,
    pub notes: Option<String>,
}

impl NewTrip {
    #[must_use]
    pub const fn new(origin: Place, destination: Place, departure_at: DateTime<Utc>) -> Self {
        Self {
            origin,
            destination,
            departure_at,
            vehicle_id: None,
            available_seats: None,
            available_capacity_kg: None,
            notes: None,
        }
    }

    #[must_use]
    pub const fn with_vehicle(mut self, vehicle_id: VehicleId) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }
}

/// Changes to a scheduled trip
///
/// `None` leaves a field untouched. Clearable fields use `Some(None)` to
/// clear the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripUpdate {
    pub origin: Option<Place>,
    pub destination: Option<Place>,
    pub departure_at: Option<DateTime<Utc>>,
    pub available_seats: Option<Option<u32>>,
    pub available_capacity_kg: Option<Option<f64>>,
    pub notes: Option<Option<String>>,
}

/// Service owning the trip lifecycle
pub struct TripService {
    store: Arc<dyn TripStore>,
    routes: Arc<RouteResolver>,
    vehicles: Arc<VehicleAssigner>,
}

impl std::fmt::Debug for TripService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripService")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl TripService {
    /// Create a new trip service
    #[must_use]
    pub fn new(
        store: Arc<dyn TripStore>,
        routes: Arc<RouteResolver>,
        vehicles: Arc<VehicleAssigner>,
    ) -> Self {
        Self {
            store,
            routes,
            vehicles,
        }
    }

    /// Publish a new trip
    ///
    /// Resolves the route, then the vehicle: the driver's approved one when
    /// none was given, otherwise the given one if it is theirs. Writes
    /// the trip last so a failure leaves nothing behind. Unexpected failures
    /// are reported as a generic creation error.
    #[instrument(skip(self, ctx, new_trip), fields(user_id = %ctx.user_id()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        new_trip: NewTrip,
    ) -> Result<Trip, ApplicationError> {
        match self.create_inner(ctx, new_trip).await {
            Ok(trip) => Ok(trip),
            Err(e) if e.is_actionable() => Err(e),
            Err(e) => {
                error!(error = %e, "Trip creation failed");
                Err(ApplicationError::Internal("Failed to create trip".to_string()))
            },
        }
    }

    async fn create_inner(
        &self,
        ctx: &RequestContext,
        new_trip: NewTrip,
    ) -> Result<Trip, ApplicationError> {
        if !ctx.is_driver() {
            return Err(ApplicationError::NotAuthorized(
                "Only drivers can publish trips".to_string(),
            ));
        }
        Trip::validate_capacity_kg(new_trip.available_capacity_kg)?;

        let driver_id = ctx.user_id();
        let route = self
            .routes
            .resolve(
                &new_trip.origin.point,
                &new_trip.destination.point,
                new_trip.departure_at,
            )
            .await;

        let vehicle_id = match new_trip.vehicle_id {
            Some(id) => self.vehicles.confirm_owned(&driver_id, &id).await?,
            None => self.vehicles.assign(&driver_id).await?,
        };

        let trip = Trip::new(
            driver_id,
            vehicle_id,
            new_trip.origin,
            new_trip.destination,
            new_trip.departure_at,
            route,
        )
        .with_available_seats(new_trip.available_seats)
        .with_available_capacity_kg(new_trip.available_capacity_kg)
        .with_notes(new_trip.notes);

        self.store.insert(&trip).await?;

        info!(
            trip_id = %trip.id,
            vehicle_id = %trip.vehicle_id,
            distance_km = trip.distance_km,
            source = %trip.route_source,
            "Trip created"
        );
        Ok(trip)
    }

    /// Edit a scheduled trip
    ///
    /// The route is re-resolved only when origin, destination or departure
    /// actually change; otherwise the stored estimate is kept as is.
    #[instrument(skip(self, ctx, update), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &TripId,
        update: TripUpdate,
    ) -> Result<Trip, ApplicationError> {
        let mut trip = self.load_guarded(ctx, id, TripOperation::Update).await?;
        if let Some(capacity) = update.available_capacity_kg {
            Trip::validate_capacity_kg(capacity)?;
        }

        let origin = update.origin.unwrap_or_else(|| trip.origin.clone());
        let destination = update
            .destination
            .unwrap_or_else(|| trip.destination.clone());
        let departure_at = update.departure_at.unwrap_or(trip.departure_at);
        let geometry_changed =
            trip.geometry_differs(&origin.point, &destination.point, departure_at);

        trip.origin = origin;
        trip.destination = destination;
        trip.departure_at = departure_at;
        if let Some(seats) = update.available_seats {
            trip.available_seats = seats;
        }
        if let Some(capacity) = update.available_capacity_kg {
            trip.available_capacity_kg = capacity;
        }
        if let Some(notes) = update.notes {
            trip.notes = notes;
        }

        if geometry_changed {
            let route = self
                .routes
                .resolve(&trip.origin.point, &trip.destination.point, departure_at)
                .await;
            trip.apply_route(route);
            debug!("Route re-resolved after geometry change");
        } else {
            trip.touch();
        }

        self.write_guarded(&trip, TripStatus::Scheduled, TripOperation::Update)
            .await?;
        Ok(trip)
    }

    /// scheduled → active
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn start(&self, ctx: &RequestContext, id: &TripId) -> Result<Trip, ApplicationError> {
        self.transition(ctx, id, TripOperation::Start, Trip::start)
            .await
    }

    /// active → completed
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        id: &TripId,
    ) -> Result<Trip, ApplicationError> {
        self.transition(ctx, id, TripOperation::Complete, Trip::complete)
            .await
    }

    /// scheduled | active → cancelled
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn cancel(&self, ctx: &RequestContext, id: &TripId) -> Result<Trip, ApplicationError> {
        self.transition(ctx, id, TripOperation::Cancel, Trip::cancel)
            .await
    }

    /// Record the driver's current position on an active trip
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn update_location(
        &self,
        ctx: &RequestContext,
        id: &TripId,
        point: GeoPoint,
        recorded_at: Option<DateTime<Utc>>,
    ) -> Result<Trip, ApplicationError> {
        let recorded_at = recorded_at.unwrap_or_else(Utc::now);
        self.transition(ctx, id, TripOperation::UpdateLocation, |trip| {
            trip.record_location(point, recorded_at)
        })
        .await
    }

    /// Remove a trip that is not active
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id(), trip_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: &TripId) -> Result<(), ApplicationError> {
        self.load_guarded(ctx, id, TripOperation::Delete).await?;

        if self.store.delete_unless_active(id).await? {
            info!("Trip deleted");
            Ok(())
        } else {
            Err(self.lost_race(id, TripOperation::Delete).await)
        }
    }

    /// Get a trip by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: &TripId) -> Result<Trip, ApplicationError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("Trip {id} not found")))
    }

    /// List trips matching a query
    #[instrument(skip(self))]
    pub async fn list(&self, query: &TripQuery) -> Result<Vec<Trip>, ApplicationError> {
        self.store.list(query).await
    }

    /// List the caller's own trips
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id()))]
    pub async fn list_mine(
        &self,
        ctx: &RequestContext,
        status: Option<TripStatus>,
    ) -> Result<Vec<Trip>, ApplicationError> {
        let mut query = TripQuery::for_driver(ctx.user_id());
        query.status = status;
        self.store.list(&query).await
    }

    async fn transition<F>(
        &self,
        ctx: &RequestContext,
        id: &TripId,
        operation: TripOperation,
        apply: F,
    ) -> Result<Trip, ApplicationError>
    where
        F: FnOnce(&mut Trip) -> Result<(), domain::TripError> + Send,
    {
        let mut trip = self.load_guarded(ctx, id, operation).await?;
        let expected = trip.status;
        let previous_fix = trip.last_location;
        apply(&mut trip)?;
        let new_fix = trip.last_location.filter(|fix| Some(*fix) != previous_fix);

        let applied = self
            .store
            .transition_if_status(id, expected, trip.status, new_fix, trip.updated_at)
            .await?;
        if !applied {
            return Err(self.lost_race(id, operation).await);
        }
        info!(from = %expected, to = %trip.status, "Trip transitioned");

        // Columns outside the transition may have been edited since the load
        Ok(self.store.get(id).await?.unwrap_or(trip))
    }

    async fn load_guarded(
        &self,
        ctx: &RequestContext,
        id: &TripId,
        operation: TripOperation,
    ) -> Result<Trip, ApplicationError> {
        let trip = self.get(id).await?;
        if let Err(e) = trip.guard(&ctx.user_id(), operation) {
            warn!(operation = %operation, status = %trip.status, error = %e, "Trip operation rejected");
            return Err(e.into());
        }
        Ok(trip)
    }

    async fn write_guarded(
        &self,
        trip: &Trip,
        expected: TripStatus,
        operation: TripOperation,
    ) -> Result<(), ApplicationError> {
        if self.store.update_if_status(trip, expected).await? {
            Ok(())
        } else {
            Err(self.lost_race(&trip.id, operation).await)
        }
    }

    /// Explain a conditional write that matched nothing
    async fn lost_race(&self, id: &TripId, operation: TripOperation) -> ApplicationError {
        match self.store.get(id).await {
            Ok(Some(current)) => {
                warn!(status = %current.status, operation = %operation, "Concurrent trip transition won");
                ApplicationError::InvalidTransition {
                    status: current.status,
                    operation,
                }
            },
            Ok(None) => ApplicationError::NotFound(format!("Trip {id} not found")),
            Err(e) => e,
        }
    }
}
