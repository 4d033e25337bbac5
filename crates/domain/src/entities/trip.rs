//! Trip entity - A driver-published travel leg and its lifecycle
//!
//! The status machine:
//!
//! ```text
//! scheduled ──start──▶ active ──complete──▶ completed
//!     │                  │
//!     └──cancel──▶ cancelled ◀──cancel──┘
//! ```
//!
//! `update` is only allowed while scheduled, `update_location` only while
//! active, and `delete` in every state except active.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    errors::DomainError,
    value_objects::{GeoPoint, Place, RouteEstimate, RouteSource, TripId, UserId, VehicleId},
};

/// Lifecycle status of a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Published, not yet departed
    Scheduled,
    /// Driver is on the road
    Active,
    /// Arrived; terminal
    Completed,
    /// Called off; terminal
    Cancelled,
}

impl TripStatus {
    /// Check if this is a terminal state (no further transitions)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `operation` is legal from this status
    #[must_use]
    pub const fn permits(&self, operation: TripOperation) -> bool {
        match operation {
            TripOperation::Update | TripOperation::Start => matches!(self, Self::Scheduled),
            TripOperation::Complete | TripOperation::UpdateLocation => {
                matches!(self, Self::Active)
            },
            TripOperation::Cancel => matches!(self, Self::Scheduled | Self::Active),
            TripOperation::Delete => !matches!(self, Self::Active),
        }
    }

    /// Stable string form used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// All statuses, in lifecycle order
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Scheduled, Self::Active, Self::Completed, Self::Cancelled]
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::invalid_value("trip status", s)),
        }
    }
}

/// Guarded operations on an existing trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripOperation {
    /// Edit schedule, places, capacity or notes
    Update,
    /// Depart
    Start,
    /// Arrive
    Complete,
    /// Call off
    Cancel,
    /// Remove the record
    Delete,
    /// Report current position
    UpdateLocation,
}

impl TripOperation {
    /// All operations
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Update,
            Self::Start,
            Self::Complete,
            Self::Cancel,
            Self::Delete,
            Self::UpdateLocation,
        ]
    }

    /// Human-readable verb
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
            Self::UpdateLocation => "update location of",
        }
    }
}

impl fmt::Display for TripOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised by trip guards
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripError {
    /// The caller does not own the trip
    #[error("Trip {trip_id} belongs to another driver")]
    NotOwner {
        /// Trip that was targeted
        trip_id: TripId,
    },

    /// The operation is not legal from the current status
    #[error("Cannot {operation} trip {trip_id}: trip is {status}")]
    InvalidTransition {
        /// Trip that was targeted
        trip_id: TripId,
        /// Status at the time of the attempt
        status: TripStatus,
        /// Attempted operation
        operation: TripOperation,
    },
}

/// Last reported position of the driver on an active trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Reported coordinates
    pub point: GeoPoint,
    /// When the position was recorded
    pub recorded_at: DateTime<Utc>,
}

/// A travel leg published by a driver
///
/// Route fields (`distance_km`, `duration_minutes`, `estimated_arrival`,
/// `route_polyline`, `route_source`) are only written through
/// [`Trip::apply_route`] so they always reflect the latest resolution for the
/// current origin, destination and departure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier
    pub id: TripId,
    /// Owning driver; never changes after creation
    pub driver_id: UserId,
    /// Vehicle used for the trip
    pub vehicle_id: VehicleId,
    /// Where the trip starts
    pub origin: Place,
    /// Where the trip ends
    pub destination: Place,
    /// Scheduled departure
    pub departure_at: DateTime<Utc>,
    /// Estimated arrival from the latest route resolution
    pub estimated_arrival: DateTime<Utc>,
    /// Road distance in kilometres
    pub distance_km: f64,
    /// Travel time in minutes
    pub duration_minutes: u32,
    /// Encoded route geometry, if a provider returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_polyline: Option<String>,
    /// Backend that produced the current estimate
    pub route_source: RouteSource,
    /// Passenger seats offered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<u32>,
    /// Cargo capacity offered, in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_capacity_kg: Option<f64>,
    /// Current lifecycle status
    pub status: TripStatus,
    /// Free-form driver notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last reported driver position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_location: Option<LocationFix>,
    /// When the trip was created
    pub created_at: DateTime<Utc>,
    /// When the trip was last modified
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Create a new scheduled trip from a resolved route
    #[must_use]
    pub fn new(
        driver_id: UserId,
        vehicle_id: VehicleId,
        origin: Place,
        destination: Place,
        departure_at: DateTime<Utc>,
        route: RouteEstimate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TripId::new(),
            driver_id,
            vehicle_id,
            origin,
            destination,
            departure_at,
            estimated_arrival: route.estimated_arrival,
            distance_km: route.distance_km,
            duration_minutes: route.duration_minutes,
            route_polyline: route.polyline,
            route_source: route.source,
            available_seats: None,
            available_capacity_kg: None,
            status: TripStatus::Scheduled,
            notes: None,
            last_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set offered seats
    #[must_use]
    pub const fn with_available_seats(mut self, seats: Option<u32>) -> Self {
        self.available_seats = seats;
        self
    }

    /// Set offered cargo capacity
    #[must_use]
    pub const fn with_available_capacity_kg(mut self, capacity_kg: Option<f64>) -> Self {
        self.available_capacity_kg = capacity_kg;
        self
    }

    /// Set driver notes
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Fail unless `user_id` owns this trip
    pub fn authorize(&self, user_id: &UserId) -> Result<(), TripError> {
        if &self.driver_id == user_id {
            Ok(())
        } else {
            Err(TripError::NotOwner { trip_id: self.id })
        }
    }

    /// Fail unless `operation` is legal from the current status
    pub const fn ensure_permits(&self, operation: TripOperation) -> Result<(), TripError> {
        if self.status.permits(operation) {
            Ok(())
        } else {
            Err(TripError::InvalidTransition {
                trip_id: self.id,
                status: self.status,
                operation,
            })
        }
    }

    /// Ownership first, then status
    pub fn guard(&self, user_id: &UserId, operation: TripOperation) -> Result<(), TripError> {
        self.authorize(user_id)?;
        self.ensure_permits(operation)
    }

    /// scheduled → active
    pub fn start(&mut self) -> Result<(), TripError> {
        self.transition(TripOperation::Start, TripStatus::Active)
    }

    /// active → completed
    pub fn complete(&mut self) -> Result<(), TripError> {
        self.transition(TripOperation::Complete, TripStatus::Completed)
    }

    /// scheduled | active → cancelled
    pub fn cancel(&mut self) -> Result<(), TripError> {
        self.transition(TripOperation::Cancel, TripStatus::Cancelled)
    }

    fn transition(&mut self, operation: TripOperation, to: TripStatus) -> Result<(), TripError> {
        self.ensure_permits(operation)?;
        self.status = to;
        self.touch();
        Ok(())
    }

    /// Record the driver's current position
    pub fn record_location(
        &mut self,
        point: GeoPoint,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TripError> {
        self.ensure_permits(TripOperation::UpdateLocation)?;
        self.last_location = Some(LocationFix { point, recorded_at });
        self.touch();
        Ok(())
    }

    /// Overwrite all route fields with a fresh estimate
    pub fn apply_route(&mut self, route: RouteEstimate) {
        self.estimated_arrival = route.estimated_arrival;
        self.distance_km = route.distance_km;
        self.duration_minutes = route.duration_minutes;
        self.route_polyline = route.polyline;
        self.route_source = route.source;
        self.touch();
    }

    /// The stored route fields as an estimate
    #[must_use]
    pub fn route(&self) -> RouteEstimate {
        RouteEstimate {
            distance_km: self.distance_km,
            duration_minutes: self.duration_minutes,
            estimated_arrival: self.estimated_arrival,
            polyline: self.route_polyline.clone(),
            source: self.route_source,
        }
    }

    /// Whether the route geometry inputs differ from the given ones
    #[must_use]
    pub fn geometry_differs(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> bool {
        self.origin.point != *origin
            || self.destination.point != *destination
            || self.departure_at != departure_at
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate an offered capacity value
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` for negative or non-finite values.
    pub fn validate_capacity_kg(capacity_kg: Option<f64>) -> Result<(), DomainError> {
        match capacity_kg {
            Some(kg) if !kg.is_finite() || kg < 0.0 => Err(DomainError::ValidationError(
                format!("available capacity must be a non-negative number of kilograms (got {kg})"),
            )),
            _ => Ok(()),
        }
    }
}
