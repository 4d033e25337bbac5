//! Trip storage port
//!
//! Defines the interface for persisting and querying trips. Status-guarded
//! writes are conditional on the stored status so concurrent transitions on
//! the same trip cannot overwrite each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::entities::{LocationFix, Trip, TripStatus};
use domain::value_objects::{TripId, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Default page size for trip listings
pub const DEFAULT_TRIP_LIMIT: u32 = 50;

/// Query options for listing trips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripQuery {
    /// Filter by owning driver
    pub driver_id: Option<UserId>,
    /// Filter by status
    pub status: Option<TripStatus>,
    /// Only trips departing at or after this time
    pub departing_after: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: Option<u32>,
}

impl TripQuery {
    /// All trips owned by a driver
    #[must_use]
    pub fn for_driver(driver_id: UserId) -> Self {
        Self {
            driver_id: Some(driver_id),
            ..Default::default()
        }
    }

    /// Set status filter
    #[must_use]
    pub const fn with_status(mut self, status: TripStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set departure lower bound
    #[must_use]
    pub const fn departing_after(mut self, at: DateTime<Utc>) -> Self {
        self.departing_after = Some(at);
        self
    }

    /// Set limit
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Limit to apply, falling back to [`DEFAULT_TRIP_LIMIT`]
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_TRIP_LIMIT)
    }
}

/// Port for trip persistence operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Insert a new trip
    async fn insert(&self, trip: &Trip) -> Result<(), ApplicationError>;

    /// Get a trip by ID
    async fn get(&self, id: &TripId) -> Result<Option<Trip>, ApplicationError>;

    /// Overwrite every column of a trip only if its stored status still
    /// equals `expected`
    ///
    /// Returns `false` when the guard did not match (status moved on, or the
    /// trip is gone) and nothing was written.
    async fn update_if_status(
        &self,
        trip: &Trip,
        expected: TripStatus,
    ) -> Result<bool, ApplicationError>;

    /// Move a trip to `to` only if its stored status still equals `expected`
    ///
    /// Writes the status, `updated_at` and, when given, the location fix.
    /// Every other column is left as stored. Returns `false` when the guard
    /// did not match.
    async fn transition_if_status(
        &self,
        id: &TripId,
        expected: TripStatus,
        to: TripStatus,
        location: Option<LocationFix>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, ApplicationError>;

    /// Delete a trip unless it is active
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete_unless_active(&self, id: &TripId) -> Result<bool, ApplicationError>;

    /// List trips matching a query, soonest departure first
    async fn list(&self, query: &TripQuery) -> Result<Vec<Trip>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TripStore>();
    }

    #[test]
    fn for_driver_builder() {
        let driver = UserId::new();
        let query = TripQuery::for_driver(driver)
            .with_status(TripStatus::Scheduled)
            .with_limit(5);
        assert_eq!(query.driver_id, Some(driver));
        assert_eq!(query.status, Some(TripStatus::Scheduled));
        assert_eq!(query.effective_limit(), 5);
    }

    #[test]
    fn default_limit() {
        assert_eq!(TripQuery::default().effective_limit(), DEFAULT_TRIP_LIMIT);
    }
}
