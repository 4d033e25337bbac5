//! SQLite-based trip persistence
//!
//! Status-guarded writes are single conditional statements, so two
//! concurrent transitions on the same trip cannot both succeed.

use std::sync::Arc;

use application::{
    error::ApplicationError,
    ports::{TripQuery, TripStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    entities::{LocationFix, Trip, TripStatus},
    value_objects::{Place, RouteSource, TripId, UserId, VehicleId},
};
use rusqlite::{OptionalExtension, Row, params, types::ToSql};
use tokio::task;
use tracing::{debug, instrument};

use super::{
    connection::ConnectionPool,
    sql::{conversion_error, parse_column, point_columns, timestamp, timestamp_column},
};

const TRIP_COLUMNS: &str = "id, driver_id, vehicle_id,
    origin_name, origin_lat, origin_lng,
    destination_name, destination_lat, destination_lng,
    departure_at, estimated_arrival, distance_km, duration_minutes,
    route_polyline, route_source, available_seats, available_capacity_kg,
    status, notes, last_location_lat, last_location_lng, last_location_at,
    created_at, updated_at";

/// SQLite-based trip store
#[derive(Debug, Clone)]
pub struct SqliteTripStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteTripStore {
    /// Create a new SQLite trip store
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

fn internal(e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Internal(e.to_string())
}

#[async_trait]
impl TripStore for SqliteTripStore {
    #[instrument(skip(self, trip), fields(trip_id = %trip.id))]
    async fn insert(&self, trip: &Trip) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let trip = trip.clone();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;
            let location = trip.last_location.as_ref();

            conn.execute(
                &format!(
                    "INSERT INTO trips ({TRIP_COLUMNS}) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                        ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
                    )"
                ),
                params![
                    trip.id.to_string(),
                    trip.driver_id.to_string(),
                    trip.vehicle_id.to_string(),
                    trip.origin.name,
                    trip.origin.point.latitude(),
                    trip.origin.point.longitude(),
                    trip.destination.name,
                    trip.destination.point.latitude(),
                    trip.destination.point.longitude(),
                    timestamp(trip.departure_at),
                    timestamp(trip.estimated_arrival),
                    trip.distance_km,
                    i64::from(trip.duration_minutes),
                    trip.route_polyline,
                    trip.route_source.as_str(),
                    trip.available_seats.map(i64::from),
                    trip.available_capacity_kg,
                    trip.status.as_str(),
                    trip.notes,
                    location.map(|l| l.point.latitude()),
                    location.map(|l| l.point.longitude()),
                    location.map(|l| timestamp(l.recorded_at)),
                    timestamp(trip.created_at),
                    timestamp(trip.updated_at),
                ],
            )
            .map_err(internal)?;

            debug!("Inserted trip");
            Ok(())
        })
        .await
        .map_err(internal)?
    }

    #[instrument(skip(self), fields(trip_id = %id))]
    async fn get(&self, id: &TripId) -> Result<Option<Trip>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;
            conn.query_row(
                &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"),
                [&id],
                row_to_trip,
            )
            .optional()
            .map_err(internal)
        })
        .await
        .map_err(internal)?
    }

    #[instrument(skip(self, trip), fields(trip_id = %trip.id, expected = %expected))]
    async fn update_if_status(
        &self,
        trip: &Trip,
        expected: TripStatus,
    ) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let trip = trip.clone();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;
            let location = trip.last_location.as_ref();

            let affected = conn
                .execute(
                    "UPDATE trips SET
                        vehicle_id = ?1,
                        origin_name = ?2, origin_lat = ?3, origin_lng = ?4,
                        destination_name = ?5, destination_lat = ?6, destination_lng = ?7,
                        departure_at = ?8, estimated_arrival = ?9,
                        distance_km = ?10, duration_minutes = ?11,
                        route_polyline = ?12, route_source = ?13,
                        available_seats = ?14, available_capacity_kg = ?15,
                        status = ?16, notes = ?17,
                        last_location_lat = ?18, last_location_lng = ?19, last_location_at = ?20,
                        updated_at = ?21
                     WHERE id = ?22 AND status = ?23",
                    params![
                        trip.vehicle_id.to_string(),
                        trip.origin.name,
                        trip.origin.point.latitude(),
                        trip.origin.point.longitude(),
                        trip.destination.name,
                        trip.destination.point.latitude(),
                        trip.destination.point.longitude(),
                        timestamp(trip.departure_at),
                        timestamp(trip.estimated_arrival),
                        trip.distance_km,
                        i64::from(trip.duration_minutes),
                        trip.route_polyline,
                        trip.route_source.as_str(),
                        trip.available_seats.map(i64::from),
                        trip.available_capacity_kg,
                        trip.status.as_str(),
                        trip.notes,
                        location.map(|l| l.point.latitude()),
                        location.map(|l| l.point.longitude()),
                        location.map(|l| timestamp(l.recorded_at)),
                        timestamp(trip.updated_at),
                        trip.id.to_string(),
                        expected.as_str(),
                    ],
                )
                .map_err(internal)?;

            debug!(affected, "Conditional trip update");
            Ok(affected == 1)
        })
        .await
        .map_err(internal)?
    }

    #[instrument(skip(self, location), fields(trip_id = %id, expected = %expected, to = %to))]
    async fn transition_if_status(
        &self,
        id: &TripId,
        expected: TripStatus,
        to: TripStatus,
        location: Option<LocationFix>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;

            let affected = conn
                .execute(
                    "UPDATE trips SET
                        status = ?1,
                        updated_at = ?2,
                        last_location_lat = COALESCE(?3, last_location_lat),
                        last_location_lng = COALESCE(?4, last_location_lng),
                        last_location_at = COALESCE(?5, last_location_at)
                     WHERE id = ?6 AND status = ?7",
                    params![
                        to.as_str(),
                        timestamp(updated_at),
                        location.map(|l| l.point.latitude()),
                        location.map(|l| l.point.longitude()),
                        location.map(|l| timestamp(l.recorded_at)),
                        id,
                        expected.as_str(),
                    ],
                )
                .map_err(internal)?;

            debug!(affected, "Conditional trip transition");
            Ok(affected == 1)
        })
        .await
        .map_err(internal)?
    }

    #[instrument(skip(self), fields(trip_id = %id))]
    async fn delete_unless_active(&self, id: &TripId) -> Result<bool, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;
            let affected = conn
                .execute(
                    "DELETE FROM trips WHERE id = ?1 AND status <> ?2",
                    params![id, TripStatus::Active.as_str()],
                )
                .map_err(internal)?;

            debug!(affected, "Conditional trip delete");
            Ok(affected == 1)
        })
        .await
        .map_err(internal)?
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &TripQuery) -> Result<Vec<Trip>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let query = query.clone();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(internal)?;

            let mut sql = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE 1=1");
            let mut values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(driver_id) = query.driver_id {
                values.push(Box::new(driver_id.to_string()));
                sql.push_str(&format!(" AND driver_id = ?{}", values.len()));
            }
            if let Some(status) = query.status {
                values.push(Box::new(status.as_str()));
                sql.push_str(&format!(" AND status = ?{}", values.len()));
            }
            if let Some(after) = query.departing_after {
                values.push(Box::new(timestamp(after)));
                sql.push_str(&format!(" AND departure_at >= ?{}", values.len()));
            }

            values.push(Box::new(i64::from(query.effective_limit())));
            sql.push_str(&format!(
                " ORDER BY departure_at ASC, created_at ASC LIMIT ?{}",
                values.len()
            ));

            let mut stmt = conn.prepare(&sql).map_err(internal)?;
            let params: Vec<&dyn ToSql> = values.iter().map(|value| &**value).collect();
            let trips = stmt
                .query_map(params.as_slice(), row_to_trip)
                .map_err(internal)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(internal)?;

            Ok(trips)
        })
        .await
        .map_err(internal)?
    }
}

/// Convert a database row to a Trip
fn row_to_trip(row: &Row<'_>) -> rusqlite::Result<Trip> {
    let origin_point = point_columns(row, "origin_lat", "origin_lng")?;
    let destination_point = point_columns(row, "destination_lat", "destination_lng")?;

    let origin = Place::new(row.get::<_, String>("origin_name")?, origin_point)
        .map_err(|e| conversion_error(row, "origin_name", e))?;
    let destination = Place::new(row.get::<_, String>("destination_name")?, destination_point)
        .map_err(|e| conversion_error(row, "destination_name", e))?;

    let duration_minutes: i64 = row.get("duration_minutes")?;
    let available_seats: Option<i64> = row.get("available_seats")?;

    let last_location = match row.get::<_, Option<f64>>("last_location_lat")? {
        Some(_) => Some(LocationFix {
            point: point_columns(row, "last_location_lat", "last_location_lng")?,
            recorded_at: timestamp_column(row, "last_location_at")?,
        }),
        None => None,
    };

    Ok(Trip {
        id: parse_column(row, "id", TripId::parse)?,
        driver_id: parse_column(row, "driver_id", UserId::parse)?,
        vehicle_id: parse_column(row, "vehicle_id", VehicleId::parse)?,
        origin,
        destination,
        departure_at: timestamp_column(row, "departure_at")?,
        estimated_arrival: timestamp_column(row, "estimated_arrival")?,
        distance_km: row.get("distance_km")?,
        duration_minutes: u32::try_from(duration_minutes)
            .map_err(|e| conversion_error(row, "duration_minutes", e))?,
        route_polyline: row.get("route_polyline")?,
        route_source: parse_column(row, "route_source", |s| {
            RouteSource::parse(s).ok_or_else(|| format!("unknown route source '{s}'"))
        })?,
        available_seats: available_seats
            .map(u32::try_from)
            .transpose()
            .map_err(|e| conversion_error(row, "available_seats", e))?,
        available_capacity_kg: row.get("available_capacity_kg")?,
        status: parse_column(row, "status", str::parse::<TripStatus>)?,
        notes: row.get("notes")?,
        last_location,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DatabaseConfig, persistence::create_pool};
    use chrono::{Duration, TimeZone, Utc};
    use domain::{
        geo_math,
        value_objects::{GeoPoint, RouteEstimate},
    };

    fn store() -> SqliteTripStore {
        let pool = create_pool(&DatabaseConfig::in_memory()).unwrap();
        SqliteTripStore::new(Arc::new(pool))
    }

    fn trip_for(driver: UserId, departure_day: u32) -> Trip {
        let departure = Utc.with_ymd_and_hms(2030, 3, departure_day, 8, 0, 0).unwrap();
        let origin = Place::new("Terminal Tietê", GeoPoint::sao_paulo()).unwrap();
        let destination = Place::new("Rodoviária Novo Rio", GeoPoint::rio_de_janeiro()).unwrap();
        let route = geo_math::fallback_estimate(&origin.point, &destination.point, departure);
        Trip::new(driver, VehicleId::new(), origin, destination, departure, route)
    }

    #[tokio::test]
    async fn insert_then_get_roundtrips() {
        let store = store();
        let mut trip = trip_for(UserId::new(), 1)
            .with_available_seats(Some(3))
            .with_available_capacity_kg(Some(250.5))
            .with_notes(Some("Sem paradas".to_string()));
        trip.apply_route(
            RouteEstimate::from_meters_and_seconds(
                429_870.0,
                22_530.0,
                trip.departure_at,
                RouteSource::PrimaryDirections,
            )
            .with_polyline("enc0d3d"),
        );

        store.insert(&trip).await.unwrap();
        let loaded = store.get(&trip.id).await.unwrap().unwrap();

        assert_eq!(loaded, trip);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        assert!(store().get(&TripId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_if_status_applies_on_match() {
        let store = store();
        let mut trip = trip_for(UserId::new(), 1);
        store.insert(&trip).await.unwrap();

        trip.start().unwrap();
        trip.record_location(GeoPoint::curitiba(), Utc::now()).unwrap();
        assert!(
            store
                .update_if_status(&trip, TripStatus::Scheduled)
                .await
                .unwrap()
        );

        let loaded = store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TripStatus::Active);
        assert_eq!(loaded.last_location, trip.last_location);
    }

    #[tokio::test]
    async fn update_if_status_refuses_on_mismatch() {
        let store = store();
        let mut trip = trip_for(UserId::new(), 1);
        store.insert(&trip).await.unwrap();

        let mut cancelled = trip.clone();
        cancelled.cancel().unwrap();
        assert!(
            store
                .update_if_status(&cancelled, TripStatus::Scheduled)
                .await
                .unwrap()
        );

        trip.start().unwrap();
        assert!(
            !store
                .update_if_status(&trip, TripStatus::Scheduled)
                .await
                .unwrap()
        );
        let loaded = store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TripStatus::Cancelled);
    }

    #[tokio::test]
    async fn transition_if_status_writes_only_status_and_fix() {
        let store = store();
        let trip = trip_for(UserId::new(), 1);
        store.insert(&trip).await.unwrap();

        let mut edited = trip.clone();
        edited.notes = Some("Carga frágil".to_string());
        store
            .update_if_status(&edited, TripStatus::Scheduled)
            .await
            .unwrap();

        let started_at = Utc::now();
        assert!(
            store
                .transition_if_status(
                    &trip.id,
                    TripStatus::Scheduled,
                    TripStatus::Active,
                    None,
                    started_at,
                )
                .await
                .unwrap()
        );
        let fix = LocationFix {
            point: GeoPoint::curitiba(),
            recorded_at: started_at,
        };
        assert!(
            store
                .transition_if_status(
                    &trip.id,
                    TripStatus::Active,
                    TripStatus::Active,
                    Some(fix),
                    started_at,
                )
                .await
                .unwrap()
        );
        store
            .transition_if_status(
                &trip.id,
                TripStatus::Active,
                TripStatus::Completed,
                None,
                Utc::now(),
            )
            .await
            .unwrap();

        let loaded = store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TripStatus::Completed);
        assert_eq!(loaded.notes.as_deref(), Some("Carga frágil"));
        assert_eq!(loaded.last_location, Some(fix));
        assert_eq!(loaded.route(), trip.route());
    }

    #[tokio::test]
    async fn transition_if_status_refuses_on_mismatch() {
        let store = store();
        let trip = trip_for(UserId::new(), 1);
        store.insert(&trip).await.unwrap();

        assert!(
            !store
                .transition_if_status(
                    &trip.id,
                    TripStatus::Active,
                    TripStatus::Completed,
                    None,
                    Utc::now(),
                )
                .await
                .unwrap()
        );
        assert!(
            !store
                .transition_if_status(
                    &TripId::new(),
                    TripStatus::Scheduled,
                    TripStatus::Active,
                    None,
                    Utc::now(),
                )
                .await
                .unwrap()
        );
        let loaded = store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TripStatus::Scheduled);
    }

    #[tokio::test]
    async fn delete_unless_active_spares_active_trips() {
        let store = store();
        let mut trip = trip_for(UserId::new(), 1);
        store.insert(&trip).await.unwrap();
        trip.start().unwrap();
        store
            .update_if_status(&trip, TripStatus::Scheduled)
            .await
            .unwrap();

        assert!(!store.delete_unless_active(&trip.id).await.unwrap());
        assert!(store.get(&trip.id).await.unwrap().is_some());

        trip.cancel().unwrap();
        store
            .update_if_status(&trip, TripStatus::Active)
            .await
            .unwrap();
        assert!(store.delete_unless_active(&trip.id).await.unwrap());
        assert!(store.get(&trip.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_reports_false() {
        assert!(!store().delete_unless_active(&TripId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_departure() {
        let store = store();
        let driver = UserId::new();
        let late = trip_for(driver, 20);
        let early = trip_for(driver, 5);
        let mut cancelled = trip_for(driver, 10);
        cancelled.cancel().unwrap();
        let someone_else = trip_for(UserId::new(), 1);

        for trip in [&late, &early, &cancelled, &someone_else] {
            store.insert(trip).await.unwrap();
        }

        let mine = store.list(&TripQuery::for_driver(driver)).await.unwrap();
        let ids: Vec<TripId> = mine.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![early.id, cancelled.id, late.id]);

        let scheduled = store
            .list(&TripQuery::for_driver(driver).with_status(TripStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(scheduled.len(), 2);

        let upcoming = store
            .list(&TripQuery::default().departing_after(early.departure_at + Duration::days(1)))
            .await
            .unwrap();
        let ids: Vec<TripId> = upcoming.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![cancelled.id, late.id]);

        let limited = store
            .list(&TripQuery::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited[0].id, someone_else.id);
        assert_eq!(limited.len(), 1);
    }
}
