//! Integration tests for the persistence layer using real SQLite databases
//!
//! These tests wire the SQLite stores into the application services the way
//! the server does, so they cover the full create → transition → reload path.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use application::{
    NewTrip, RequestContext, RouteResolver, TripService, TripUpdate, UserRole, VehicleAssigner,
    error::ApplicationError,
    ports::{DatabaseHealthPort, TripQuery, TripStore, VehicleRegistry},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::{
    Trip, TripOperation, TripStatus, Vehicle, VehicleApprovalStatus, geo_math,
    value_objects::{GeoPoint, Place, RouteSource, TripId, UserId, VehicleId},
};
use infrastructure::{
    ConnectionPool, DatabaseConfig, SqliteDatabaseHealth, SqliteTripStore, SqliteVehicleRegistry,
    create_pool,
};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn memory_pool() -> Arc<ConnectionPool> {
    Arc::new(create_pool(&DatabaseConfig::in_memory()).expect("Failed to create in-memory pool"))
}

fn file_config(dir: &TempDir, max_connections: u32) -> DatabaseConfig {
    DatabaseConfig {
        path: dir.path().join("data/cargolink.db").display().to_string(),
        max_connections,
        run_migrations: true,
    }
}

fn departure(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 5, day, 6, 0, 0).unwrap()
}

fn sao_paulo() -> Place {
    Place::new("Terminal Tietê", GeoPoint::sao_paulo()).unwrap()
}

fn rio() -> Place {
    Place::new("Rodoviária Novo Rio", GeoPoint::rio_de_janeiro()).unwrap()
}

fn curitiba() -> Place {
    Place::new("Rodoferroviária de Curitiba", GeoPoint::curitiba()).unwrap()
}

fn driver_ctx(driver: UserId) -> RequestContext {
    RequestContext::new(driver, UserRole::Driver)
}

struct Harness {
    service: TripService,
    registry: SqliteVehicleRegistry,
    store: SqliteTripStore,
}

impl Harness {
    fn new(pool: &Arc<ConnectionPool>) -> Self {
        let store = SqliteTripStore::new(Arc::clone(pool));
        let registry = SqliteVehicleRegistry::new(Arc::clone(pool));

        let trips: Arc<dyn TripStore> = Arc::new(store.clone());
        let vehicles: Arc<dyn VehicleRegistry> = Arc::new(registry.clone());
        let service = TripService::new(
            trips,
            Arc::new(RouteResolver::default()),
            Arc::new(VehicleAssigner::new(vehicles)),
        );

        Self {
            service,
            registry,
            store,
        }
    }

    async fn approved_vehicle(&self, owner: UserId) -> Vehicle {
        let vehicle = Vehicle::new(owner, "ABC1D23")
            .unwrap()
            .with_status(VehicleApprovalStatus::Approved);
        self.registry.register(&vehicle).await.unwrap();
        vehicle
    }
}

// ============================================================================
// Trip lifecycle through the service
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_approved_vehicle_and_haversine_route() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        let vehicle = harness.approved_vehicle(driver).await;

        let trip = harness
            .service
            .create(&driver_ctx(driver), NewTrip::new(sao_paulo(), rio(), departure(1)))
            .await
            .unwrap();

        assert_eq!(trip.vehicle_id, vehicle.id);
        assert_eq!(trip.status, TripStatus::Scheduled);
        assert_eq!(trip.route_source, RouteSource::Haversine);

        let expected = geo_math::fallback_estimate(
            &GeoPoint::sao_paulo(),
            &GeoPoint::rio_de_janeiro(),
            departure(1),
        );
        assert!((trip.distance_km - expected.distance_km).abs() < 1e-9);
        assert_eq!(trip.duration_minutes, expected.duration_minutes);

        let stored = harness.store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored, trip);
    }

    #[tokio::test]
    async fn full_lifecycle_is_persisted() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        harness.approved_vehicle(driver).await;
        let ctx = driver_ctx(driver);

        let trip = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), curitiba(), departure(2)))
            .await
            .unwrap();

        harness.service.start(&ctx, &trip.id).await.unwrap();
        let fix_at = departure(2) + Duration::hours(2);
        harness
            .service
            .update_location(&ctx, &trip.id, GeoPoint::new(-24.5, -47.8).unwrap(), Some(fix_at))
            .await
            .unwrap();
        harness.service.complete(&ctx, &trip.id).await.unwrap();

        let stored = harness.store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Completed);
        let fix = stored.last_location.expect("location should be kept");
        assert_eq!(fix.recorded_at, fix_at);
        assert!((fix.point.latitude() + 24.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn transition_keeps_edit_committed_after_its_load() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        harness.approved_vehicle(driver).await;
        let ctx = driver_ctx(driver);

        let trip = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), rio(), departure(6)))
            .await
            .unwrap();

        // A start that loaded the trip before the edit below was committed
        let mut stale = harness.store.get(&trip.id).await.unwrap().unwrap();
        let edited = harness
            .service
            .update(
                &ctx,
                &trip.id,
                TripUpdate {
                    destination: Some(curitiba()),
                    notes: Some(Some("Entrega na rodoferroviária".to_string())),
                    ..TripUpdate::default()
                },
            )
            .await
            .unwrap();
        stale.start().unwrap();
        assert!(
            harness
                .store
                .transition_if_status(
                    &stale.id,
                    TripStatus::Scheduled,
                    stale.status,
                    None,
                    stale.updated_at,
                )
                .await
                .unwrap()
        );

        let stored = harness.store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Active);
        assert_eq!(stored.destination, curitiba());
        assert_eq!(stored.notes.as_deref(), Some("Entrega na rodoferroviária"));
        assert_eq!(stored.route(), edited.route());

        let completed = harness.service.complete(&ctx, &trip.id).await.unwrap();
        assert_eq!(completed.destination, curitiba());
        assert_eq!(completed.route(), edited.route());
    }

    #[tokio::test]
    async fn terminal_trip_rejects_further_transitions() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        harness.approved_vehicle(driver).await;
        let ctx = driver_ctx(driver);

        let trip = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), rio(), departure(3)))
            .await
            .unwrap();
        harness.service.cancel(&ctx, &trip.id).await.unwrap();

        let result = harness.service.start(&ctx, &trip.id).await;
        assert!(matches!(
            result,
            Err(ApplicationError::InvalidTransition {
                status: TripStatus::Cancelled,
                operation: TripOperation::Start,
            })
        ));
    }

    #[tokio::test]
    async fn other_driver_cannot_touch_trip() {
        let harness = Harness::new(&memory_pool());
        let owner = UserId::new();
        harness.approved_vehicle(owner).await;

        let trip = harness
            .service
            .create(&driver_ctx(owner), NewTrip::new(sao_paulo(), rio(), departure(4)))
            .await
            .unwrap();

        let intruder = driver_ctx(UserId::new());
        assert!(matches!(
            harness.service.cancel(&intruder, &trip.id).await,
            Err(ApplicationError::Forbidden(_))
        ));
        assert!(matches!(
            harness.service.delete(&intruder, &trip.id).await,
            Err(ApplicationError::Forbidden(_))
        ));

        let stored = harness.store.get(&trip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Scheduled);
    }

    #[tokio::test]
    async fn active_trip_cannot_be_deleted() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        harness.approved_vehicle(driver).await;
        let ctx = driver_ctx(driver);

        let trip = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), rio(), departure(5)))
            .await
            .unwrap();
        harness.service.start(&ctx, &trip.id).await.unwrap();

        assert!(matches!(
            harness.service.delete(&ctx, &trip.id).await,
            Err(ApplicationError::InvalidTransition {
                status: TripStatus::Active,
                operation: TripOperation::Delete,
            })
        ));

        harness.service.complete(&ctx, &trip.id).await.unwrap();
        harness.service.delete(&ctx, &trip.id).await.unwrap();
        assert!(matches!(
            harness.service.get(&trip.id).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}

// ============================================================================
// Vehicle assignment against the registry
// ============================================================================

mod vehicle_tests {
    use super::*;

    #[tokio::test]
    async fn no_vehicle_blocks_creation_and_writes_nothing() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();

        let result = harness
            .service
            .create(&driver_ctx(driver), NewTrip::new(sao_paulo(), rio(), departure(6)))
            .await;

        assert!(matches!(result, Err(ApplicationError::NoVehicleRegistered)));
        let trips = harness
            .store
            .list(&TripQuery::for_driver(driver))
            .await
            .unwrap();
        assert!(trips.is_empty());
    }

    #[tokio::test]
    async fn pending_vehicle_reports_its_status_until_approved() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        let vehicle = Vehicle::new(driver, "XYZ9K87").unwrap();
        harness.registry.register(&vehicle).await.unwrap();
        let ctx = driver_ctx(driver);

        let result = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), rio(), departure(7)))
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::VehicleNotApproved {
                status: VehicleApprovalStatus::Pending
            })
        ));

        harness
            .registry
            .set_status(&vehicle.id, VehicleApprovalStatus::Approved)
            .await
            .unwrap();
        let trip = harness
            .service
            .create(&ctx, NewTrip::new(sao_paulo(), rio(), departure(7)))
            .await
            .unwrap();
        assert_eq!(trip.vehicle_id, vehicle.id);
    }

    #[tokio::test]
    async fn explicit_vehicle_skips_approval_lookup() {
        let harness = Harness::new(&memory_pool());
        let driver = UserId::new();
        let own = Vehicle::new(driver, "JKL8M90").unwrap();
        harness.registry.register(&own).await.unwrap();
        let vehicle_id = own.id;

        let trip = harness
            .service
            .create(
                &driver_ctx(driver),
                NewTrip::new(sao_paulo(), rio(), departure(8)).with_vehicle(vehicle_id),
            )
            .await
            .unwrap();

        assert_eq!(trip.vehicle_id, vehicle_id);
    }

    #[tokio::test]
    async fn explicit_vehicle_of_another_driver_is_refused() {
        let harness = Harness::new(&memory_pool());
        let owner = UserId::new();
        let vehicle = harness.approved_vehicle(owner).await;
        let other = UserId::new();

        let result = harness
            .service
            .create(
                &driver_ctx(other),
                NewTrip::new(sao_paulo(), rio(), departure(8)).with_vehicle(vehicle.id),
            )
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));

        let unknown = harness
            .service
            .create(
                &driver_ctx(other),
                NewTrip::new(sao_paulo(), rio(), departure(8)).with_vehicle(VehicleId::new()),
            )
            .await;
        assert!(matches!(unknown, Err(ApplicationError::Forbidden(_))));

        let listed = harness
            .store
            .list(&TripQuery::for_driver(other))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn set_status_on_unknown_vehicle_is_not_found() {
        let harness = Harness::new(&memory_pool());
        let result = harness
            .registry
            .set_status(&VehicleId::new(), VehicleApprovalStatus::Suspended)
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }
}

// ============================================================================
// Listing
// ============================================================================

mod listing_tests {
    use super::*;

    fn trip(driver: UserId, destination: Place, day: u32) -> Trip {
        let route = geo_math::fallback_estimate(
            &GeoPoint::sao_paulo(),
            &destination.point,
            departure(day),
        );
        Trip::new(driver, VehicleId::new(), sao_paulo(), destination, departure(day), route)
    }

    #[tokio::test]
    async fn list_orders_by_departure_and_applies_filters() {
        let store = SqliteTripStore::new(memory_pool());
        let driver = UserId::new();
        let other = UserId::new();

        let late = trip(driver, rio(), 20);
        let early = trip(driver, curitiba(), 10);
        let foreign = trip(other, rio(), 15);
        for t in [&late, &early, &foreign] {
            store.insert(t).await.unwrap();
        }

        let all = store.list(&TripQuery::default()).await.unwrap();
        let ids: Vec<TripId> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![early.id, foreign.id, late.id]);

        let mine = store.list(&TripQuery::for_driver(driver)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|t| t.driver_id == driver));

        let upcoming = store
            .list(&TripQuery::default().departing_after(departure(15)))
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 2);

        let first = store
            .list(&TripQuery::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, early.id);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = SqliteTripStore::new(memory_pool());
        let driver = UserId::new();

        let mut started = trip(driver, rio(), 11);
        let waiting = trip(driver, curitiba(), 12);
        store.insert(&started).await.unwrap();
        store.insert(&waiting).await.unwrap();

        started.start().unwrap();
        assert!(
            store
                .update_if_status(&started, TripStatus::Scheduled)
                .await
                .unwrap()
        );

        let active = store
            .list(&TripQuery::default().with_status(TripStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, started.id);
    }
}

// ============================================================================
// File-backed databases
// ============================================================================

mod file_database_tests {
    use super::*;

    #[tokio::test]
    async fn data_survives_reopening_the_database() {
        let dir = TempDir::new().unwrap();
        let driver = UserId::new();

        let trip_id = {
            let pool = Arc::new(create_pool(&file_config(&dir, 2)).unwrap());
            let harness = Harness::new(&pool);
            harness.approved_vehicle(driver).await;
            harness
                .service
                .create(&driver_ctx(driver), NewTrip::new(sao_paulo(), rio(), departure(9)))
                .await
                .unwrap()
                .id
        };

        // Reopening runs migrations again; they must be idempotent
        let pool = Arc::new(create_pool(&file_config(&dir, 2)).unwrap());
        let harness = Harness::new(&pool);
        let trip = harness.service.get(&trip_id).await.unwrap();

        assert_eq!(trip.driver_id, driver);
        assert_eq!(trip.destination.name, "Rodoviária Novo Rio");
    }

    #[tokio::test]
    async fn concurrent_starts_let_exactly_one_win() {
        let dir = TempDir::new().unwrap();
        let pool = Arc::new(create_pool(&file_config(&dir, 4)).unwrap());
        let harness = Arc::new(Harness::new(&pool));
        let driver = UserId::new();
        harness.approved_vehicle(driver).await;

        let trip = harness
            .service
            .create(&driver_ctx(driver), NewTrip::new(sao_paulo(), rio(), departure(10)))
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let harness = Arc::clone(&harness);
                let id = trip.id;
                tokio::spawn(async move { harness.service.start(&driver_ctx(driver), &id).await })
            })
            .collect();

        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(ApplicationError::InvalidTransition { status, .. }) => {
                    assert_eq!(status, TripStatus::Active);
                },
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(won, 1);
    }

    #[tokio::test]
    async fn health_check_reports_sqlite_version() {
        let dir = TempDir::new().unwrap();
        let pool = Arc::new(create_pool(&file_config(&dir, 1)).unwrap());
        let health = SqliteDatabaseHealth::new(pool).check_health().await.unwrap();

        assert!(health.reachable);
        assert!(health.version.is_some_and(|v| v.starts_with("SQLite 3")));
    }
}
