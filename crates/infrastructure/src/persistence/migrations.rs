//! Database migrations
//!
//! Schema versioning for the SQLite store. The current version lives in the
//! `schema_version` table; each `migrate_vN` brings the schema from `N-1` to `N`.
//!
//! ## Adding New Migrations
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vX` function
//! 3. Call it from `run_migrations`

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::DatabaseError;

/// Current schema version
pub(crate) const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            if let Err(e) = migrate_v1(conn) {
                error!(version = 1, error = %e, "Migration V001 (trips and vehicles) failed");
                return Err(e);
            }
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

/// Get current schema version
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration to version 1: trips and vehicles
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    debug!("Applying migration V001: trips and vehicles");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS vehicles (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            plate TEXT NOT NULL,
            description TEXT,
            approval_status TEXT NOT NULL DEFAULT 'pending'
                CHECK(approval_status IN ('pending', 'approved', 'rejected', 'suspended')),
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_vehicles_owner
            ON vehicles(owner_id, approval_status, created_at);

        -- vehicle_id is not a foreign key: explicitly supplied vehicles are not verified
        CREATE TABLE IF NOT EXISTS trips (
            id TEXT PRIMARY KEY,
            driver_id TEXT NOT NULL,
            vehicle_id TEXT NOT NULL,
            origin_name TEXT NOT NULL,
            origin_lat REAL NOT NULL,
            origin_lng REAL NOT NULL,
            destination_name TEXT NOT NULL,
            destination_lat REAL NOT NULL,
            destination_lng REAL NOT NULL,
            departure_at TEXT NOT NULL,
            estimated_arrival TEXT NOT NULL,
            distance_km REAL NOT NULL CHECK(distance_km >= 0),
            duration_minutes INTEGER NOT NULL CHECK(duration_minutes >= 0),
            route_polyline TEXT,
            route_source TEXT NOT NULL
                CHECK(route_source IN ('primary_directions', 'secondary_directions', 'haversine')),
            available_seats INTEGER,
            available_capacity_kg REAL,
            status TEXT NOT NULL DEFAULT 'scheduled'
                CHECK(status IN ('scheduled', 'active', 'completed', 'cancelled')),
            notes TEXT,
            last_location_lat REAL,
            last_location_lng REAL,
            last_location_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_trips_driver
            ON trips(driver_id, departure_at);
        CREATE INDEX IF NOT EXISTS idx_trips_status
            ON trips(status, departure_at);
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect()
    }

    #[test]
    fn run_migrations_creates_tables() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"trips".to_string()));
        assert!(tables.contains(&"vehicles".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn trips_status_is_constrained() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO trips (
                id, driver_id, vehicle_id, origin_name, origin_lat, origin_lng,
                destination_name, destination_lat, destination_lng, departure_at,
                estimated_arrival, distance_km, duration_minutes, route_source,
                status, created_at, updated_at
            ) VALUES (
                't1', 'd1', 'v1', 'A', 0, 0, 'B', 1, 1, '2030-01-01T00:00:00Z',
                '2030-01-01T01:00:00Z', 10, 60, 'haversine',
                'paused', '2030-01-01T00:00:00Z', '2030-01-01T00:00:00Z'
            )",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn vehicles_status_defaults_to_pending() {
        let conn = create_test_connection();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO vehicles (id, owner_id, plate, created_at)
             VALUES ('v1', 'o1', 'ABC1D23', '2030-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let status: String = conn
            .query_row(
                "SELECT approval_status FROM vehicles WHERE id = 'v1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(status, "pending");
    }
}
