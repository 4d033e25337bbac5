//! Persistence module
//!
//! SQLite-based storage for trips and vehicles.

pub mod connection;
pub mod database_health;
pub mod migrations;
mod sql;
pub mod trip_store;
pub mod vehicle_registry;

pub use connection::{ConnectionPool, DatabaseError, PooledConn, create_pool};
pub use database_health::SqliteDatabaseHealth;
pub use trip_store::SqliteTripStore;
pub use vehicle_registry::SqliteVehicleRegistry;
