//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: SQLite storage for
//! trips and vehicles, directions and geocoding providers, configuration
//! loading and logging.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;
pub mod validation;

pub use adapters::*;
pub use config::{
    AppConfig, ConfigValidationError, DatabaseConfig, Environment, LogFormat, SecurityConfig,
    ServerConfig,
};
pub use persistence::{
    ConnectionPool, SqliteDatabaseHealth, SqliteTripStore, SqliteVehicleRegistry, create_pool,
};
pub use telemetry::{TelemetryError, init_logging};
pub use validation::{SecurityValidator, SecurityWarning, WarningSeverity};
