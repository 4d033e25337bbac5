//! SQLite database health adapter
//!
//! Implements the `DatabaseHealthPort` for SQLite databases using the connection pool.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{DatabaseHealth, DatabaseHealthPort};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::ConnectionPool;

/// SQLite database health adapter
pub struct SqliteDatabaseHealth {
    pool: Arc<ConnectionPool>,
}

impl std::fmt::Debug for SqliteDatabaseHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabaseHealth")
            .field("pool", &"<ConnectionPool>")
            .finish()
    }
}

impl SqliteDatabaseHealth {
    /// Create a new database health adapter with the given connection pool
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseHealthPort for SqliteDatabaseHealth {
    #[instrument(skip(self))]
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let start = std::time::Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                ApplicationError::Internal(format!("Failed to get database connection: {e}"))
            })?;

            let version: String = conn
                .query_row("SELECT sqlite_version()", [], |row| row.get(0))
                .map_err(|e| {
                    ApplicationError::Internal(format!("Health check query failed: {e}"))
                })?;

            Ok::<_, ApplicationError>(version)
        })
        .await
        .map_err(|e| {
            ApplicationError::Internal(format!("Database health check task failed: {e}"))
        })?;

        match result {
            Ok(version) => {
                // Probe finishes in well under u64::MAX milliseconds
                #[allow(clippy::cast_possible_truncation)]
                let response_time_ms = start.elapsed().as_millis() as u64;

                debug!(
                    version = %version,
                    response_time_ms = response_time_ms,
                    "Database health check passed"
                );

                Ok(DatabaseHealth::healthy(format!("SQLite {version}"))
                    .with_response_time(response_time_ms))
            },
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DatabaseConfig, persistence::create_pool};

    fn create_test_pool() -> Arc<ConnectionPool> {
        Arc::new(create_pool(&DatabaseConfig::in_memory()).expect("Failed to create pool"))
    }

    #[tokio::test]
    async fn check_health_returns_version_info() {
        let health = SqliteDatabaseHealth::new(create_test_pool());

        let db_health = health.check_health().await.unwrap();
        assert!(db_health.reachable);
        assert!(db_health.version.unwrap().starts_with("SQLite "));
    }

    #[tokio::test]
    async fn check_health_includes_response_time() {
        let health = SqliteDatabaseHealth::new(create_test_pool());

        let result = health.check_health().await.unwrap();
        assert!(result.response_time_ms.is_some());
    }

    #[test]
    fn debug_hides_pool() {
        let health = SqliteDatabaseHealth::new(create_test_pool());
        let debug_str = format!("{health:?}");
        assert!(debug_str.contains("SqliteDatabaseHealth"));
        assert!(debug_str.contains("<ConnectionPool>"));
    }
}
