//! Health check handlers

use application::ports::DatabaseHealth;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    /// Absent when no database probe is wired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseStatus>,
}

/// Result of the database probe
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl From<DatabaseHealth> for DatabaseStatus {
    fn from(health: DatabaseHealth) -> Self {
        Self {
            reachable: health.reachable,
            version: health.version,
            response_time_ms: health.response_time_ms,
        }
    }
}

/// Readiness check - can the server reach its database?
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Server is ready", body = ReadinessResponse),
        (status = 503, description = "Database unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match &state.database_health {
        Some(probe) => {
            let health = probe.check_health().await.unwrap_or_else(|e| {
                warn!(error = %e, "Database health check failed");
                DatabaseHealth::unreachable()
            });
            Some(DatabaseStatus::from(health))
        },
        None => None,
    };

    let ready = database.as_ref().is_none_or(|db| db.reachable);
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(ReadinessResponse { ready, database }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serialization() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("ok"));
        assert!(json.contains("version"));
    }

    #[test]
    fn database_status_from_health() {
        let status = DatabaseStatus::from(
            DatabaseHealth::healthy("SQLite 3.45.0").with_response_time(3),
        );
        assert!(status.reachable);
        assert_eq!(status.version.as_deref(), Some("SQLite 3.45.0"));
        assert_eq!(status.response_time_ms, Some(3));
    }

    #[test]
    fn readiness_without_probe_omits_database() {
        let resp = ReadinessResponse {
            ready: true,
            database: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"ready":true}"#);
    }

    #[test]
    fn unreachable_database_omits_details() {
        let resp = ReadinessResponse {
            ready: false,
            database: Some(DatabaseStatus::from(DatabaseHealth::unreachable())),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"ready":false,"database":{"reachable":false}}"#);
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
        assert!(!response.version.is_empty());
    }
}
