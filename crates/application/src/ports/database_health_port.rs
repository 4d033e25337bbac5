//! Database readiness port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;

/// Result of a database probe
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Engine version, when the probe could read it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl DatabaseHealth {
    #[must_use]
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            reachable: true,
            version: Some(version.into()),
            response_time_ms: None,
        }
    }

    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            version: None,
            response_time_ms: None,
        }
    }

    #[must_use]
    pub const fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Port used by the readiness probe
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseHealthPort: Send + Sync {
    /// Run a trivial query and report reachability
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError>;
}
