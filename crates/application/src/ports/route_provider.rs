//! Route provider port
//!
//! A single routing backend in the resolver's provider chain. Adapters in the
//! infrastructure layer implement this port on top of remote directions APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::value_objects::{GeoPoint, RouteEstimate, RouteSource};
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Why a provider could not produce an estimate
///
/// These never reach callers of the resolver; they only advance the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// No answer within the attempt budget
    #[error("provider timed out")]
    Timeout,

    /// Network failure or non-success HTTP status
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Credential rejected or quota exhausted
    #[error("provider refused the request: {0}")]
    Refused(String),

    /// Response could not be interpreted
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// Provider answered but found no route
    #[error("provider returned no route")]
    NoRoute,
}

/// A routing backend that turns two points and a departure into an estimate
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Which [`RouteSource`] estimates from this provider carry
    fn source(&self) -> RouteSource;

    /// Resolve a route
    async fn route(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> Result<RouteEstimate, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn RouteProvider) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RouteProvider>();
    }

    #[test]
    fn error_messages() {
        assert_eq!(ProviderError::Timeout.to_string(), "provider timed out");
        assert!(
            ProviderError::Refused("OVER_QUERY_LIMIT".into())
                .to_string()
                .contains("OVER_QUERY_LIMIT")
        );
    }
}
