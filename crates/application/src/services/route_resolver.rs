//! Route resolution over an ordered provider chain
//!
//! Providers are tried in order and the first usable estimate wins. Every
//! failure mode of a provider (error, timeout, panic, nonsensical numbers)
//! only advances the chain; when nothing is left the haversine estimate is
//! returned, so resolution never fails.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use domain::{
    geo_math,
    value_objects::{GeoPoint, RouteEstimate},
};
use futures::FutureExt;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::ports::{ProviderError, RouteProvider};

/// Default budget for a single provider attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves routes through remote providers with an offline fallback
pub struct RouteResolver {
    providers: Vec<Arc<dyn RouteProvider>>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for RouteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteResolver")
            .field("providers", &self.provider_names())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RouteResolver {
    /// Create a resolver trying `providers` in order
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn RouteProvider>>) -> Self {
        Self {
            providers,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Override the per-provider time budget
    #[must_use]
    pub const fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Names of the configured providers, in chain order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a route between two points
    ///
    /// Never fails: falls back to the great-circle estimate.
    #[instrument(skip(self), fields(origin = %origin, destination = %destination))]
    pub async fn resolve(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> RouteEstimate {
        for provider in &self.providers {
            match self
                .attempt(provider.as_ref(), origin, destination, departure_at)
                .await
            {
                Ok(estimate) => {
                    debug!(
                        provider = provider.name(),
                        distance_km = estimate.distance_km,
                        duration_minutes = estimate.duration_minutes,
                        "Route resolved"
                    );
                    return estimate;
                },
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Route provider failed, trying next");
                },
            }
        }

        if !self.providers.is_empty() {
            info!("All route providers failed, using haversine estimate");
        }
        geo_math::fallback_estimate(origin, destination, departure_at)
    }

    async fn attempt(
        &self,
        provider: &dyn RouteProvider,
        origin: &GeoPoint,
        destination: &GeoPoint,
        departure_at: DateTime<Utc>,
    ) -> Result<RouteEstimate, ProviderError> {
        let call = async { provider.route(origin, destination, departure_at).await };

        match timeout(self.attempt_timeout, AssertUnwindSafe(call).catch_unwind()).await {
            Err(_) => Err(ProviderError::Timeout),
            Ok(Err(_panic)) => Err(ProviderError::Unavailable(
                "provider panicked while resolving".to_string(),
            )),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Ok(Ok(estimate))) if !estimate.is_sane() => Err(ProviderError::InvalidResponse(
                format!("unusable distance {}", estimate.distance_km),
            )),
            Ok(Ok(Ok(estimate))) => Ok(estimate),
        }
    }
}
