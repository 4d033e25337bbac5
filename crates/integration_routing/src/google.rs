//! Google Directions API client
//!
//! Takes coordinates latitude-first. Requests a departure time so the
//! response carries `duration_in_traffic`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::{
    config::GoogleDirectionsConfig,
    coords::LatLng,
    error::RoutingError,
    models::{DirectionsRoute, GoogleDirectionsResponse},
};

/// Client for `GET /maps/api/directions/json`
#[derive(Debug)]
pub struct GoogleDirectionsClient {
    client: Client,
    config: GoogleDirectionsConfig,
}

impl GoogleDirectionsClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &GoogleDirectionsConfig) -> Result<Self, RoutingError> {
        config.validate().map_err(RoutingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(crate::config::DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// `departure_time` must not be in the past; past departures ask for "now"
    ///
    /// Google rejects past departure times, so for those the traffic-aware
    /// duration describes current traffic rather than the requested departure.
    fn departure_param(departure: DateTime<Utc>, now: DateTime<Utc>) -> String {
        if departure <= now {
            debug!(%departure, "Departure is in the past, requesting current traffic");
            "now".to_string()
        } else {
            departure.timestamp().to_string()
        }
    }

    /// Fetch the driving route between two points
    #[instrument(skip(self), fields(origin = %origin, destination = %destination))]
    pub async fn directions(
        &self,
        origin: LatLng,
        destination: LatLng,
        departure: DateTime<Utc>,
    ) -> Result<DirectionsRoute, RoutingError> {
        let url = format!("{}/maps/api/directions/json", self.config.base_url);
        let params = [
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("mode", "driving".to_string()),
            ("departure_time", Self::departure_param(departure, Utc::now())),
            ("language", self.config.language.clone()),
            ("key", self.config.api_key.clone()),
        ];

        debug!("Requesting Google directions");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| RoutingError::from_send(&e, self.config.timeout_secs))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimitExceeded {
                retry_after_secs: None,
            });
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(RoutingError::Denied(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(RoutingError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        Self::parse_response(&body, origin, destination)
    }

    fn parse_response(
        body: &str,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<DirectionsRoute, RoutingError> {
        let raw: GoogleDirectionsResponse =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        let detail = raw.error_message.unwrap_or_default();
        match raw.status.as_str() {
            "OK" => {},
            "ZERO_RESULTS" | "NOT_FOUND" => {
                return Err(RoutingError::NoRouteFound {
                    from: origin.to_string(),
                    to: destination.to_string(),
                });
            },
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
                return Err(RoutingError::RateLimitExceeded {
                    retry_after_secs: None,
                });
            },
            "REQUEST_DENIED" => {
                return Err(RoutingError::Denied(format!("REQUEST_DENIED {detail}")));
            },
            other => {
                warn!(status = other, %detail, "Unexpected directions status");
                return Err(RoutingError::RequestFailed(format!("{other} {detail}")));
            },
        }

        let route = raw
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRouteFound {
                from: origin.to_string(),
                to: destination.to_string(),
            })?;
        let leg = route
            .legs
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::ParseError("route has no legs".to_string()))?;

        Ok(DirectionsRoute {
            distance_meters: leg.distance.value,
            duration_seconds: leg.duration.value,
            duration_in_traffic_seconds: leg.duration_in_traffic.map(|d| d.value),
            polyline: route.overview_polyline.map(|p| p.points),
        })
    }
}
