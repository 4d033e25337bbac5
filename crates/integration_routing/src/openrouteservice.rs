//! OpenRouteService directions client
//!
//! Takes coordinates longitude-first, as the API expects.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    config::OpenRouteServiceConfig,
    coords::LngLat,
    error::RoutingError,
    models::{DirectionsRoute, OrsDirectionsResponse, OrsErrorResponse},
};

/// ORS error code for "could not find routable point" / "route not found"
const ORS_NO_ROUTE_CODES: [i64; 2] = [2009, 2010];

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: [LngLat; 2],
}

/// Client for `POST /v2/directions/{profile}`
#[derive(Debug)]
pub struct OpenRouteServiceClient {
    client: Client,
    config: OpenRouteServiceConfig,
}

impl OpenRouteServiceClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &OpenRouteServiceConfig) -> Result<Self, RoutingError> {
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

    /// Fetch the route between two points
    #[instrument(skip(self), fields(origin = %origin, destination = %destination))]
    pub async fn directions(
        &self,
        origin: LngLat,
        destination: LngLat,
    ) -> Result<DirectionsRoute, RoutingError> {
        let url = format!(
            "{}/v2/directions/{}",
            self.config.base_url, self.config.profile
        );
        let body = DirectionsRequest {
            coordinates: [origin, destination],
        };

        debug!("Requesting OpenRouteService directions");

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RoutingError::from_send(&e, self.config.timeout_secs))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimitExceeded {
                retry_after_secs: response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok()),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RoutingError::Denied(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Self::classify_error(status, &text, origin, destination));
        }

        Self::parse_response(&text, origin, destination)
    }

    fn classify_error(
        status: StatusCode,
        body: &str,
        origin: LngLat,
        destination: LngLat,
    ) -> RoutingError {
        match serde_json::from_str::<OrsErrorResponse>(body) {
            Ok(err) if err.error.code().is_some_and(|c| ORS_NO_ROUTE_CODES.contains(&c)) => {
                RoutingError::NoRouteFound {
                    from: origin.to_string(),
                    to: destination.to_string(),
                }
            },
            Ok(err) => RoutingError::RequestFailed(format!("HTTP {status}: {}", err.error.message())),
            Err(_) => RoutingError::RequestFailed(format!("HTTP {status}")),
        }
    }

    fn parse_response(
        body: &str,
        origin: LngLat,
        destination: LngLat,
    ) -> Result<DirectionsRoute, RoutingError> {
        let raw: OrsDirectionsResponse =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        let route = raw
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRouteFound {
                from: origin.to_string(),
                to: destination.to_string(),
            })?;

        Ok(DirectionsRoute {
            distance_meters: route.summary.distance,
            duration_seconds: route.summary.duration,
            duration_in_traffic_seconds: None,
            polyline: route.geometry,
        })
    }
}
