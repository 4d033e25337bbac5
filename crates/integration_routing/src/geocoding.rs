//! Nominatim geocoding client
//!
//! Converts free-form addresses to coordinates and back using the
//! [Nominatim](https://nominatim.openstreetmap.org) API (OpenStreetMap).
//!
//! Requests are spaced at least `min_interval_ms` apart (the public instance
//! allows one per second) and forward lookups are cached.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, instrument};

use crate::{
    config::NominatimConfig,
    coords::LatLng,
    error::RoutingError,
    models::{GeocodedPlace, NominatimResult, NominatimReverse},
};

/// Trait for geocoding clients
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Convert a free-form address to coordinates
    async fn geocode(&self, address: &str) -> Result<GeocodedPlace, RoutingError>;

    /// Convert coordinates to a human-readable address
    async fn reverse_geocode(&self, point: LatLng) -> Result<String, RoutingError>;
}

/// Nominatim-based geocoding client with request spacing and caching
#[derive(Debug)]
pub struct NominatimGeocodingClient {
    client: Client,
    config: NominatimConfig,
    cache: Option<Cache<String, GeocodedPlace>>,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl NominatimGeocodingClient {
    /// Create a new Nominatim geocoding client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &NominatimConfig) -> Result<Self, RoutingError> {
        config.validate().map_err(RoutingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        let cache = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(config.cache_ttl_hours * 3600))
                .build()
        });

        Ok(Self {
            client,
            config: config.clone(),
            cache,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Wait until the minimum spacing since the previous request has passed
    async fn rate_limit(&self) {
        let min_interval = Duration::from_millis(self.config.min_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < min_interval {
                let wait = min_interval.saturating_sub(elapsed);
                debug!(?wait, "Rate limiting geocoding request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, RoutingError> {
        self.rate_limit().await;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| RoutingError::from_send(&e, self.config.timeout_secs))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimitExceeded {
                retry_after_secs: None,
            });
        }
        if status == StatusCode::FORBIDDEN {
            return Err(RoutingError::Denied(
                "Nominatim refused the request; check the User-Agent".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(RoutingError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))
    }

    fn parse_search(address: &str, body: &str) -> Result<GeocodedPlace, RoutingError> {
        let results: Vec<NominatimResult> =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        let result = results
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::LocationNotFound(address.to_string()))?;

        let latitude: f64 = result
            .lat
            .parse()
            .map_err(|_| RoutingError::ParseError("Invalid latitude".to_string()))?;
        let longitude: f64 = result
            .lon
            .parse()
            .map_err(|_| RoutingError::ParseError("Invalid longitude".to_string()))?;

        Ok(GeocodedPlace {
            latitude,
            longitude,
            display_name: result
                .display_name
                .unwrap_or_else(|| address.to_string()),
        })
    }
}

#[async_trait]
impl GeocodingClient for NominatimGeocodingClient {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<GeocodedPlace, RoutingError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(RoutingError::LocationNotFound(
                "Address must not be empty".to_string(),
            ));
        }

        let cache_key = address.to_lowercase();
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key).await {
                debug!(%address, "Geocoding cache hit");
                return Ok(hit);
            }
        }

        let url = format!("{}/search", self.config.base_url);
        let mut params = vec![
            ("q", address.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", "1".to_string()),
            ("accept-language", "pt-BR,en".to_string()),
        ];
        if !self.config.country_filter.is_empty() {
            params.push(("countrycodes", self.config.country_filter.clone()));
        }

        debug!(%address, "Geocoding address");
        let body = self.get_text(&url, &params).await?;
        let place = Self::parse_search(address, &body)?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, place.clone()).await;
        }
        debug!(lat = place.latitude, lon = place.longitude, "Geocoded address");
        Ok(place)
    }

    #[instrument(skip(self), fields(point = %point))]
    async fn reverse_geocode(&self, point: LatLng) -> Result<String, RoutingError> {
        let url = format!("{}/reverse", self.config.base_url);
        let params = [
            ("lat", point.lat.to_string()),
            ("lon", point.lng.to_string()),
            ("format", "jsonv2".to_string()),
            ("accept-language", "pt-BR,en".to_string()),
        ];

        debug!("Reverse geocoding");
        let body = self.get_text(&url, &params).await?;

        let result: NominatimReverse =
            serde_json::from_str(&body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        result
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                RoutingError::LocationNotFound(
                    result.error.unwrap_or_else(|| point.to_string()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_search_hit() {
        let body = r#"[{"lat": "-23.5613", "lon": "-46.6565", "display_name": "Avenida Paulista, São Paulo"}]"#;
        let place = NominatimGeocodingClient::parse_search("av paulista", body).unwrap();
        assert!((place.latitude + 23.5613).abs() < 1e-9);
        assert!((place.longitude + 46.6565).abs() < 1e-9);
        assert_eq!(place.display_name, "Avenida Paulista, São Paulo");
    }

    #[test]
    fn parse_search_empty_is_not_found() {
        let err = NominatimGeocodingClient::parse_search("nowhere", "[]").unwrap_err();
        assert!(matches!(err, RoutingError::LocationNotFound(ref a) if a == "nowhere"));
    }

    #[test]
    fn parse_search_bad_latitude() {
        let body = r#"[{"lat": "north", "lon": "-46.6"}]"#;
        assert!(matches!(
            NominatimGeocodingClient::parse_search("x", body),
            Err(RoutingError::ParseError(_))
        ));
    }

    #[test]
    fn new_without_cache_when_ttl_zero() {
        let client = NominatimGeocodingClient::new(&NominatimConfig::for_testing()).unwrap();
        assert!(client.cache.is_none());

        let client = NominatimGeocodingClient::new(&NominatimConfig::default()).unwrap();
        assert!(client.cache.is_some());
    }

    #[tokio::test]
    async fn empty_address_is_rejected_locally() {
        let client = NominatimGeocodingClient::new(&NominatimConfig::for_testing()).unwrap();
        assert!(matches!(
            client.geocode("   ").await,
            Err(RoutingError::LocationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn rate_limit_spaces_requests() {
        let config = NominatimConfig {
            min_interval_ms: 60,
            ..NominatimConfig::for_testing()
        };
        let client = NominatimGeocodingClient::new(&config).unwrap();

        let start = Instant::now();
        client.rate_limit().await;
        client.rate_limit().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
