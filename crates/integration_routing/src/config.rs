//! Provider client configuration

use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptive client identifier; Nominatim's usage policy rejects generic ones
pub const DEFAULT_USER_AGENT: &str = "Cargolink/1.0 (trip route estimation; ops@cargolink.example)";

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn validate_common(name: &str, base_url: &str, timeout_secs: u64) -> Result<(), String> {
    if base_url.is_empty() {
        return Err(format!("{name}: base_url must not be empty"));
    }
    if url::Url::parse(base_url).is_err() {
        return Err(format!("{name}: base_url is not a valid URL"));
    }
    if timeout_secs == 0 {
        return Err(format!("{name}: timeout_secs must be greater than 0"));
    }
    Ok(())
}

// ==============================
// Google Directions
// ==============================

/// Configuration for the Google Directions API
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleDirectionsConfig {
    /// Base URL (without the `/maps/api/directions/json` path)
    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// API key, sent as the `key` query parameter
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Response language
    #[serde(default = "default_language")]
    pub language: String,
}

impl fmt::Debug for GoogleDirectionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleDirectionsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .finish()
    }
}

fn default_google_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_language() -> String {
    "pt-BR".to_string()
}

impl GoogleDirectionsConfig {
    /// Configuration with default endpoint and the given key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_google_base_url(),
            api_key: api_key.into(),
            timeout_secs: default_timeout_secs(),
            language: default_language(),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_common("google", &self.base_url, self.timeout_secs)?;
        if self.api_key.trim().is_empty() {
            return Err("google: api_key must not be empty".to_string());
        }
        Ok(())
    }
}

// ==============================
// OpenRouteService
// ==============================

/// Configuration for the OpenRouteService directions API
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenRouteServiceConfig {
    /// Base URL (without the `/v2/directions` path)
    #[serde(default = "default_ors_base_url")]
    pub base_url: String,

    /// API key, sent in the `Authorization` header
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Routing profile
    #[serde(default = "default_ors_profile")]
    pub profile: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for OpenRouteServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouteServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("profile", &self.profile)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_ors_base_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_ors_profile() -> String {
    "driving-car".to_string()
}

impl OpenRouteServiceConfig {
    /// Configuration with default endpoint and profile
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_ors_base_url(),
            api_key: api_key.into(),
            profile: default_ors_profile(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_common("openrouteservice", &self.base_url, self.timeout_secs)?;
        if self.api_key.trim().is_empty() {
            return Err("openrouteservice: api_key must not be empty".to_string());
        }
        if self.profile.trim().is_empty() {
            return Err("openrouteservice: profile must not be empty".to_string());
        }
        Ok(())
    }
}

// ==============================
// Nominatim
// ==============================

/// Configuration for the Nominatim geocoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_nominatim_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,

    /// Forward lookup cache TTL in hours (0 to disable)
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Country code filter (e.g., "br"); empty for worldwide
    #[serde(default = "default_country_filter")]
    pub country_filter: String,

    /// Minimum spacing between requests in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// `User-Agent` sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_nominatim_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

const fn default_geocoding_timeout_secs() -> u64 {
    10
}

const fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_country_filter() -> String {
    "br".to_string()
}

const fn default_min_interval_ms() -> u64 {
    1100
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_nominatim_base_url(),
            timeout_secs: default_geocoding_timeout_secs(),
            cache_ttl_hours: default_cache_ttl_hours(),
            country_filter: default_country_filter(),
            min_interval_ms: default_min_interval_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            cache_ttl_hours: 0,
            min_interval_ms: 0,
            ..Default::default()
        }
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_hours > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_common("nominatim", &self.base_url, self.timeout_secs)?;
        if self.user_agent.trim().is_empty() {
            return Err("nominatim: user_agent must identify the application".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_defaults() {
        let config = GoogleDirectionsConfig::new("key-123");
        assert_eq!(config.base_url, "https://maps.googleapis.com");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn google_requires_key() {
        assert!(GoogleDirectionsConfig::new("  ").validate().is_err());
    }

    #[test]
    fn api_keys_are_redacted_in_debug() {
        let google = format!("{:?}", GoogleDirectionsConfig::new("super-secret"));
        let ors = format!("{:?}", OpenRouteServiceConfig::new("also-secret"));
        assert!(!google.contains("super-secret"));
        assert!(!ors.contains("also-secret"));
        assert!(ors.contains("REDACTED"));
    }

    #[test]
    fn api_keys_are_not_serialized() {
        let json = serde_json::to_string(&OpenRouteServiceConfig::new("k")).unwrap();
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn ors_defaults() {
        let config = OpenRouteServiceConfig::new("k");
        assert_eq!(config.profile, "driving-car");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn ors_rejects_bad_url() {
        let config = OpenRouteServiceConfig {
            base_url: "not a url".to_string(),
            ..OpenRouteServiceConfig::new("k")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nominatim_defaults() {
        let config = NominatimConfig::default();
        assert_eq!(config.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.min_interval_ms, 1100);
        assert!(config.caching_enabled());
        assert!(config.user_agent.starts_with("Cargolink/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nominatim_testing_config() {
        let config = NominatimConfig::for_testing();
        assert!(!config.caching_enabled());
        assert_eq!(config.min_interval_ms, 0);
    }

    #[test]
    fn nominatim_rejects_zero_timeout_and_blank_agent() {
        let config = NominatimConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NominatimConfig {
            user_agent: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nominatim_deserializes_with_defaults() {
        let config: NominatimConfig = serde_json::from_str(r#"{"country_filter": ""}"#).unwrap();
        assert!(config.country_filter.is_empty());
        assert_eq!(config.cache_ttl_hours, 24);
    }
}
