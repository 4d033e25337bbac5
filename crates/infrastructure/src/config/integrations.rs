//! External integration configuration: directions providers and geocoding.

use integration_routing::{GoogleDirectionsConfig, NominatimConfig, OpenRouteServiceConfig};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::default_true;

// ==============================
// Routing
// ==============================

/// Directions provider chain configuration
///
/// Providers are tried primary first, then secondary; the great-circle
/// estimate is always last and needs no configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingAppConfig {
    /// Budget for a single provider attempt, in seconds (default: 10)
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// Primary provider (Google Directions)
    #[serde(default)]
    pub google: Option<GoogleDirectionsAppConfig>,

    /// Secondary provider (OpenRouteService)
    #[serde(default)]
    pub openrouteservice: Option<OpenRouteServiceAppConfig>,
}

const fn default_attempt_timeout() -> u64 {
    10
}

impl Default for RoutingAppConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout(),
            google: None,
            openrouteservice: None,
        }
    }
}

impl RoutingAppConfig {
    /// Google settings, if configured with a non-blank key
    #[must_use]
    pub fn enabled_google(&self) -> Option<&GoogleDirectionsAppConfig> {
        self.google
            .as_ref()
            .filter(|g| !g.api_key.expose_secret().trim().is_empty())
    }

    /// OpenRouteService settings, if configured with a non-blank key
    #[must_use]
    pub fn enabled_openrouteservice(&self) -> Option<&OpenRouteServiceAppConfig> {
        self.openrouteservice
            .as_ref()
            .filter(|o| !o.api_key.expose_secret().trim().is_empty())
    }
}

/// Google Directions provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleDirectionsAppConfig {
    /// API key (sensitive - uses `SecretString`)
    #[serde(skip_serializing)]
    pub api_key: SecretString,

    /// Override the API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Response language (default: pt-BR)
    #[serde(default)]
    pub language: Option<String>,
}

impl std::fmt::Debug for GoogleDirectionsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDirectionsAppConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .finish()
    }
}

impl GoogleDirectionsAppConfig {
    /// Convert to `integration_routing`'s `GoogleDirectionsConfig`
    #[must_use]
    pub fn to_client_config(&self) -> GoogleDirectionsConfig {
        let mut config = GoogleDirectionsConfig::new(self.api_key.expose_secret());
        if let Some(ref base_url) = self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(ref language) = self.language {
            config.language.clone_from(language);
        }
        config
    }
}

/// OpenRouteService provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenRouteServiceAppConfig {
    /// API key (sensitive - uses `SecretString`)
    #[serde(skip_serializing)]
    pub api_key: SecretString,

    /// Override the API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Routing profile (default: driving-car)
    #[serde(default)]
    pub profile: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for OpenRouteServiceAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouteServiceAppConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("profile", &self.profile)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenRouteServiceAppConfig {
    /// Convert to `integration_routing`'s `OpenRouteServiceConfig`
    #[must_use]
    pub fn to_client_config(&self) -> OpenRouteServiceConfig {
        let mut config = OpenRouteServiceConfig::new(self.api_key.expose_secret());
        if let Some(ref base_url) = self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(ref profile) = self.profile {
            config.profile.clone_from(profile);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config
    }
}

// ==============================
// Geocoding
// ==============================

/// Geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingAppConfig {
    /// When false, geocode endpoints always report "not found"
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Nominatim settings
    #[serde(default)]
    pub nominatim: NominatimConfig,
}

impl Default for GeocodingAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nominatim: NominatimConfig::default(),
        }
    }
}
