//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `security`: API keys
//! - `database`: SQLite database settings
//! - `integrations`: directions providers and geocoding
//!
//! Sources are layered: built-in defaults, then an optional `config.toml`,
//! then `CARGOLINK_`-prefixed environment variables using `__` between
//! nested keys (e.g. `CARGOLINK_ROUTING__GOOGLE__API_KEY`).

mod database;
mod integrations;
mod security;
mod server;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use database::DatabaseConfig;
pub use integrations::{
    GeocodingAppConfig, GoogleDirectionsAppConfig, OpenRouteServiceAppConfig, RoutingAppConfig,
};
pub use security::{ApiKeyEntry, SecurityConfig};
pub use server::{LogFormat, ServerConfig};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CARGOLINK";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Configuration rejected by [`AppConfig::validate`]
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{section}: {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

impl ConfigValidationError {
    fn invalid(section: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            section,
            message: message.into(),
        }
    }
}

/// Application environment (development or production)
///
/// Controls security validation strictness and default behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - relaxed security warnings
    #[default]
    Development,
    /// Production environment - strict security validation
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development or production)
    ///
    /// In production, critical security warnings prevent startup unless
    /// CARGOLINK_ALLOW_INSECURE_CONFIG=true.
    #[serde(default)]
    pub environment: Option<Environment>,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Security configuration
    #[serde(default)]
    pub security: SecurityConfig,

    /// Directions providers; each is used only when its API key is set
    #[serde(default)]
    pub routing: RoutingAppConfig,

    /// Address lookup
    #[serde(default)]
    pub geocoding: GeocodingAppConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the named file (extension optional) and the environment
    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Whether the environment is set to production
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Some(Environment::Production)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::invalid(
                "server",
                "port must be greater than 0",
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigValidationError::invalid(
                "database",
                "path must not be empty",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigValidationError::invalid(
                "database",
                "max_connections must be greater than 0",
            ));
        }
        for (index, entry) in self.security.api_keys.iter().enumerate() {
            if uuid::Uuid::parse_str(&entry.user_id).is_err() {
                return Err(ConfigValidationError::invalid(
                    "security",
                    format!("api_keys[{index}].user_id is not a UUID"),
                ));
            }
        }
        if self.routing.attempt_timeout_secs == 0 {
            return Err(ConfigValidationError::invalid(
                "routing",
                "attempt_timeout_secs must be greater than 0",
            ));
        }
        if let Some(google) = self.routing.enabled_google() {
            google
                .to_client_config()
                .validate()
                .map_err(|e| ConfigValidationError::invalid("routing", e))?;
        }
        if let Some(ors) = self.routing.enabled_openrouteservice() {
            ors.to_client_config()
                .validate()
                .map_err(|e| ConfigValidationError::invalid("routing", e))?;
        }
        if self.geocoding.enabled {
            self.geocoding
                .nominatim
                .validate()
                .map_err(|e| ConfigValidationError::invalid("geocoding", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::UserRole;
    use secrecy::SecretString;

    #[test]
    fn environment_default_is_development() {
        assert_eq!(Environment::default(), Environment::Development);
    }

    #[test]
    fn environment_from_str() {
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "DEVELOPMENT".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("server:"));
    }

    #[test]
    fn api_key_user_must_be_uuid() {
        let mut config = AppConfig::default();
        config.security.api_keys.push(ApiKeyEntry {
            hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            user_id: "driver-1".to_string(),
            role: UserRole::Driver,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_keys[0]"));
    }

    #[test]
    fn zero_attempt_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.routing.attempt_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn enabled_provider_with_bad_url_is_rejected() {
        let mut config = AppConfig::default();
        config.routing.google = Some(GoogleDirectionsAppConfig {
            api_key: SecretString::from("key"),
            base_url: Some("not a url".to_string()),
            timeout_secs: None,
            language: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_nested_sections() {
        let json = r#"{
            "environment": "production",
            "server": {"port": 8080, "log_format": "json"},
            "routing": {"attempt_timeout_secs": 5, "openrouteservice": {"api_key": "ors"}},
            "geocoding": {"enabled": false}
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.is_production());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.routing.attempt_timeout_secs, 5);
        assert!(config.routing.enabled_openrouteservice().is_some());
        assert!(config.routing.enabled_google().is_none());
        assert!(!config.geocoding.enabled);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cargolink.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 4100

[database]
path = "trips.db"

[[security.api_keys]]
hash = "$argon2id$v=19$m=19456,t=2,p=1$abc$def"
user_id = "550e8400-e29b-41d4-a716-446655440000"
role = "customer"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.database.path, "trips.db");
        assert_eq!(config.security.api_keys[0].role, UserRole::Customer);
        assert!(config.validate().is_ok());
    }
}
