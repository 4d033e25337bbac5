//! Security configuration: API keys.

use application::UserRole;
use serde::{Deserialize, Serialize};

/// A hashed API key and the caller it identifies
///
/// Keys must be pre-hashed in Argon2id PHC format.
/// Use `cargolink-cli hash-api-key <key>` to produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// Argon2id hash of the API key in PHC format
    /// Example: "$argon2id$v=19$m=19456,t=2,p=1$..."
    pub hash: String,

    /// User ID (UUID) associated with this API key
    pub user_id: String,

    /// Role granted to requests using this key
    #[serde(default)]
    pub role: UserRole,
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Hashed API keys for authentication
    ///
    /// With no keys configured, authentication is disabled and every request
    /// runs as an anonymous driver.
    ///
    /// Example in config.toml:
    /// ```toml
    /// [[security.api_keys]]
    /// hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// user_id = "550e8400-e29b-41d4-a716-446655440000"
    /// role = "driver"
    /// ```
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

impl SecurityConfig {
    /// Number of API key entries whose hash is not in Argon2 PHC format
    #[must_use]
    pub fn count_plaintext_keys(&self) -> usize {
        self.api_keys
            .iter()
            .filter(|entry| !entry.hash.starts_with("$argon2"))
            .count()
    }

    /// Check if the configuration has any API keys configured
    #[must_use]
    pub fn has_api_keys(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_driver() {
        let json = r#"{"api_keys":[{"hash":"$argon2id$v=19$m=19456,t=2,p=1$abc","user_id":"550e8400-e29b-41d4-a716-446655440000"}]}"#;
        let config: SecurityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_keys[0].role, UserRole::Driver);
        assert!(config.has_api_keys());
    }

    #[test]
    fn counts_plaintext_keys() {
        let mut config = SecurityConfig::default();
        assert_eq!(config.count_plaintext_keys(), 0);

        config.api_keys.push(ApiKeyEntry {
            hash: "sk-plaintext".to_string(),
            user_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            role: UserRole::Customer,
        });
        config.api_keys.push(ApiKeyEntry {
            hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            user_id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string(),
            role: UserRole::Driver,
        });
        assert_eq!(config.count_plaintext_keys(), 1);
    }
}
