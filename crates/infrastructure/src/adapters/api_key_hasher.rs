//! API key hashing with Argon2id
//!
//! Keys are stored in configuration as PHC strings and verified per request.
//!
//! # Examples
//!
//! ```
//! use infrastructure::adapters::ApiKeyHasher;
//!
//! let hasher = ApiKeyHasher::new();
//! let hash = hasher.hash("clk-driver-key").unwrap();
//!
//! assert!(hasher.verify("clk-driver-key", &hash).unwrap());
//! assert!(!hasher.verify("clk-other-key", &hash).unwrap());
//! ```

use argon2::{
    Argon2, PasswordHash, PasswordHasher as ArgonPasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur during API key hashing operations
#[derive(Debug, Error)]
pub enum ApiKeyHashError {
    /// Failed to hash the API key
    #[error("Failed to hash API key: {0}")]
    HashingFailed(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid hash format: {0}")]
    InvalidHashFormat(String),
}

/// Argon2id hasher with the crate's default parameters (19 MiB, t=2, p=1)
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyHasher;

impl ApiKeyHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash an API key into a PHC string with a fresh random salt
    #[instrument(skip(self, api_key))]
    pub fn hash(&self, api_key: &str) -> Result<String, ApiKeyHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(api_key.as_bytes(), &salt)
            .map_err(|e| ApiKeyHashError::HashingFailed(e.to_string()))?;

        debug!("Hashed API key");
        Ok(hash.to_string())
    }

    /// Verify an API key against a stored PHC hash
    ///
    /// Returns `Ok(false)` for a wrong key and an error only when the stored
    /// hash cannot be parsed.
    #[instrument(skip(self, api_key, hash))]
    pub fn verify(&self, api_key: &str, hash: &str) -> Result<bool, ApiKeyHashError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApiKeyHashError::InvalidHashFormat(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(api_key.as_bytes(), &parsed)
            .is_ok())
    }

    /// Whether a configured value looks like an Argon2 PHC hash
    #[must_use]
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with("$argon2")
    }
}
