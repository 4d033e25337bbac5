//! API key migration
//!
//! Replaces plaintext values in `[[security.api_keys]]` entries of a
//! configuration file with Argon2id hashes. Every other key of the file and
//! of each entry (`user_id`, `role`) is preserved.
//!
//! ```bash
//! cargolink-cli migrate-keys --input config.toml --dry-run
//! cargolink-cli migrate-keys --input config.toml --output config.toml
//! ```

use std::{fs, path::Path};

use infrastructure::ApiKeyHasher;
use thiserror::Error;

/// Errors that can occur during key migration
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to read input file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to hash key for user {user_id}: {reason}")]
    Hash { user_id: String, reason: String },
}

/// Outcome of a migration run
#[derive(Debug)]
pub struct MigrationResult {
    /// Entries that already held an Argon2 hash
    pub already_hashed: usize,
    /// Entries whose plaintext key was replaced by a hash
    pub migrated: usize,
    /// The migrated configuration content
    pub output: String,
}

/// Hash every plaintext API key in the configuration at `input_path`
///
/// Nothing is written; the caller decides what to do with `output`.
pub fn migrate_config(input_path: &Path) -> Result<MigrationResult, MigrationError> {
    let content = fs::read_to_string(input_path)?;
    let mut config: toml::Table = toml::from_str(&content)?;

    let hasher = ApiKeyHasher::new();
    let mut already_hashed = 0;
    let mut migrated = 0;

    let entries = config
        .get_mut("security")
        .and_then(toml::Value::as_table_mut)
        .and_then(|security| security.get_mut("api_keys"))
        .and_then(toml::Value::as_array_mut);

    for entry in entries.into_iter().flatten() {
        let Some(table) = entry.as_table_mut() else {
            continue;
        };
        let Some(key) = table.get("hash").and_then(toml::Value::as_str) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        if ApiKeyHasher::is_hashed(key) {
            already_hashed += 1;
            continue;
        }

        let user_id = table
            .get("user_id")
            .and_then(toml::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let hash = hasher.hash(key).map_err(|e| MigrationError::Hash {
            user_id: user_id.clone(),
            reason: e.to_string(),
        })?;
        table.insert("hash".to_string(), toml::Value::String(hash));
        migrated += 1;
        println!("  Migrated plaintext key (user_id: {user_id})");
    }

    Ok(MigrationResult {
        already_hashed,
        migrated,
        output: toml::to_string_pretty(&config)?,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn plaintext_keys_are_hashed_and_roles_kept() {
        let config = r#"
[[security.api_keys]]
hash = "sk-driver-key"
user_id = "550e8400-e29b-41d4-a716-446655440001"
role = "driver"

[[security.api_keys]]
hash = "sk-customer-key"
user_id = "550e8400-e29b-41d4-a716-446655440002"
role = "customer"
"#;
        let file = create_temp_config(config);
        let result = migrate_config(file.path()).unwrap();

        assert_eq!(result.migrated, 2);
        assert_eq!(result.already_hashed, 0);
        assert!(!result.output.contains("sk-driver-key"));
        assert!(result.output.contains("$argon2id"));
        assert!(result.output.contains("role = \"customer\""));

        let hasher = ApiKeyHasher::new();
        let migrated: toml::Table = toml::from_str(&result.output).unwrap();
        let first = &migrated["security"]["api_keys"][0];
        assert!(
            hasher
                .verify("sk-driver-key", first["hash"].as_str().unwrap())
                .unwrap()
        );
    }

    #[test]
    fn skip_already_hashed_keys() {
        let hash = ApiKeyHasher::new().hash("sk-test").unwrap();
        let config = format!(
            r#"
[[security.api_keys]]
hash = "{hash}"
user_id = "550e8400-e29b-41d4-a716-446655440001"
"#
        );
        let file = create_temp_config(&config);
        let result = migrate_config(file.path()).unwrap();

        assert_eq!(result.migrated, 0);
        assert_eq!(result.already_hashed, 1);
        assert!(result.output.contains(&hash));
    }

    #[test]
    fn preserve_other_config_sections() {
        let config = r#"
[server]
host = "0.0.0.0"
port = 3000

[routing.google]
api_key = "maps-key"

[[security.api_keys]]
hash = "sk-test"
user_id = "550e8400-e29b-41d4-a716-446655440001"
"#;
        let file = create_temp_config(config);
        let result = migrate_config(file.path()).unwrap();

        assert!(result.output.contains("host = \"0.0.0.0\""));
        assert!(result.output.contains("api_key = \"maps-key\""));
        assert_eq!(result.migrated, 1);
    }

    #[test]
    fn config_without_keys_is_unchanged() {
        let file = create_temp_config("[server]\nport = 3000\n");
        let result = migrate_config(file.path()).unwrap();

        assert_eq!(result.migrated, 0);
        assert_eq!(result.already_hashed, 0);
        assert!(result.output.contains("port = 3000"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let file = create_temp_config("[security\n");
        assert!(matches!(
            migrate_config(file.path()),
            Err(MigrationError::Parse(_))
        ));
    }
}
