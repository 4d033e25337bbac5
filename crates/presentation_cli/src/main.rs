//! Cargolink CLI
//!
//! Command-line interface for administration and testing.

#![allow(clippy::print_stdout)]

mod migrate_keys;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use application::{RouteResolver, UserRole};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use domain::{UserId, Vehicle, VehicleApprovalStatus, value_objects::GeoPoint};
use infrastructure::{ApiKeyHasher, DatabaseConfig, SqliteVehicleRegistry, create_pool};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cargolink CLI
#[derive(Parser)]
#[command(name = "cargolink-cli")]
#[command(author, version, about = "Cargolink logistics marketplace CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate distance, duration and arrival between two points
    ///
    /// Points are given as "lat,lng".
    /// Example: cargolink-cli estimate -- -23.5505,-46.6333 -22.9068,-43.1729
    Estimate {
        /// Origin as "lat,lng"
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        origin: GeoPoint,

        /// Destination as "lat,lng"
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        destination: GeoPoint,

        /// Departure time (RFC 3339), defaults to now
        #[arg(long)]
        departure: Option<DateTime<Utc>>,

        /// Compute the great-circle estimate locally instead of asking a server
        #[arg(long)]
        offline: bool,

        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,

        /// API key for the server
        #[arg(long, env = "CARGOLINK_API_KEY")]
        api_key: Option<String>,
    },

    /// Hash an API key using Argon2 for secure storage in configuration
    ///
    /// The output can be used in config.toml for secure API key storage.
    /// Example: cargolink-cli hash-api-key sk-my-secret-key --role customer
    HashApiKey {
        /// The plaintext API key to hash
        api_key: String,

        /// User the key authenticates as (UUID)
        #[arg(long, default_value = "YOUR-USER-UUID")]
        user_id: String,

        /// Role granted to the key
        #[arg(long, default_value = "driver", value_parser = parse_role)]
        role: UserRole,

        /// Verify the hash by re-hashing and comparing (for debugging)
        #[arg(long)]
        verify: bool,
    },

    /// Replace plaintext API keys in a config file with Argon2 hashes
    MigrateKeys {
        /// Configuration file to read
        #[arg(short, long, default_value = "config.toml")]
        input: PathBuf,

        /// Where to write the result (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Register a vehicle in the local registry
    ///
    /// Example: cargolink-cli register-vehicle --owner <uuid> --plate ABC1D23 --status approved
    RegisterVehicle {
        /// Path to the database
        #[arg(short, long, default_value = "cargolink.db")]
        database: String,

        /// Owning driver (UUID)
        #[arg(long)]
        owner: String,

        /// License plate
        #[arg(long)]
        plate: String,

        /// Make/model or other description
        #[arg(long)]
        description: Option<String>,

        /// Approval status: pending, approved, rejected or suspended
        #[arg(long, default_value = "pending", value_parser = parse_vehicle_status)]
        status: VehicleApprovalStatus,
    },

    /// Check system health (used by Docker healthcheck)
    Health {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },
}

/// Parse "lat,lng" into a validated point
fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{s}\""))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude: {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude: {e}"))?;
    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    s.parse().map_err(|e: domain::DomainError| e.to_string())
}

fn parse_vehicle_status(s: &str) -> Result<VehicleApprovalStatus, String> {
    s.parse().map_err(|e: domain::DomainError| e.to_string())
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Format endpoint URL
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Estimate {
            origin,
            destination,
            departure,
            offline,
            url,
            api_key,
        } => {
            let departure = departure.unwrap_or_else(Utc::now);

            if offline {
                let estimate = RouteResolver::default()
                    .resolve(&origin, &destination, departure)
                    .await;
                println!("Route estimate (offline, {}):", estimate.source);
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                debug!(%url, "Requesting route estimate");
                let mut request = reqwest::Client::new()
                    .post(endpoint_url(&url, "/routes/calculate"))
                    .json(&serde_json::json!({
                        "originLat": origin.latitude(),
                        "originLng": origin.longitude(),
                        "destLat": destination.latitude(),
                        "destLng": destination.longitude(),
                        "departureAt": departure,
                    }));
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }

                let resp = request.send().await?;
                let status = resp.status();
                let body = resp.json::<serde_json::Value>().await?;
                if !status.is_success() {
                    anyhow::bail!("Server answered HTTP {status}: {body}");
                }
                println!("Route estimate:");
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
        },

        Commands::HashApiKey {
            api_key,
            user_id,
            role,
            verify,
        } => {
            let hasher = ApiKeyHasher::new();
            let hash = hasher.hash(&api_key).context("Failed to hash API key")?;

            println!("API Key Hash (Argon2id):");
            println!();
            println!("{hash}");
            println!();
            println!("Add to config.toml:");
            println!("   [[security.api_keys]]");
            println!("   hash = \"{hash}\"");
            println!("   user_id = \"{user_id}\"");
            println!("   role = \"{role}\"");

            if verify {
                println!();
                match hasher.verify(&api_key, &hash) {
                    Ok(true) => println!("Verification: hash verified successfully"),
                    Ok(false) => println!("Verification: hash does NOT match (unexpected)"),
                    Err(e) => println!("Verification error: {e}"),
                }
            }
        },

        Commands::MigrateKeys {
            input,
            output,
            dry_run,
        } => {
            println!("Migrating API keys in {}", input.display());
            let result = migrate_keys::migrate_config(&input)?;
            println!(
                "  {} migrated, {} already hashed",
                result.migrated, result.already_hashed
            );

            if dry_run {
                println!("Dry run - no changes written");
            } else if let Some(path) = output {
                std::fs::write(&path, &result.output)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Written to {}", path.display());
            } else {
                println!();
                println!("{}", result.output);
            }
        },

        Commands::RegisterVehicle {
            database,
            owner,
            plate,
            description,
            status,
        } => {
            let owner = UserId::parse(&owner).context("Owner must be a UUID")?;
            let mut vehicle = Vehicle::new(owner, plate)?.with_status(status);
            if let Some(description) = description {
                vehicle = vehicle.with_description(description);
            }

            let config = DatabaseConfig {
                path: database,
                ..DatabaseConfig::default()
            };
            let pool = Arc::new(create_pool(&config)?);
            SqliteVehicleRegistry::new(pool).register(&vehicle).await?;

            println!(
                "Registered vehicle {} ({}) for {owner}: {}",
                vehicle.id, vehicle.plate, vehicle.approval_status
            );
        },

        Commands::Health { url } => {
            let client = reqwest::Client::new();
            match client.get(endpoint_url(&url, "/ready")).send().await {
                Ok(resp) if resp.status().is_success() => {
                    println!("Healthy");
                },
                Ok(resp) => {
                    println!("Unhealthy: HTTP {}", resp.status());
                    std::process::exit(1);
                },
                Err(e) => {
                    println!("Unhealthy: {e}");
                    std::process::exit(1);
                },
            }
        },
    }

    Ok(())
}
