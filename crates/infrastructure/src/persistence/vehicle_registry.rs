//! SQLite-based vehicle registry

use std::sync::Arc;

use application::{error::ApplicationError, ports::VehicleRegistry};
use async_trait::async_trait;
use domain::{
    entities::{Vehicle, VehicleApprovalStatus},
    value_objects::{UserId, VehicleId},
};
use rusqlite::{OptionalExtension, Row, params};
use tokio::task;
use tracing::{debug, instrument};

use super::{
    connection::ConnectionPool,
    sql::{parse_column, timestamp, timestamp_column},
};

/// SQLite-based vehicle registry
///
/// When an owner has several matching vehicles the most recently
/// registered one wins.
#[derive(Debug, Clone)]
pub struct SqliteVehicleRegistry {
    pool: Arc<ConnectionPool>,
}

impl SqliteVehicleRegistry {
    /// Create a new SQLite vehicle registry
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Store a newly registered vehicle
    #[instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    pub async fn register(&self, vehicle: &Vehicle) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let vehicle = vehicle.clone();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            conn.execute(
                "INSERT INTO vehicles (id, owner_id, plate, description, approval_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    vehicle.id.to_string(),
                    vehicle.owner_id.to_string(),
                    vehicle.plate,
                    vehicle.description,
                    vehicle.approval_status.as_str(),
                    timestamp(vehicle.created_at),
                ],
            )
            .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            debug!("Registered vehicle");
            Ok(())
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    /// Change a vehicle's approval status
    #[instrument(skip(self), fields(vehicle_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        id: &VehicleId,
        status: VehicleApprovalStatus,
    ) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = *id;

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let affected = conn
                .execute(
                    "UPDATE vehicles SET approval_status = ?1 WHERE id = ?2",
                    params![status.as_str(), id.to_string()],
                )
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            if affected == 0 {
                return Err(ApplicationError::NotFound(format!(
                    "Vehicle {id} not found"
                )));
            }
            Ok(())
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    async fn find_for_owner(
        &self,
        owner_id: &UserId,
        approved_only: bool,
    ) -> Result<Option<Vehicle>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let owner_id = owner_id.to_string();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            let sql = if approved_only {
                "SELECT id, owner_id, plate, description, approval_status, created_at
                 FROM vehicles WHERE owner_id = ?1 AND approval_status = 'approved'
                 ORDER BY created_at DESC LIMIT 1"
            } else {
                "SELECT id, owner_id, plate, description, approval_status, created_at
                 FROM vehicles WHERE owner_id = ?1
                 ORDER BY created_at DESC LIMIT 1"
            };

            conn.query_row(sql, [&owner_id], row_to_vehicle)
                .optional()
                .map_err(|e| ApplicationError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

#[async_trait]
impl VehicleRegistry for SqliteVehicleRegistry {
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    async fn find_approved_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Vehicle>, ApplicationError> {
        self.find_for_owner(owner_id, true).await
    }

    #[instrument(skip(self), fields(owner_id = %owner_id))]
    async fn find_any_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Vehicle>, ApplicationError> {
        self.find_for_owner(owner_id, false).await
    }

    #[instrument(skip(self), fields(vehicle_id = %id))]
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;

            conn.query_row(
                "SELECT id, owner_id, plate, description, approval_status, created_at
                 FROM vehicles WHERE id = ?1",
                [&id],
                row_to_vehicle,
            )
            .optional()
            .map_err(|e| ApplicationError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

fn row_to_vehicle(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: parse_column(row, "id", VehicleId::parse)?,
        owner_id: parse_column(row, "owner_id", UserId::parse)?,
        plate: row.get("plate")?,
        description: row.get("description")?,
        approval_status: parse_column(row, "approval_status", str::parse::<VehicleApprovalStatus>)?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
