//! Vehicle selection for new trips
//!
//! Trips created without a vehicle get the driver's approved one. A vehicle
//! named explicitly must belong to the driver.

use std::sync::Arc;

use domain::value_objects::{UserId, VehicleId};
use tracing::{debug, instrument, warn};

use crate::{error::ApplicationError, ports::VehicleRegistry};

/// Picks the driver's approved vehicle
pub struct VehicleAssigner {
    registry: Arc<dyn VehicleRegistry>,
}

impl std::fmt::Debug for VehicleAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleAssigner").finish_non_exhaustive()
    }
}

impl VehicleAssigner {
    #[must_use]
    pub fn new(registry: Arc<dyn VehicleRegistry>) -> Self {
        Self { registry }
    }

    /// Return the driver's approved vehicle
    ///
    /// When there is none, a second lookup distinguishes "your vehicle is
    /// not approved yet" from "you have no vehicle".
    #[instrument(skip(self), fields(driver_id = %driver_id))]
    pub async fn assign(&self, driver_id: &UserId) -> Result<VehicleId, ApplicationError> {
        if let Some(vehicle) = self.registry.find_approved_for_owner(driver_id).await? {
            debug!(vehicle_id = %vehicle.id, "Assigned approved vehicle");
            return Ok(vehicle.id);
        }

        match self.registry.find_any_for_owner(driver_id).await? {
            Some(vehicle) => Err(ApplicationError::VehicleNotApproved {
                status: vehicle.approval_status,
            }),
            None => Err(ApplicationError::NoVehicleRegistered),
        }
    }

    /// Check that an explicitly chosen vehicle is registered to the driver
    ///
    /// Unknown vehicles and vehicles of other drivers are rejected alike.
    #[instrument(skip(self), fields(driver_id = %driver_id, vehicle_id = %vehicle_id))]
    pub async fn confirm_owned(
        &self,
        driver_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<VehicleId, ApplicationError> {
        match self.registry.find_by_id(vehicle_id).await? {
            Some(vehicle) if vehicle.owner_id == *driver_id => Ok(vehicle.id),
            _ => {
                warn!("Explicit vehicle is not registered to the driver");
                Err(ApplicationError::Forbidden(format!(
                    "Vehicle {vehicle_id} is not registered to you"
                )))
            },
        }
    }
}
