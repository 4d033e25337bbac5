//! Vehicle entity - A driver's registered vehicle as seen by trip creation

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::DomainError,
    value_objects::{UserId, VehicleId},
};

/// Approval state of a vehicle in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleApprovalStatus {
    /// Documents submitted, awaiting review
    #[default]
    Pending,
    /// Cleared to carry trips
    Approved,
    /// Documents refused
    Rejected,
    /// Approval withdrawn
    Suspended,
}

impl VehicleApprovalStatus {
    /// Stable string form used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
        }
    }

    /// Wording used in user-facing messages
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
        }
    }

    /// Whether trips may be published with this vehicle
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for VehicleApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "suspended" => Ok(Self::Suspended),
            _ => Err(DomainError::invalid_value("vehicle approval status", s)),
        }
    }
}

/// A vehicle owned by a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: UserId,
    /// License plate as registered
    pub plate: String,
    /// Make/model or other free-form description
    pub description: Option<String>,
    pub approval_status: VehicleApprovalStatus,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Register a new vehicle, pending approval
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the plate is blank.
    pub fn new(owner_id: UserId, plate: impl Into<String>) -> Result<Self, DomainError> {
        let plate = plate.into().trim().to_uppercase();
        if plate.is_empty() {
            return Err(DomainError::ValidationError(
                "vehicle plate cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: VehicleId::new(),
            owner_id,
            plate,
            description: None,
            approval_status: VehicleApprovalStatus::Pending,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: VehicleApprovalStatus) -> Self {
        self.approval_status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicle_is_pending_with_normalized_plate() {
        let vehicle = Vehicle::new(UserId::new(), "  abc1d23 ").unwrap();
        assert_eq!(vehicle.plate, "ABC1D23");
        assert_eq!(vehicle.approval_status, VehicleApprovalStatus::Pending);
        assert!(!vehicle.approval_status.is_approved());
    }

    #[test]
    fn blank_plate_is_rejected() {
        assert!(Vehicle::new(UserId::new(), "   ").is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(VehicleApprovalStatus::Pending.to_string(), "pending approval");
        assert_eq!(VehicleApprovalStatus::Suspended.label(), "suspended");
        assert_eq!(VehicleApprovalStatus::Approved.as_str(), "approved");
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            VehicleApprovalStatus::Pending,
            VehicleApprovalStatus::Approved,
            VehicleApprovalStatus::Rejected,
            VehicleApprovalStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<VehicleApprovalStatus>().unwrap(), status);
        }
        assert!("lost".parse::<VehicleApprovalStatus>().is_err());
    }

    #[test]
    fn builders() {
        let vehicle = Vehicle::new(UserId::new(), "XYZ9A87")
            .unwrap()
            .with_description("VW Delivery 9.170")
            .with_status(VehicleApprovalStatus::Approved);
        assert_eq!(vehicle.description.as_deref(), Some("VW Delivery 9.170"));
        assert!(vehicle.approval_status.is_approved());
    }
}
