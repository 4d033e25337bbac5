//! Application-level errors

use domain::{DomainError, TripError, TripOperation, TripStatus, VehicleApprovalStatus};
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource exists but belongs to someone else
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller's role may not perform this action
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Operation not legal from the trip's current status
    #[error("Cannot {operation} trip: trip is {status}")]
    InvalidTransition {
        status: TripStatus,
        operation: TripOperation,
    },

    /// The driver's vehicle exists but cannot be used yet
    #[error("Your vehicle is {status}. Trips can be published once it is approved")]
    VehicleNotApproved { status: VehicleApprovalStatus },

    /// The driver has no vehicle at all
    #[error("No vehicle registered. Register a vehicle before publishing trips")]
    NoVehicleRegistered,

    /// Request input failed validation
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Whether the error is an expected, caller-actionable outcome
    ///
    /// Anything else raised while creating a trip is reported as a generic
    /// creation failure.
    pub const fn is_actionable(&self) -> bool {
        matches!(
            self,
            Self::Domain(_)
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::NotAuthorized(_)
                | Self::InvalidTransition { .. }
                | Self::VehicleNotApproved { .. }
                | Self::NoVehicleRegistered
                | Self::ValidationFailed(_)
        )
    }
}

impl From<TripError> for ApplicationError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::NotOwner { .. } => Self::Forbidden(err.to_string()),
            TripError::InvalidTransition {
                status, operation, ..
            } => Self::InvalidTransition { status, operation },
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::TripId;

    use super::*;

    #[test]
    fn not_owner_maps_to_forbidden() {
        let err: ApplicationError = TripError::NotOwner {
            trip_id: TripId::new(),
        }
        .into();
        assert!(matches!(err, ApplicationError::Forbidden(_)));
    }

    #[test]
    fn invalid_transition_keeps_status_and_operation() {
        let err: ApplicationError = TripError::InvalidTransition {
            trip_id: TripId::new(),
            status: TripStatus::Cancelled,
            operation: TripOperation::Start,
        }
        .into();
        assert_eq!(err.to_string(), "Cannot start trip: trip is cancelled");
    }

    #[test]
    fn vehicle_messages_are_actionable() {
        let pending = ApplicationError::VehicleNotApproved {
            status: VehicleApprovalStatus::Pending,
        };
        assert!(pending.to_string().contains("pending approval"));
        assert!(pending.is_actionable());
        assert!(
            ApplicationError::NoVehicleRegistered
                .to_string()
                .contains("Register a vehicle")
        );
    }

    #[test]
    fn internal_errors_are_not_actionable() {
        assert!(!ApplicationError::Internal("db".into()).is_actionable());
        assert!(!ApplicationError::ExternalService("x".into()).is_actionable());
    }
}
