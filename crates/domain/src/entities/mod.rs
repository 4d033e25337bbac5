//! Domain entities - Objects with identity and lifecycle

mod trip;
mod vehicle;

pub use trip::{LocationFix, Trip, TripError, TripOperation, TripStatus};
pub use vehicle::{Vehicle, VehicleApprovalStatus};
