//! Value Objects - Immutable, identity-less domain primitives

mod geo_point;
mod ids;
mod place;
mod route_estimate;

pub use geo_point::GeoPoint;
pub use ids::{TripId, UserId, VehicleId};
pub use place::Place;
pub use route_estimate::{RouteEstimate, RouteSource};
