//! Application services - Use case implementations

mod geocode_resolver;
pub mod navigation_links;
mod route_resolver;
mod trip_service;
mod vehicle_assigner;

pub use geocode_resolver::GeocodeResolver;
pub use route_resolver::{DEFAULT_ATTEMPT_TIMEOUT, RouteResolver};
pub use trip_service::{NewTrip, TripService, TripUpdate};
pub use vehicle_assigner::VehicleAssigner;
