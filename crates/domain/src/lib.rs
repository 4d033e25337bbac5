//! Domain layer for Cargolink
//!
//! Contains the trip aggregate and its state machine, vehicle records,
//! geographic value objects, and the pure geo math used for route estimates.
//! This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod geo_math;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
