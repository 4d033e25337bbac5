//! Application layer - Use cases and orchestration
//!
//! Contains the route resolution chain, geocoding, vehicle assignment and the
//! trip lifecycle, plus the port definitions adapters implement.

pub mod error;
pub mod ports;
pub mod request_context;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use request_context::{RequestContext, UserRole};
pub use services::*;
