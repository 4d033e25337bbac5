//! HTTP request handlers

pub mod health;
pub mod routing;
pub mod trips;
