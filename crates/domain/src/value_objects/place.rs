//! Named place: a label attached to a geographic point

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoPoint;
use crate::errors::DomainError;

/// A named location such as a trip origin or destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Human-readable name ("Terminal Rodoviário Tietê")
    pub name: String,
    /// Coordinates of the place
    pub point: GeoPoint,
}

impl Place {
    /// Create a named place
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the name is blank.
    pub fn new(name: impl Into<String>, point: GeoPoint) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "place name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: trimmed.to_string(),
            point,
        })
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.point)
    }
}
