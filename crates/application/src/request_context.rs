//! Request context for propagating authentication and request metadata
//!
//! Built by the HTTP auth middleware from the verified API key and passed to
//! service methods that need the caller's identity or role.
//!
//! # Examples
//!
//! ```
//! use application::{RequestContext, UserRole};
//! use domain::UserId;
//!
//! let user_id = UserId::new();
//! let ctx = RequestContext::new(user_id, UserRole::Driver);
//!
//! assert_eq!(ctx.user_id(), user_id);
//! assert!(ctx.is_driver());
//! assert!(!ctx.request_id().is_nil());
//! ```

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use domain::{DomainError, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role of the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Publishes and operates trips
    #[default]
    Driver,
    /// Attaches shipments to trips
    Customer,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "customer" => Ok(Self::Customer),
            _ => Err(DomainError::invalid_value("role", s)),
        }
    }
}

/// Context for a single request, carrying authentication and metadata
///
/// - `user_id`: the authenticated user making the request
/// - `role`: what the user may do in the marketplace
/// - `request_id`: a unique identifier for tracing/logging
/// - `timestamp`: when the request was received
#[derive(Debug, Clone)]
pub struct RequestContext {
    user_id: UserId,
    role: UserRole,
    request_id: Uuid,
    timestamp: DateTime<Utc>,
}

impl RequestContext {
    /// Create a new request context for the given user
    ///
    /// Generates a new request ID and captures the current timestamp.
    #[must_use]
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self::with_request_id(user_id, role, Uuid::now_v7())
    }

    /// Create a request context with a specific request ID
    ///
    /// Used when the ID comes from the `X-Request-Id` header so logs from
    /// the middleware and the service line up.
    #[must_use]
    pub fn with_request_id(user_id: UserId, role: UserRole, request_id: Uuid) -> Self {
        Self {
            user_id,
            role,
            request_id,
            timestamp: Utc::now(),
        }
    }

    /// Get the authenticated user ID
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Get the caller's role
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Whether the caller may publish trips
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self.role, UserRole::Driver)
    }

    /// Get the unique request identifier
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the timestamp when the request was received
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_request_id() {
        let user_id = UserId::new();
        let ctx1 = RequestContext::new(user_id, UserRole::Driver);
        let ctx2 = RequestContext::new(user_id, UserRole::Driver);

        assert_ne!(ctx1.request_id(), ctx2.request_id());
    }

    #[test]
    fn new_captures_current_timestamp() {
        let before = Utc::now();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);
        let after = Utc::now();

        assert!(ctx.timestamp() >= before);
        assert!(ctx.timestamp() <= after);
    }

    #[test]
    fn with_request_id_uses_provided_id() {
        let user_id = UserId::new();
        let request_id = Uuid::new_v4();
        let ctx = RequestContext::with_request_id(user_id, UserRole::Customer, request_id);

        assert_eq!(ctx.request_id(), request_id);
        assert_eq!(ctx.user_id(), user_id);
        assert_eq!(ctx.role(), UserRole::Customer);
        assert!(!ctx.is_driver());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Driver".parse::<UserRole>().unwrap(), UserRole::Driver);
        assert_eq!("customer".parse::<UserRole>().unwrap(), UserRole::Customer);
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_displays_lowercase() {
        assert_eq!(UserRole::Customer.to_string(), "customer");
        assert_eq!(UserRole::default(), UserRole::Driver);
    }
}
