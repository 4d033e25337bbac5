//! HTTP middleware components
//!
//! Authentication, request correlation, response hardening and validated
//! extractors.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod validation;

pub use auth::{ANONYMOUS_USER_ID, ApiKeyAuth, ApiKeyAuthLayer, ApiKeyStore};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use security_headers::SecurityHeadersLayer;
pub use validation::{ValidatedJson, ValidatedQuery, ValidationError};
