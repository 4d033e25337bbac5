//! Routing and geocoding error types

use thiserror::Error;

/// Errors that can occur when talking to a directions or geocoding service
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Connection to the service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request failed with a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Credential missing, rejected, or quota exhausted
    #[error("Request denied: {0}")]
    Denied(String),

    /// Failed to parse the service response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying (if provided by the API)
        retry_after_secs: Option<u64>,
    },

    /// The service answered but found no route between the points
    #[error("No route found from {from} to {to}")]
    NoRouteFound {
        /// Origin description
        from: String,
        /// Destination description
        to: String,
    },

    /// Address or coordinates could not be resolved
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl RoutingError {
    /// Map a reqwest send error, distinguishing timeouts
    pub(crate) fn from_send(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RoutingError::NoRouteFound {
            from: "-23.5505,-46.6333".to_string(),
            to: "-22.9068,-43.1729".to_string(),
        };
        assert!(err.to_string().contains("-23.5505,-46.6333"));

        let err = RoutingError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10"));
    }
}
