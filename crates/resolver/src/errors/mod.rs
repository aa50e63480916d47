//! Error types and retry classification for the resolver crate.
//!
//! This module provides:
//! - [`GeocodeError`]: The main error enum for all resolution operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while resolving an address.
///
/// Only upstream connectivity problems reach the caller of a resolution
/// session. Missing optional fields in candidates are never errors, and an
/// empty answer is a valid outcome.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// The request to an upstream service timed out.
    #[error("Timeout: {service}")]
    Timeout {
        /// The service that timed out
        service: String,
    },

    /// The upstream service answered with an error status.
    #[error("Upstream error: {service} ({status}) - {message}")]
    Upstream {
        /// The service that returned the error
        service: String,
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The upstream rejected the request itself (HTTP 400 on interpolation).
    #[error("Bad request: {service} - {message}")]
    BadRequest {
        /// The service that rejected the request
        service: String,
        /// Response body or reason
        message: String,
    },

    /// The upstream could not be reached at all.
    #[error("Cannot connect to {service}, service probably down: {message}")]
    Connection {
        /// The unreachable service
        service: String,
        /// Underlying transport error
        message: String,
    },

    /// The upstream answered with a body that could not be decoded.
    #[error("Malformed payload from {service}: {message}")]
    MalformedPayload {
        /// The service that sent the payload
        service: String,
        /// Decoder error
        message: String,
    },

    /// Caller input was rejected before any upstream call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The resolver configuration is unusable (bad regex, zero threshold...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A transient failure persisted for the whole attempt budget.
    #[error("Cannot get {service} results after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// The service being called
        service: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error seen
        message: String,
    },

    /// A network error occurred while communicating with a service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GeocodeError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: Don't retry, the error is terminal
    /// - [`RetryClass::WithBackoff`]: Retry after a growing delay
    /// - [`RetryClass::NoResult`]: Treat the call as an empty answer
    ///
    /// # Examples
    ///
    /// ```
    /// use geolocate_resolver::errors::{GeocodeError, RetryClass};
    ///
    /// let error = GeocodeError::Timeout { service: "pelias".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = GeocodeError::InvalidInput("empty address".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry with backoff
            Self::Timeout { .. } | Self::Upstream { .. } => RetryClass::WithBackoff,

            // Rejected request - nothing to find
            Self::BadRequest { .. } => RetryClass::NoResult,

            // Terminal errors - never retry
            Self::Connection { .. }
            | Self::MalformedPayload { .. }
            | Self::InvalidInput(_)
            | Self::InvalidConfig(_)
            | Self::RetriesExhausted { .. }
            | Self::Network(_) => RetryClass::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = GeocodeError::Timeout {
            service: "pelias".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_upstream_status_retries_with_backoff() {
        let error = GeocodeError::Upstream {
            service: "pelias".to_string(),
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_bad_request_means_no_result() {
        let error = GeocodeError::BadRequest {
            service: "interpolation".to_string(),
            message: "invalid number".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NoResult);
    }

    #[test]
    fn test_connection_refused_never_retries() {
        let error = GeocodeError::Connection {
            service: "pelias".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_exhausted_never_retries() {
        let error = GeocodeError::RetriesExhausted {
            service: "pelias".to_string(),
            attempts: 6,
            message: "503".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = GeocodeError::RetriesExhausted {
            service: "pelias".to_string(),
            attempts: 6,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Cannot get pelias results after 6 attempts: Service Unavailable"
        );

        let error = GeocodeError::InvalidInput("Cannot parse best id 'abc'".to_string());
        assert_eq!(format!("{}", error), "Invalid input: Cannot parse best id 'abc'");
    }
}
