//! Error types for missionlink.
//!
//! This module defines the error types used throughout the missionlink crate.
//! Only the telemetry variants ever reach the poll boundary, where they are
//! logged and suppressed rather than propagated.

use thiserror::Error;

/// The main error type for missionlink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A configured URL could not be parsed.
    #[error("invalid telemetry URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Telemetry Errors ===
    /// The telemetry request could not be sent or its body not read.
    #[error("telemetry fetch from {url} failed: {source}")]
    TelemetryFetch {
        /// URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The telemetry endpoint answered with a non-success status.
    #[error("telemetry endpoint {url} returned HTTP {status}")]
    TelemetryStatus {
        /// URL that was requested.
        url: String,
        /// HTTP status code of the response.
        status: u16,
    },

    /// The telemetry payload was not a valid sample batch.
    #[error("telemetry payload from {url} could not be decoded: {source}")]
    TelemetryDecode {
        /// URL that was requested.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The telemetry request exceeded its timeout.
    #[error("telemetry request to {url} timed out after {timeout_ms}ms")]
    TelemetryTimeout {
        /// URL that was requested.
        url: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    // === I/O Errors ===
    /// File system or terminal operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for missionlink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from talking to the telemetry endpoint.
    ///
    /// These are the "telemetry fetch failed" errors that the poller logs and
    /// drops instead of surfacing.
    #[must_use]
    pub fn is_telemetry_failure(&self) -> bool {
        matches!(
            self,
            Self::TelemetryFetch { .. }
                | Self::TelemetryStatus { .. }
                | Self::TelemetryDecode { .. }
                | Self::TelemetryTimeout { .. }
        )
    }

    /// Check if this error is a configuration issue.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } | Self::InvalidUrl { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");

        let err = Error::config_validation("poll_interval_ms must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: poll_interval_ms must be greater than 0"
        );
    }

    #[test]
    fn test_telemetry_status_display() {
        let err = Error::TelemetryStatus {
            url: "http://127.0.0.1:8000/api/telemetry/".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("/api/telemetry/"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_telemetry_timeout_display() {
        let err = Error::TelemetryTimeout {
            url: "http://localhost/api/telemetry/".to_string(),
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_is_telemetry_failure() {
        let status = Error::TelemetryStatus {
            url: String::new(),
            status: 500,
        };
        assert!(status.is_telemetry_failure());

        let decode = Error::TelemetryDecode {
            url: String::new(),
            source: serde_json::from_str::<i32>("nope").unwrap_err(),
        };
        assert!(decode.is_telemetry_failure());

        assert!(!Error::internal("x").is_telemetry_failure());
        assert!(!Error::config_validation("x").is_telemetry_failure());
    }

    #[test]
    fn test_is_config_error() {
        assert!(Error::config_validation("bad").is_config_error());
        assert!(Error::invalid_url("::", "missing scheme").is_config_error());
        assert!(!Error::internal("x").is_config_error());
    }

    #[test]
    fn test_invalid_url_display() {
        let err = Error::invalid_url("localhost:8000", "relative URL without a base");
        let msg = err.to_string();
        assert!(msg.contains("localhost:8000"));
        assert!(msg.contains("relative URL"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("stdin closed"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}
