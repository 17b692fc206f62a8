//! Error types for gluco-influx.

use std::borrow::Cow;

use gluco_core::ErrorKind;
use thiserror::Error;

/// Result type alias for gluco-influx operations.
pub type Result<T, E = InfluxError> = std::result::Result<T, E>;

/// Failures talking to InfluxDB.
#[derive(Debug, Error)]
pub enum InfluxError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// InfluxDB answered with a non-success status.
    #[error("InfluxDB returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// A point cannot be expressed in line protocol.
    #[error("Invalid point: {0}")]
    InvalidPoint(Cow<'static, str>),
    /// A retention string is not `<n>d|h|m|s`.
    #[error("Invalid retention '{0}': expected <n>d, <n>h, <n>m or <n>s")]
    InvalidRetention(String),
    /// The configured organization does not exist.
    #[error("Organization '{0}' not found")]
    OrgNotFound(String),
    /// Configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(Cow<'static, str>),
}

impl From<InfluxError> for gluco_core::Error {
    fn from(err: InfluxError) -> Self {
        let kind = match &err {
            InfluxError::Reqwest(e) if e.is_timeout() => ErrorKind::Timeout,
            InfluxError::Reqwest(_) => ErrorKind::NetworkError,
            InfluxError::Serde(_) => ErrorKind::Serialization,
            InfluxError::Status { status: 401 | 403, .. } => ErrorKind::Authentication,
            InfluxError::Status { status: 429, .. } => ErrorKind::RateLimited,
            InfluxError::Status { status: 500..=599, .. } => ErrorKind::ServiceUnavailable,
            InfluxError::Status { .. } => ErrorKind::ExternalError,
            InfluxError::InvalidPoint(_) => ErrorKind::InvalidInput,
            InfluxError::OrgNotFound(_) => ErrorKind::NotFound,
            InfluxError::Url(_) | InfluxError::InvalidRetention(_) | InfluxError::Config(_) => {
                ErrorKind::Configuration
            }
        };

        gluco_core::Error::new(kind)
            .with_message(err.to_string())
            .with_source(err)
    }
}
