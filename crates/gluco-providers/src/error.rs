//! Error types for gluco-providers.

use gluco_core::{ErrorKind, SessionError};
use thiserror::Error;

/// Result type alias for gluco-providers operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Transport-level failures talking to a provider.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A provider URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<Error> for gluco_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    gluco_core::Error::new(ErrorKind::Timeout)
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    gluco_core::Error::new(ErrorKind::NetworkError)
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    gluco_core::Error::new(ErrorKind::Serialization)
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    gluco_core::Error::new(ErrorKind::NetworkError)
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => gluco_core::Error::new(ErrorKind::Serialization)
                .with_message(e.to_string())
                .with_source(e),
            Error::Url(e) => gluco_core::Error::new(ErrorKind::Configuration)
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}

/// Transport failures never indicate a rejected session.
impl From<Error> for SessionError {
    fn from(err: Error) -> Self {
        SessionError::Transient(err.into())
    }
}
