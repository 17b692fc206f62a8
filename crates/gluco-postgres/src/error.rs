//! Error types for database operations.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, Error};
use diesel_async::pooled_connection::PoolError as DieselPoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;
use gluco_core::ErrorKind;

use crate::TRACING_TARGET_CONNECTION;

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all PostgreSQL operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Waiting for, creating or recycling a pooled connection timed out.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Applying schema migrations failed.
    #[error("Database migration error: {0}")]
    Migration(BoxError),

    /// Query execution failed.
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// Anything not covered above.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %err,
                    "Unexpected post-create hook error"
                );
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    "No tokio runtime specified for connection pool"
                );
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => Self::Connection(ConnectionError::InvalidConnectionUrl(
                "Connection pool is closed".into(),
            )),
        }
    }
}

impl From<PgError> for gluco_core::Error {
    fn from(err: PgError) -> Self {
        let kind = match &err {
            PgError::Config(_) => ErrorKind::Configuration,
            PgError::Timeout(_) => ErrorKind::Timeout,
            PgError::Connection(_) => ErrorKind::ServiceUnavailable,
            PgError::Migration(_) | PgError::Unexpected(_) => ErrorKind::InternalError,
            PgError::Query(Error::NotFound) => ErrorKind::NotFound,
            PgError::Query(_) => ErrorKind::ExternalError,
        };

        gluco_core::Error::new(kind)
            .with_message(err.to_string())
            .with_source(err)
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_error() {
        let error: gluco_core::Error = PgError::Timeout(TimeoutType::Wait).into();
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert!(error.kind.is_retryable());

        let error: gluco_core::Error = PgError::Config("empty url".into()).into();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let error: gluco_core::Error = PgError::Query(Error::NotFound).into();
        assert_eq!(error.kind, ErrorKind::NotFound);
    }
}
