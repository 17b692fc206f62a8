//! Worker error types.

use std::borrow::Cow;

/// Result type alias for engine lifecycle operations.
pub type Result<T, E = WorkerError> = std::result::Result<T, E>;

/// Errors raised by the engine outside a tick.
///
/// Failures inside a tick are logged and counted in the tick report instead.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Engine configuration is out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// The scheduler task panicked or was aborted.
    #[error("engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The scheduler did not stop within the shutdown deadline.
    #[error("engine did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),
}

impl WorkerError {
    /// Creates a configuration error with a message.
    pub fn invalid_config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
