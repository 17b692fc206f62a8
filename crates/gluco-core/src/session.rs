//! Provider session seam.
//!
//! A [`ProviderSession`] is a logged-in handle on one provider account. Every call
//! resolves to one of three outcomes: a sample, [`SessionError::Auth`] (the provider
//! rejected or expired the session) or [`SessionError::Transient`] (anything else).
//! Only `Auth` ever triggers re-authentication.

use std::borrow::Cow;

use crate::types::{ConnectionRecord, GlucoseSample, ProviderCredential, ProviderType};
use crate::{Error, ErrorKind};

/// Result type for provider session calls.
pub type SessionResult<T, E = SessionError> = std::result::Result<T, E>;

/// Owned, type-erased provider session.
pub type BoxedSession = Box<dyn ProviderSession>;

/// Classified failure of a provider call.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The provider rejected the credentials or the session has expired.
    #[error("session rejected: {0}")]
    Auth(#[source] Error),
    /// Network failure, malformed payload, rate limiting or missing data.
    #[error("transient failure: {0}")]
    Transient(#[source] Error),
}

impl SessionError {
    /// Creates an authentication failure.
    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Auth(Error::new(ErrorKind::Authentication).with_message(message))
    }

    /// Creates a transient failure of the given kind.
    pub fn transient(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Transient(Error::new(kind).with_message(message))
    }

    /// Classifies a non-success HTTP status returned by a provider.
    ///
    /// `400`, `401` and `403` mean the session (or the login) was rejected; every
    /// other status is transient.
    pub fn from_status(status: u16, message: impl Into<Cow<'static, str>>) -> Self {
        match status {
            400 | 401 | 403 => Self::auth(message),
            429 => Self::transient(ErrorKind::RateLimited, message),
            500..=599 => Self::transient(ErrorKind::ServiceUnavailable, message),
            _ => Self::transient(ErrorKind::ExternalError, message),
        }
    }

    /// Returns `true` for [`SessionError::Auth`].
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns the underlying structured error.
    pub fn inner(&self) -> &Error {
        match self {
            Self::Auth(error) | Self::Transient(error) => error,
        }
    }
}

impl From<SessionError> for Error {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Auth(error) | SessionError::Transient(error) => error,
        }
    }
}

/// A live, authenticated session against one provider account.
///
/// Implementations hold the decrypted credential for as long as they live and use it
/// to log in again from [`reauthenticate`](Self::reauthenticate).
#[async_trait::async_trait]
pub trait ProviderSession: Send {
    /// Provider this session talks to.
    fn provider_type(&self) -> ProviderType;

    /// Fetches the most recent glucose sample.
    async fn fetch_reading(&mut self) -> SessionResult<GlucoseSample>;

    /// Logs in again, replacing the session token in place.
    async fn reauthenticate(&mut self) -> SessionResult<()>;
}

/// Builds provider sessions from directory records.
///
/// Dispatches on [`ConnectionRecord::provider_type`]; adding a provider means adding
/// a session type and a match arm in the implementation.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    /// Constructs (and logs in) a session for `record` using its decrypted credential.
    async fn create_session(
        &self,
        record: &ConnectionRecord,
        credential: ProviderCredential,
    ) -> crate::Result<BoxedSession>;
}
