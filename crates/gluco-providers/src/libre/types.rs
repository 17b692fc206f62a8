//! LibreLinkUp wire types.

use gluco_core::{ErrorKind, SessionError, SessionResult};
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Body status for rejected credentials.
const STATUS_BAD_CREDENTIALS: i64 = 2;

/// Body status for a pending account step, such as accepting new terms.
const STATUS_ACTION_REQUIRED: i64 = 4;

/// Format of `FactoryTimestamp`, always UTC.
const FACTORY_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response wrapper shared by every LibreLinkUp endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub status: i64,
    pub data: Option<T>,
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeError {
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps `data`, classifying a non-zero body status.
    pub fn into_data(self) -> SessionResult<T> {
        let message = self
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("LibreLinkUp returned status {}", self.status));

        match self.status {
            0 => self.data.ok_or_else(|| {
                SessionError::transient(ErrorKind::Serialization, "LibreLinkUp response has no data")
            }),
            STATUS_BAD_CREDENTIALS | STATUS_ACTION_REQUIRED => Err(SessionError::auth(message)),
            _ => Err(SessionError::transient(ErrorKind::ExternalError, message)),
        }
    }
}

/// `data` of `llu/auth/login`: either a ticket or a redirect.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginData {
    #[serde(default)]
    pub redirect: bool,
    pub region: Option<String>,
    pub user: Option<LoginUser>,
    pub auth_ticket: Option<AuthTicket>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginUser {
    pub id: String,
}

#[derive(Deserialize)]
pub(crate) struct AuthTicket {
    pub token: String,
}

impl std::fmt::Debug for AuthTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTicket")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// One entry of `llu/connections`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionEntry {
    pub glucose_measurement: Option<GlucoseMeasurement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GlucoseMeasurement {
    pub factory_timestamp: Option<String>,
    pub value_in_mg_per_dl: f64,
}

impl GlucoseMeasurement {
    /// Parses the observation time.
    pub fn observed_at(&self) -> Option<Timestamp> {
        self.factory_timestamp
            .as_deref()
            .and_then(parse_factory_timestamp)
    }
}

/// Parses `FactoryTimestamp`, e.g. `11/14/2023 10:13:20 PM`.
pub(crate) fn parse_factory_timestamp(value: &str) -> Option<Timestamp> {
    let datetime = DateTime::strptime(FACTORY_TIMESTAMP_FORMAT, value.trim()).ok()?;
    datetime
        .to_zoned(TimeZone::UTC)
        .ok()
        .map(|zoned| zoned.timestamp())
}

/// Derives the `Account-Id` header: lowercase hex SHA-256 of the user id.
pub(crate) fn account_id(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}
