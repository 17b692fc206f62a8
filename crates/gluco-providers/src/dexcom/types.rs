//! Dexcom Share wire types.

use gluco_core::SessionError;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Placeholder id Dexcom returns instead of an error for some rejected logins.
pub(crate) const NULL_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Error codes meaning the session id is no longer valid.
const SESSION_EXPIRED_CODES: &[&str] = &["SessionNotValid", "SessionIdNotFound"];

/// Error codes meaning the credentials themselves were rejected.
const LOGIN_REJECTED_CODES: &[&str] = &[
    "AccountPasswordInvalid",
    "SSO_AuthenticatePasswordInvalid",
    "SSO_AuthenticateAccountNotFound",
    "SSO_AuthenticateMaxAttemptsExceeed",
    "SSO_AuthenticateAccountLocked",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthenticateRequest<'a> {
    pub account_name: &'a str,
    pub password: &'a str,
    pub application_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginByIdRequest<'a> {
    pub account_id: &'a str,
    pub password: &'a str,
    pub application_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// One entry of `ReadPublisherLatestGlucoseValues`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GlucoseEntry {
    /// Wall time, e.g. `Date(1700000000000)` or `Date(1700000000000-0500)`.
    #[serde(rename = "WT")]
    pub wt: String,
    /// Glucose in mg/dL.
    #[serde(rename = "Value")]
    pub value: f64,
}

impl GlucoseEntry {
    /// Parses the observation time.
    pub fn observed_at(&self) -> Option<Timestamp> {
        parse_date(&self.wt)
    }
}

/// Parses Dexcom's `Date(<millis>[+-offset])` notation.
///
/// The millisecond value is already UTC; the offset is informational.
pub(crate) fn parse_date(value: &str) -> Option<Timestamp> {
    let start = value.find('(')? + 1;
    let digits: String = value[start..]
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '-'))
        .map(|(_, c)| c)
        .collect();
    let millis: i64 = digits.parse().ok()?;
    Timestamp::from_millisecond(millis).ok()
}

/// Classifies a non-success Dexcom response.
///
/// Dexcom reports expired sessions as HTTP 500 with a `Code` in the body, so the
/// body is consulted before the status.
pub(crate) fn classify_failure(status: u16, body: &str) -> SessionError {
    let error: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = error.code.as_deref().unwrap_or_default();
    let message = error
        .message
        .unwrap_or_else(|| format!("Dexcom Share returned HTTP {status}"));

    if SESSION_EXPIRED_CODES.contains(&code) || LOGIN_REJECTED_CODES.contains(&code) {
        return SessionError::auth(format!("{code}: {message}"));
    }

    SessionError::from_status(status, message)
}
