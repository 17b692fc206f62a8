use std::fmt;

use gluco_core::types::{GlucoseSample, ProviderCredential, ProviderType};
use gluco_core::{ErrorKind, ProviderSession, SessionError, SessionResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DexcomEndpoint;
use super::types::{
    AuthenticateRequest, GlucoseEntry, LoginByIdRequest, NULL_ID, classify_failure,
};
use crate::{ProviderHttpClient, TRACING_TARGET_DEXCOM};

const AUTHENTICATE_PATH: &str = "General/AuthenticatePublisherAccount";
const LOGIN_BY_ID_PATH: &str = "General/LoginPublisherAccountById";
const LATEST_GLUCOSE_PATH: &str = "Publisher/ReadPublisherLatestGlucoseValues";

/// Look-back window for the latest reading, in minutes.
const LATEST_WINDOW_MINUTES: &str = "10";

/// A logged-in Dexcom Share publisher session.
pub struct DexcomSession {
    client: ProviderHttpClient,
    endpoint: DexcomEndpoint,
    credential: ProviderCredential,
    account_id: Option<String>,
    session_id: String,
}

impl DexcomSession {
    /// Logs in and returns a ready session.
    pub async fn login(
        client: ProviderHttpClient,
        endpoint: DexcomEndpoint,
        credential: ProviderCredential,
    ) -> SessionResult<Self> {
        let mut session = Self {
            client,
            endpoint,
            credential,
            account_id: None,
            session_id: String::new(),
        };

        session.authenticate().await?;
        Ok(session)
    }

    async fn authenticate(&mut self) -> SessionResult<()> {
        let account_id = match self.account_id.clone() {
            Some(account_id) => account_id,
            None => {
                let request = AuthenticateRequest {
                    account_name: self.credential.username(),
                    password: self.credential.password(),
                    application_id: self.endpoint.application_id,
                };
                let account_id: String = self.post(AUTHENTICATE_PATH, &[], &request).await?;
                if account_id == NULL_ID {
                    return Err(SessionError::auth("Dexcom Share account not found"));
                }
                self.account_id = Some(account_id.clone());
                account_id
            }
        };

        let request = LoginByIdRequest {
            account_id: &account_id,
            password: self.credential.password(),
            application_id: self.endpoint.application_id,
        };
        let session_id: String = self.post(LOGIN_BY_ID_PATH, &[], &request).await?;
        if session_id == NULL_ID {
            return Err(SessionError::auth("Dexcom Share rejected the password"));
        }

        tracing::debug!(
            target: TRACING_TARGET_DEXCOM,
            username = %self.credential.username(),
            "Dexcom Share session established"
        );

        self.session_id = session_id;
        Ok(())
    }

    async fn post<T, B>(&self, path: &str, query: &[(&str, &str)], body: &B) -> SessionResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint.base_url.join(path).map_err(crate::Error::from)?;

        let response = self
            .client
            .http()
            .post(url)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(crate::Error::from)?;

        let status = response.status();
        let text = response.text().await.map_err(crate::Error::from)?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| crate::Error::from(e).into())
    }
}

#[async_trait::async_trait]
impl ProviderSession for DexcomSession {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Dexcom
    }

    async fn fetch_reading(&mut self) -> SessionResult<GlucoseSample> {
        let query = [
            ("sessionId", self.session_id.as_str()),
            ("minutes", LATEST_WINDOW_MINUTES),
            ("maxCount", "1"),
        ];
        let entries: Vec<GlucoseEntry> = self
            .post(LATEST_GLUCOSE_PATH, &query, &serde_json::json!({}))
            .await?;

        let entry = entries.into_iter().next().ok_or_else(|| {
            SessionError::transient(
                ErrorKind::NotFound,
                "no Dexcom reading in the last 10 minutes",
            )
        })?;

        Ok(GlucoseSample::from_mg_dl(entry.value, entry.observed_at()))
    }

    async fn reauthenticate(&mut self) -> SessionResult<()> {
        tracing::debug!(
            target: TRACING_TARGET_DEXCOM,
            username = %self.credential.username(),
            "Re-authenticating Dexcom Share session"
        );

        self.session_id.clear();
        self.account_id = None;
        self.authenticate().await
    }
}

impl fmt::Debug for DexcomSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DexcomSession")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .field("session_id", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
