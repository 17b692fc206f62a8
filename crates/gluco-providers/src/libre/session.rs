use std::fmt;

use gluco_core::types::{GlucoseSample, ProviderCredential, ProviderType};
use gluco_core::{ErrorKind, ProviderSession, SessionError, SessionResult};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use super::types::{ConnectionEntry, Envelope, LoginData, LoginRequest, account_id};
use super::{LIBRE_PRODUCT, LIBRE_VERSION, LibreEndpoint};
use crate::{ProviderHttpClient, TRACING_TARGET_LIBRE};

const LOGIN_PATH: &str = "llu/auth/login";
const CONNECTIONS_PATH: &str = "llu/connections";

/// Logins needed at most: the global host, then the regional one.
const MAX_LOGIN_ATTEMPTS: usize = 2;

/// A logged-in LibreLinkUp follower session.
pub struct LibreSession {
    client: ProviderHttpClient,
    endpoint: LibreEndpoint,
    credential: ProviderCredential,
    token: String,
    account_id: String,
}

impl LibreSession {
    /// Logs in, following a region redirect, and returns a ready session.
    pub async fn login(
        client: ProviderHttpClient,
        endpoint: LibreEndpoint,
        credential: ProviderCredential,
    ) -> SessionResult<Self> {
        let mut session = Self {
            client,
            endpoint,
            credential,
            token: String::new(),
            account_id: String::new(),
        };

        session.authenticate().await?;
        Ok(session)
    }

    async fn authenticate(&mut self) -> SessionResult<()> {
        for _ in 0..MAX_LOGIN_ATTEMPTS {
            let url = self
                .endpoint
                .base_url
                .join(LOGIN_PATH)
                .map_err(crate::Error::from)?;
            let request = LoginRequest {
                email: self.credential.username(),
                password: self.credential.password(),
            };
            let builder = self.client.http().post(url).json(&request);
            let data: LoginData = self.send(builder).await?;

            if data.redirect {
                let region = data.region.unwrap_or_default();
                tracing::debug!(
                    target: TRACING_TARGET_LIBRE,
                    region = %region,
                    pinned = self.endpoint.pinned,
                    "LibreLinkUp redirected login"
                );

                if !self.endpoint.redirect(&region) {
                    return Err(SessionError::transient(
                        ErrorKind::ExternalError,
                        format!("LibreLinkUp redirected to unusable region '{region}'"),
                    ));
                }
                continue;
            }

            let (Some(user), Some(ticket)) = (data.user, data.auth_ticket) else {
                return Err(SessionError::transient(
                    ErrorKind::Serialization,
                    "LibreLinkUp login response has no ticket",
                ));
            };

            self.token = ticket.token;
            self.account_id = account_id(&user.id);

            tracing::debug!(
                target: TRACING_TARGET_LIBRE,
                username = %self.credential.username(),
                host = self.endpoint.base_url.host_str().unwrap_or_default(),
                "LibreLinkUp session established"
            );
            return Ok(());
        }

        Err(SessionError::transient(
            ErrorKind::ExternalError,
            "LibreLinkUp kept redirecting the login",
        ))
    }

    /// Sends a request with the app headers and unwraps the response envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> SessionResult<T> {
        let response = builder
            .header("product", LIBRE_PRODUCT)
            .header("version", LIBRE_VERSION)
            .send()
            .await
            .map_err(crate::Error::from)?;

        let status = response.status();
        let text = response.text().await.map_err(crate::Error::from)?;

        if !status.is_success() {
            return Err(SessionError::from_status(
                status.as_u16(),
                format!("LibreLinkUp returned HTTP {status}"),
            ));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(crate::Error::from)?;
        envelope.into_data()
    }
}

#[async_trait::async_trait]
impl ProviderSession for LibreSession {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Libre
    }

    async fn fetch_reading(&mut self) -> SessionResult<GlucoseSample> {
        let url = self
            .endpoint
            .base_url
            .join(CONNECTIONS_PATH)
            .map_err(crate::Error::from)?;
        let builder = self
            .client
            .http()
            .get(url)
            .bearer_auth(&self.token)
            .header("Account-Id", &self.account_id);

        let connections: Vec<ConnectionEntry> = self.send(builder).await?;
        let measurement = connections
            .into_iter()
            .next()
            .and_then(|entry| entry.glucose_measurement)
            .ok_or_else(|| {
                SessionError::transient(ErrorKind::NotFound, "no LibreLinkUp reading available")
            })?;

        Ok(GlucoseSample::from_mg_dl(
            measurement.value_in_mg_per_dl,
            measurement.observed_at(),
        ))
    }

    async fn reauthenticate(&mut self) -> SessionResult<()> {
        tracing::debug!(
            target: TRACING_TARGET_LIBRE,
            username = %self.credential.username(),
            "Re-authenticating LibreLinkUp session"
        );

        self.token.clear();
        self.authenticate().await
    }
}

impl fmt::Debug for LibreSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibreSession")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
