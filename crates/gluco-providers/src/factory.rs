//! [`SessionFactory`] over the HTTP provider sessions.

use gluco_core::types::{ConnectionRecord, ProviderCredential, ProviderType};
use gluco_core::{BoxedSession, SessionFactory};

use crate::ProviderHttpClient;
use crate::dexcom::{DexcomEndpoint, DexcomSession};
use crate::libre::{LibreEndpoint, LibreSession};

/// Builds logged-in sessions, dispatching on the connection's provider type.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    client: ProviderHttpClient,
}

impl HttpSessionFactory {
    /// Creates a factory sharing `client` across every session it builds.
    pub fn new(client: ProviderHttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SessionFactory for HttpSessionFactory {
    #[tracing::instrument(
        skip_all,
        fields(connection_id = %record.id, provider_type = %record.provider_type)
    )]
    async fn create_session(
        &self,
        record: &ConnectionRecord,
        credential: ProviderCredential,
    ) -> gluco_core::Result<BoxedSession> {
        let config = self.client.config();
        let client = self.client.clone();

        let session: BoxedSession = match record.provider_type {
            ProviderType::Dexcom => {
                let endpoint = DexcomEndpoint::resolve(&record.region, config)?;
                Box::new(DexcomSession::login(client, endpoint, credential).await?)
            }
            ProviderType::Libre => {
                let endpoint = LibreEndpoint::resolve(&record.region, config)?;
                Box::new(LibreSession::login(client, endpoint, credential).await?)
            }
        };

        Ok(session)
    }
}
