//! [`ConnectionDirectory`] backed by the `connections` table.

use gluco_core::types::{ConnectionRecord, ProviderType};
use gluco_core::{ConnectionDirectory, ServiceHealth};

use crate::PgClient;
use crate::model::ProviderConnection;
use crate::query::ConnectionRepository;

/// Connection directory reading from PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgConnectionDirectory {
    client: PgClient,
}

impl PgConnectionDirectory {
    /// Creates a directory over a pooled client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Gets the underlying client.
    pub fn client(&self) -> &PgClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl ConnectionDirectory for PgConnectionDirectory {
    async fn get_connections_by_type(
        &self,
        provider_type: ProviderType,
    ) -> gluco_core::Result<Vec<ConnectionRecord>> {
        let mut conn = self.client.get_connection().await?;
        let rows = conn
            .find_active_connections_by_provider(provider_type.as_ref())
            .await?;

        // `connections_provider_known` limits stored names to known providers.
        let records = rows
            .into_iter()
            .filter_map(ProviderConnection::into_record)
            .collect();

        Ok(records)
    }

    async fn health_check(&self) -> gluco_core::Result<ServiceHealth> {
        if let Err(error) = self.client.ping().await {
            return Ok(ServiceHealth::unhealthy(error.to_string()));
        }

        let status = self.client.pool_status();
        if status.is_under_pressure() {
            return Ok(ServiceHealth::degraded(format!(
                "connection pool under pressure ({} waiting)",
                status.waiting
            )));
        }

        Ok(ServiceHealth::healthy())
    }
}
