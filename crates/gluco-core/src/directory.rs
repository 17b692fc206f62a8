//! Connection directory seam.

use std::sync::Arc;
use std::time::Instant;

use crate::types::{ConnectionRecord, ProviderType};
use crate::{Result, ServiceHealth, TRACING_TARGET_DIRECTORY};

/// Persistent store of provider connections, read once per provider type per tick.
#[async_trait::async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Returns every active connection of the given provider type.
    async fn get_connections_by_type(
        &self,
        provider_type: ProviderType,
    ) -> Result<Vec<ConnectionRecord>>;

    /// Checks that the directory can be reached.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Cheaply cloneable directory handle that logs every lookup.
#[derive(Clone)]
pub struct DirectoryService {
    inner: Arc<dyn ConnectionDirectory>,
}

impl std::fmt::Debug for DirectoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryService").finish_non_exhaustive()
    }
}

impl DirectoryService {
    /// Wraps a directory implementation.
    pub fn new<D>(directory: D) -> Self
    where
        D: ConnectionDirectory + 'static,
    {
        Self {
            inner: Arc::new(directory),
        }
    }

    /// Lists the active connections of one provider type.
    pub async fn get_connections_by_type(
        &self,
        provider_type: ProviderType,
    ) -> Result<Vec<ConnectionRecord>> {
        let started_at = Instant::now();
        let result = self.inner.get_connections_by_type(provider_type).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(records) => tracing::debug!(
                target: TRACING_TARGET_DIRECTORY,
                provider_type = %provider_type,
                count = records.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Listed connections"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_DIRECTORY,
                provider_type = %provider_type,
                error = %error,
                elapsed_ms = elapsed.as_millis() as u64,
                "Failed to list connections"
            ),
        }

        result
    }

    /// Checks directory health.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        let started_at = Instant::now();
        let health = self.inner.health_check().await?;
        Ok(health.with_response_time(started_at.elapsed()))
    }
}
