//! Directory-to-registry reconciliation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use gluco_core::crypto::CredentialCodec;
use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderType};
use gluco_core::{DirectoryService, Error, SessionFactory};

use crate::TRACING_TARGET_RECONCILE;
use crate::registry::{LiveSession, SessionRegistry};

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Sessions built and registered.
    pub added: usize,
    /// Sessions dropped.
    pub removed: usize,
    /// Connections whose credential could not be opened or whose session could not
    /// be built. Retried next tick.
    pub failed: Vec<ConnectionId>,
    /// Provider types whose directory lookup failed; their sessions were kept as is.
    pub skipped_providers: Vec<ProviderType>,
    /// Registry size after the pass.
    pub registry_size: usize,
}

/// Brings the [`SessionRegistry`] in line with the connection directory.
#[derive(Clone)]
pub struct Reconciler {
    directory: DirectoryService,
    codec: CredentialCodec,
    factory: Arc<dyn SessionFactory>,
    registry: SessionRegistry,
    providers: Vec<ProviderType>,
    directory_timeout: Duration,
    provider_timeout: Duration,
    max_concurrent_builds: usize,
}

impl Reconciler {
    /// Creates a reconciler over `registry`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: DirectoryService,
        codec: CredentialCodec,
        factory: Arc<dyn SessionFactory>,
        registry: SessionRegistry,
        providers: Vec<ProviderType>,
        directory_timeout: Duration,
        provider_timeout: Duration,
        max_concurrent_builds: usize,
    ) -> Self {
        Self {
            directory,
            codec,
            factory,
            registry,
            providers,
            directory_timeout,
            provider_timeout,
            max_concurrent_builds: max_concurrent_builds.max(1),
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// Never fails: directory errors skip that provider type, credential and
    /// construction errors skip that connection.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RECONCILE, name = "reconcile")]
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut directory = Vec::new();
        let mut reconciled = HashSet::with_capacity(self.providers.len());

        for &provider_type in &self.providers {
            match self.list_connections(provider_type).await {
                Ok(records) => {
                    directory.extend(records);
                    reconciled.insert(provider_type);
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_RECONCILE,
                        provider_type = %provider_type,
                        error = %error,
                        "Directory unavailable, keeping existing sessions for this provider"
                    );
                    report.skipped_providers.push(provider_type);
                }
            }
        }

        let diff = self.registry.diff(&directory, &reconciled).await;

        if !diff.to_remove.is_empty() {
            report.removed = self.registry.remove_all(&diff.to_remove).await;
            tracing::info!(
                target: TRACING_TARGET_RECONCILE,
                removed = report.removed,
                connections = ?diff.to_remove,
                "Released sessions of removed connections"
            );
        }

        let built: Vec<_> = futures::stream::iter(diff.to_add)
            .map(|record| async move {
                let result = self.build_session(&record).await;
                (record, result)
            })
            .buffer_unordered(self.max_concurrent_builds)
            .collect()
            .await;

        for (record, result) in built {
            match result {
                Ok(session) => {
                    if self.registry.insert(session).await {
                        report.added += 1;
                    } else {
                        tracing::warn!(
                            target: TRACING_TARGET_RECONCILE,
                            connection_id = %record.id,
                            "Session already registered, discarding duplicate"
                        );
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_RECONCILE,
                        connection_id = %record.id,
                        user_id = %record.user_id,
                        provider_type = %record.provider_type,
                        retryable = error.is_retryable(),
                        error = %error,
                        "Failed to build session, retrying next tick"
                    );
                    report.failed.push(record.id);
                }
            }
        }

        report.failed.sort_unstable();
        report.registry_size = self.registry.len().await;
        report
    }

    async fn list_connections(
        &self,
        provider_type: ProviderType,
    ) -> gluco_core::Result<Vec<ConnectionRecord>> {
        let lookup = self.directory.get_connections_by_type(provider_type);
        match tokio::time::timeout(self.directory_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "directory lookup exceeded {:?}",
                self.directory_timeout
            ))),
        }
    }

    /// Opens the credential and builds (logs in) a session for `record`.
    ///
    /// The decrypted credential moves into the factory and from there into the
    /// session; nothing else keeps a copy.
    async fn build_session(&self, record: &ConnectionRecord) -> gluco_core::Result<LiveSession> {
        let credential = self.codec.open(record)?;

        let create = self.factory.create_session(record, credential);
        let session = match tokio::time::timeout(self.provider_timeout, create).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::timeout(format!(
                    "session construction exceeded {:?}",
                    self.provider_timeout
                )));
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_RECONCILE,
            connection_id = %record.id,
            provider_type = %record.provider_type,
            "Session built"
        );

        Ok(LiveSession::new(record, session))
    }
}

#[cfg(test)]
mod tests {
    use gluco_core::types::UserId;
    use gluco_test::{Fixtures, MockDirectory, MockSessionFactory};

    use super::*;

    fn reconciler(
        fixtures: &Fixtures,
        directory: &MockDirectory,
        factory: &MockSessionFactory,
        registry: &SessionRegistry,
    ) -> Reconciler {
        Reconciler::new(
            DirectoryService::new(directory.clone()),
            fixtures.codec(),
            Arc::new(factory.clone()),
            registry.clone(),
            ProviderType::all().collect(),
            Duration::from_secs(10),
            Duration::from_secs(20),
            4,
        )
    }

    #[tokio::test]
    async fn builds_sessions_with_decrypted_credentials() {
        let fixtures = Fixtures::new();
        let directory = MockDirectory::with_records([
            fixtures.connection_with_secret(1, 10, ProviderType::Dexcom, "s3cret"),
        ]);
        let factory = MockSessionFactory::new();
        let registry = SessionRegistry::new();

        let report = reconciler(&fixtures, &directory, &factory, &registry)
            .reconcile()
            .await;

        assert_eq!(report.added, 1);
        assert_eq!(report.registry_size, 1);
        let credential = factory.credential(ConnectionId::new(1)).unwrap();
        assert_eq!(credential.password(), "s3cret");
        assert_eq!(credential.username(), "user-1@example.com");
    }

    #[tokio::test]
    async fn failed_builds_are_skipped_and_retried() {
        let fixtures = Fixtures::new();
        let directory = MockDirectory::with_records([
            fixtures.connection(1, 10, ProviderType::Dexcom),
            fixtures.connection(2, 20, ProviderType::Libre),
            fixtures.undecryptable(3, 30, ProviderType::Libre),
        ]);
        let factory = MockSessionFactory::new();
        factory.fail(ConnectionId::new(2));
        let registry = SessionRegistry::new();
        let reconciler = reconciler(&fixtures, &directory, &factory, &registry);

        let report = reconciler.reconcile().await;
        assert_eq!(report.added, 1);
        assert_eq!(report.failed, vec![ConnectionId::new(2), ConnectionId::new(3)]);
        assert_eq!(registry.ids().await, vec![ConnectionId::new(1)]);

        factory.succeed(ConnectionId::new(2));
        let report = reconciler.reconcile().await;
        assert_eq!(report.added, 1);
        assert_eq!(report.failed, vec![ConnectionId::new(3)]);
        assert_eq!(
            registry.ids().await,
            vec![ConnectionId::new(1), ConnectionId::new(2)]
        );
    }

    #[tokio::test]
    async fn directory_failure_keeps_sessions_of_that_type() {
        let fixtures = Fixtures::new();
        let directory = MockDirectory::with_records([
            fixtures.connection(1, 10, ProviderType::Dexcom),
            fixtures.connection(2, 20, ProviderType::Libre),
        ]);
        let factory = MockSessionFactory::new();
        let registry = SessionRegistry::new();
        let reconciler = reconciler(&fixtures, &directory, &factory, &registry);
        reconciler.reconcile().await;

        directory.remove(ConnectionId::new(1));
        directory.remove(ConnectionId::new(2));
        directory.fail(ProviderType::Dexcom);

        let report = reconciler.reconcile().await;
        assert_eq!(report.skipped_providers, vec![ProviderType::Dexcom]);
        assert_eq!(report.removed, 1);
        assert_eq!(registry.ids().await, vec![ConnectionId::new(1)]);
    }

    #[tokio::test]
    async fn unchanged_records_are_not_rebuilt() {
        let fixtures = Fixtures::new();
        let directory =
            MockDirectory::with_records([fixtures.connection(1, 10, ProviderType::Dexcom)]);
        let factory = MockSessionFactory::new();
        let registry = SessionRegistry::new();
        let reconciler = reconciler(&fixtures, &directory, &factory, &registry);

        reconciler.reconcile().await;
        reconciler.reconcile().await;

        assert_eq!(factory.attempts(), 1);
        assert_eq!(factory.probe(ConnectionId::new(1)).created(), 1);
    }

    #[tokio::test]
    async fn ownership_change_rebuilds_session() {
        let fixtures = Fixtures::new();
        let directory =
            MockDirectory::with_records([fixtures.connection(1, 10, ProviderType::Dexcom)]);
        let factory = MockSessionFactory::new();
        let registry = SessionRegistry::new();
        let reconciler = reconciler(&fixtures, &directory, &factory, &registry);
        reconciler.reconcile().await;

        directory.upsert(fixtures.connection(1, 11, ProviderType::Dexcom));
        let report = reconciler.reconcile().await;

        assert_eq!((report.removed, report.added), (1, 1));
        let live = registry.get(ConnectionId::new(1)).await.unwrap();
        assert_eq!(live.user_id(), UserId::new(11));
        assert_eq!(factory.probe(ConnectionId::new(1)).live(), 1);
    }
}
