//! Mock connection directory.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderType};
use gluco_core::{ConnectionDirectory, Error, ErrorKind, Result, ServiceHealth};

use super::lock;

#[derive(Debug, Default)]
struct DirectoryState {
    records: BTreeMap<ConnectionId, ConnectionRecord>,
    failing: HashSet<ProviderType>,
    calls: usize,
}

/// In-memory directory whose contents can be changed between ticks.
///
/// Clones share state, so a test can keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MockDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = ConnectionRecord>) -> Self {
        let directory = Self::new();
        for record in records {
            directory.upsert(record);
        }
        directory
    }

    /// Inserts or replaces a record.
    pub fn upsert(&self, record: ConnectionRecord) {
        lock(&self.state).records.insert(record.id, record);
    }

    /// Deletes a record.
    pub fn remove(&self, id: ConnectionId) {
        lock(&self.state).records.remove(&id);
    }

    /// Makes lookups for `provider_type` fail until [`recover`](Self::recover).
    pub fn fail(&self, provider_type: ProviderType) {
        lock(&self.state).failing.insert(provider_type);
    }

    /// Clears a failure set with [`fail`](Self::fail).
    pub fn recover(&self, provider_type: ProviderType) {
        lock(&self.state).failing.remove(&provider_type);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait::async_trait]
impl ConnectionDirectory for MockDirectory {
    async fn get_connections_by_type(
        &self,
        provider_type: ProviderType,
    ) -> Result<Vec<ConnectionRecord>> {
        let mut state = lock(&self.state);
        state.calls += 1;

        if state.failing.contains(&provider_type) {
            return Err(Error::new(ErrorKind::ServiceUnavailable)
                .with_message(format!("directory unavailable for {provider_type}")));
        }

        Ok(state
            .records
            .values()
            .filter(|record| record.provider_type == provider_type)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let state = lock(&self.state);
        if state.failing.is_empty() {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::degraded(format!(
                "{} provider lookups failing",
                state.failing.len()
            )))
        }
    }
}
