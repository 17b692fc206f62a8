//! In-memory registry of live provider sessions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use gluco_core::BoxedSession;
use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderType, UserId};
use tokio::sync::{Mutex, RwLock};

/// A provider session bound to the connection it was built from.
///
/// `user_id` and `provider_type` are fixed at construction and are what every
/// reading from this session is attributed to.
pub struct LiveSession {
    connection_id: ConnectionId,
    user_id: UserId,
    provider_type: ProviderType,
    session: Mutex<BoxedSession>,
}

impl LiveSession {
    /// Binds a freshly built session to its connection record.
    pub fn new(record: &ConnectionRecord, session: BoxedSession) -> Self {
        Self {
            connection_id: record.id,
            user_id: record.user_id,
            provider_type: record.provider_type,
            session: Mutex::new(session),
        }
    }

    /// Connection this session belongs to.
    #[inline]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Owner of the connection.
    #[inline]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Provider the session talks to.
    #[inline]
    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    /// Exclusive access to the provider session for one poll.
    pub(crate) fn session(&self) -> &Mutex<BoxedSession> {
        &self.session
    }

    fn matches(&self, record: &ConnectionRecord) -> bool {
        self.user_id == record.user_id && self.provider_type == record.provider_type
    }
}

impl fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("connection_id", &self.connection_id)
            .field("user_id", &self.user_id)
            .field("provider_type", &self.provider_type)
            .finish_non_exhaustive()
    }
}

/// Changes needed to bring the registry in line with a directory snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryDiff {
    /// Live sessions to drop.
    pub to_remove: Vec<ConnectionId>,
    /// Records that need a new session.
    pub to_add: Vec<ConnectionRecord>,
}

impl RegistryDiff {
    /// Returns `true` when the registry already matches.
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Mapping of connection id to live session.
///
/// Holds at most one session per connection id. Only the reconciler mutates it;
/// the poller works from [`snapshot`](Self::snapshot)s. Clones share the same map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionId, Arc<LiveSession>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session unless one is already registered for its connection.
    ///
    /// Returns `false` and leaves the existing entry in place on conflict.
    pub async fn insert(&self, session: LiveSession) -> bool {
        let mut map = self.inner.write().await;
        match map.entry(session.connection_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Arc::new(session));
                true
            }
        }
    }

    /// Removes the session of `id`. Removing an unknown id is a no-op.
    ///
    /// Returns whether a session was removed.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Removes several sessions under one lock acquisition.
    ///
    /// Returns the number actually removed.
    pub async fn remove_all(&self, ids: &[ConnectionId]) -> usize {
        let mut map = self.inner.write().await;
        ids.iter().filter(|id| map.remove(id).is_some()).count()
    }

    /// Drops every session.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Returns the live sessions at this instant.
    pub async fn snapshot(&self) -> Vec<Arc<LiveSession>> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Returns the registered connection ids, sorted.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self.inner.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the session registered for `id`.
    pub async fn get(&self, id: ConnectionId) -> Option<Arc<LiveSession>> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Returns `true` if a session is registered for `id`.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` when no session is live.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Computes the changes needed to match `directory`.
    ///
    /// `reconciled` lists the provider types whose directory lookup succeeded this
    /// tick. Sessions of any other type are left untouched unless their id shows up
    /// in `directory` under different ownership.
    pub async fn diff(
        &self,
        directory: &[ConnectionRecord],
        reconciled: &HashSet<ProviderType>,
    ) -> RegistryDiff {
        let map = self.inner.read().await;
        diff(&map, directory, reconciled)
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

/// Diffs registry membership against a directory snapshot, keyed by connection id.
///
/// - a live session whose id is missing from a successfully read provider type is
///   removed;
/// - a live session whose id reappears with another owner or provider is removed
///   and rebuilt from the new record;
/// - a record with no live session is added.
fn diff(
    current: &HashMap<ConnectionId, Arc<LiveSession>>,
    directory: &[ConnectionRecord],
    reconciled: &HashSet<ProviderType>,
) -> RegistryDiff {
    let mut desired: HashMap<ConnectionId, &ConnectionRecord> = HashMap::with_capacity(directory.len());
    for record in directory {
        desired.entry(record.id).or_insert(record);
    }

    let mut result = RegistryDiff::default();

    for (id, live) in current {
        match desired.get(id) {
            Some(record) if live.matches(record) => {}
            Some(_) => result.to_remove.push(*id),
            None if reconciled.contains(&live.provider_type) => result.to_remove.push(*id),
            None => {}
        }
    }

    for (id, record) in &desired {
        let keep = current.get(id).is_some_and(|live| live.matches(record));
        if !keep {
            result.to_add.push((*record).clone());
        }
    }

    result.to_remove.sort_unstable();
    result.to_add.sort_unstable_by_key(|record| record.id);
    result
}

#[cfg(test)]
mod tests {
    use gluco_test::{Fixtures, ScriptedSession, SessionProbe, SessionScript};

    use super::*;

    fn live(fixtures: &Fixtures, id: i64, user_id: i64, provider_type: ProviderType) -> LiveSession {
        let record = fixtures.connection(id, user_id, provider_type);
        let session = ScriptedSession::new(
            provider_type,
            SessionScript::default(),
            Arc::new(SessionProbe::default()),
        );
        LiveSession::new(&record, Box::new(session))
    }

    fn all_types() -> HashSet<ProviderType> {
        ProviderType::all().collect()
    }

    #[tokio::test]
    async fn insert_never_duplicates() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();

        assert!(registry.insert(live(&fixtures, 1, 10, ProviderType::Dexcom)).await);
        assert!(!registry.insert(live(&fixtures, 1, 99, ProviderType::Libre)).await);

        assert_eq!(registry.len().await, 1);
        let kept = registry.get(ConnectionId::new(1)).await.unwrap();
        assert_eq!(kept.user_id(), UserId::new(10));
    }

    #[tokio::test]
    async fn removing_absent_id_is_noop() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();
        registry.insert(live(&fixtures, 1, 10, ProviderType::Dexcom)).await;

        assert!(!registry.remove(ConnectionId::new(7)).await);
        assert!(registry.remove(ConnectionId::new(1)).await);
        assert!(!registry.remove(ConnectionId::new(1)).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn diff_adds_and_removes() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();
        registry.insert(live(&fixtures, 1, 10, ProviderType::Dexcom)).await;
        registry.insert(live(&fixtures, 2, 20, ProviderType::Dexcom)).await;

        let directory = vec![
            fixtures.connection(2, 20, ProviderType::Dexcom),
            fixtures.connection(3, 30, ProviderType::Libre),
        ];
        let diff = registry.diff(&directory, &all_types()).await;

        assert_eq!(diff.to_remove, vec![ConnectionId::new(1)]);
        let added: Vec<_> = diff.to_add.iter().map(|record| record.id).collect();
        assert_eq!(added, vec![ConnectionId::new(3)]);
    }

    #[tokio::test]
    async fn diff_keeps_types_that_were_not_read() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();
        registry.insert(live(&fixtures, 1, 10, ProviderType::Dexcom)).await;
        registry.insert(live(&fixtures, 2, 20, ProviderType::Libre)).await;

        let reconciled = HashSet::from([ProviderType::Libre]);
        let diff = registry.diff(&[], &reconciled).await;

        assert_eq!(diff.to_remove, vec![ConnectionId::new(2)]);
        assert!(diff.to_add.is_empty());
    }

    #[tokio::test]
    async fn diff_rebuilds_on_ownership_change() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();
        registry.insert(live(&fixtures, 1, 10, ProviderType::Dexcom)).await;

        let directory = vec![fixtures.connection(1, 11, ProviderType::Dexcom)];
        let diff = registry.diff(&directory, &all_types()).await;

        assert_eq!(diff.to_remove, vec![ConnectionId::new(1)]);
        assert_eq!(diff.to_add.len(), 1);
        assert_eq!(diff.to_add[0].user_id, UserId::new(11));
    }

    #[tokio::test]
    async fn diff_ignores_duplicate_directory_rows() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();

        let directory = vec![
            fixtures.connection(5, 50, ProviderType::Dexcom),
            fixtures.connection(5, 50, ProviderType::Dexcom),
        ];
        let diff = registry.diff(&directory, &all_types()).await;

        assert_eq!(diff.to_add.len(), 1);
    }

    #[tokio::test]
    async fn matching_registry_yields_empty_diff() {
        let fixtures = Fixtures::new();
        let registry = SessionRegistry::new();
        registry.insert(live(&fixtures, 4, 40, ProviderType::Libre)).await;

        let directory = vec![fixtures.connection(4, 40, ProviderType::Libre)];
        assert!(registry.diff(&directory, &all_types()).await.is_empty());
    }
}
