//! Mock session factory.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use gluco_core::types::{ConnectionId, ConnectionRecord, ProviderCredential};
use gluco_core::{BoxedSession, Error, ErrorKind, Result, SessionFactory};

use super::lock;
use super::session::{ScriptedSession, SessionProbe, SessionScript};

#[derive(Debug, Default)]
struct FactoryState {
    scripts: HashMap<ConnectionId, SessionScript>,
    probes: HashMap<ConnectionId, Arc<SessionProbe>>,
    credentials: HashMap<ConnectionId, ProviderCredential>,
    failing: HashSet<ConnectionId>,
    attempts: usize,
}

/// Factory building [`ScriptedSession`]s keyed by connection id.
///
/// Connections without a script get [`SessionScript::default`]. Every session built
/// for the same connection reports to the same [`SessionProbe`].
#[derive(Debug, Clone, Default)]
pub struct MockSessionFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockSessionFactory {
    /// Creates a factory with no scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script used for sessions of `id`.
    pub fn script(&self, id: ConnectionId, script: SessionScript) -> &Self {
        lock(&self.state).scripts.insert(id, script);
        self
    }

    /// Makes construction for `id` fail until [`succeed`](Self::succeed).
    pub fn fail(&self, id: ConnectionId) -> &Self {
        lock(&self.state).failing.insert(id);
        self
    }

    /// Lets construction for `id` succeed again.
    pub fn succeed(&self, id: ConnectionId) -> &Self {
        lock(&self.state).failing.remove(&id);
        self
    }

    /// Probe shared by all sessions of `id`.
    pub fn probe(&self, id: ConnectionId) -> Arc<SessionProbe> {
        lock(&self.state).probes.entry(id).or_default().clone()
    }

    /// Credential the last session of `id` was built with.
    pub fn credential(&self, id: ConnectionId) -> Option<ProviderCredential> {
        lock(&self.state).credentials.get(&id).cloned()
    }

    /// Number of construction attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }
}

#[async_trait::async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create_session(
        &self,
        record: &ConnectionRecord,
        credential: ProviderCredential,
    ) -> Result<BoxedSession> {
        let mut state = lock(&self.state);
        state.attempts += 1;

        if state.failing.contains(&record.id) {
            return Err(Error::new(ErrorKind::Authentication)
                .with_message(format!("login rejected for connection {}", record.id)));
        }

        let script = state.scripts.get(&record.id).cloned().unwrap_or_default();
        let probe = state.probes.entry(record.id).or_default().clone();
        state.credentials.insert(record.id, credential);

        Ok(Box::new(ScriptedSession::new(
            record.provider_type,
            script,
            probe,
        )))
    }
}
