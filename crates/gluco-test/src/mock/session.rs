//! Scripted provider sessions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gluco_core::types::{GlucoseSample, ProviderType};
use gluco_core::{ErrorKind, ProviderSession, SessionError, SessionResult};
use jiff::Timestamp;

/// Outcome of one scripted `fetch_reading` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchStep {
    /// Returns a reading with this mmol/L value, observed now.
    Reading(f64),
    /// Returns a reading with an explicit observation time.
    ReadingAt(f64, Timestamp),
    /// Fails with [`SessionError::Auth`].
    Auth,
    /// Fails with [`SessionError::Transient`].
    Transient,
    /// Never completes.
    Hang,
}

/// Outcome of one scripted `reauthenticate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReauthStep {
    /// Succeeds.
    Ok,
    /// Fails with [`SessionError::Auth`].
    Auth,
    /// Fails with [`SessionError::Transient`].
    Transient,
}

/// Queue of outcomes a [`ScriptedSession`] replays, with defaults once drained.
#[derive(Debug, Clone)]
pub struct SessionScript {
    fetch: VecDeque<FetchStep>,
    fetch_default: FetchStep,
    reauth: VecDeque<ReauthStep>,
    reauth_default: ReauthStep,
}

impl SessionScript {
    /// Every fetch yields `step`; every re-authentication succeeds.
    pub fn always(step: FetchStep) -> Self {
        Self {
            fetch: VecDeque::new(),
            fetch_default: step,
            reauth: VecDeque::new(),
            reauth_default: ReauthStep::Ok,
        }
    }

    /// Every fetch returns `value`.
    pub fn reading(value: f64) -> Self {
        Self::always(FetchStep::Reading(value))
    }

    /// Queues `step` ahead of the default fetch outcome.
    pub fn then_fetch(mut self, step: FetchStep) -> Self {
        self.fetch.push_back(step);
        self
    }

    /// Queues `step` ahead of the default re-authentication outcome.
    pub fn then_reauth(mut self, step: ReauthStep) -> Self {
        self.reauth.push_back(step);
        self
    }

    /// Sets the outcome of re-authentication once the queue is drained.
    pub fn reauth_always(mut self, step: ReauthStep) -> Self {
        self.reauth_default = step;
        self
    }

    fn next_fetch(&mut self) -> FetchStep {
        self.fetch.pop_front().unwrap_or(self.fetch_default)
    }

    fn next_reauth(&mut self) -> ReauthStep {
        self.reauth.pop_front().unwrap_or(self.reauth_default)
    }
}

impl Default for SessionScript {
    fn default() -> Self {
        Self::reading(5.5)
    }
}

/// Shared counters for every session built for one connection.
#[derive(Debug, Default)]
pub struct SessionProbe {
    created: AtomicUsize,
    live: AtomicUsize,
    fetch_calls: AtomicUsize,
    reauth_calls: AtomicUsize,
}

impl SessionProbe {
    /// Number of sessions constructed.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of sessions currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Returns `true` once at least one session was built and all have been dropped.
    pub fn is_released(&self) -> bool {
        self.created() > 0 && self.live() == 0
    }

    /// Total `fetch_reading` calls across sessions.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Total `reauthenticate` calls across sessions.
    pub fn reauth_calls(&self) -> usize {
        self.reauth_calls.load(Ordering::SeqCst)
    }

    /// Resets the call counters, leaving lifecycle counters alone.
    pub fn reset_calls(&self) {
        self.fetch_calls.store(0, Ordering::SeqCst);
        self.reauth_calls.store(0, Ordering::SeqCst);
    }
}

/// Provider session that replays a [`SessionScript`].
#[derive(Debug)]
pub struct ScriptedSession {
    provider_type: ProviderType,
    script: SessionScript,
    probe: Arc<SessionProbe>,
}

impl ScriptedSession {
    /// Creates a session and registers it with `probe`.
    pub fn new(provider_type: ProviderType, script: SessionScript, probe: Arc<SessionProbe>) -> Self {
        probe.created.fetch_add(1, Ordering::SeqCst);
        probe.live.fetch_add(1, Ordering::SeqCst);
        Self {
            provider_type,
            script,
            probe,
        }
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.probe.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ProviderSession for ScriptedSession {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    async fn fetch_reading(&mut self) -> SessionResult<GlucoseSample> {
        self.probe.fetch_calls.fetch_add(1, Ordering::SeqCst);

        match self.script.next_fetch() {
            FetchStep::Reading(value) => Ok(GlucoseSample::new(value, Some(Timestamp::now()))),
            FetchStep::ReadingAt(value, at) => Ok(GlucoseSample::new(value, Some(at))),
            FetchStep::Auth => Err(SessionError::auth("scripted session expiry")),
            FetchStep::Transient => Err(SessionError::transient(
                ErrorKind::NetworkError,
                "scripted network failure",
            )),
            FetchStep::Hang => std::future::pending().await,
        }
    }

    async fn reauthenticate(&mut self) -> SessionResult<()> {
        self.probe.reauth_calls.fetch_add(1, Ordering::SeqCst);

        match self.script.next_reauth() {
            ReauthStep::Ok => Ok(()),
            ReauthStep::Auth => Err(SessionError::auth("scripted login rejection")),
            ReauthStep::Transient => Err(SessionError::transient(
                ErrorKind::NetworkError,
                "scripted network failure",
            )),
        }
    }
}
