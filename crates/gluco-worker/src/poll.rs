//! Polling live sessions and forwarding readings to the sink.
//!
//! Each session goes through a small state machine per tick:
//!
//! ```text
//! Fetching(1) --ok--> Delivering
//!             --auth--> Reauthenticating --ok--> Fetching(2) --ok--> Delivering
//!             --transient--> Done             --err--> Done   --err--> Done
//! ```
//!
//! A session is fetched at most twice per tick and re-authenticated at most once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gluco_core::types::{ConnectionId, GlucoseSample, Point, Reading};
use gluco_core::{Error, ProviderSession, SessionError, SessionResult, SinkService};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::TRACING_TARGET_POLL;
use crate::registry::LiveSession;

/// Fetch attempts allowed per session per tick.
const MAX_FETCH_ATTEMPTS: u8 = 2;

/// Final outcome of polling one session in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A reading was written to the sink after `attempts` fetches.
    Delivered {
        /// Fetch attempts used (1 or 2).
        attempts: u8,
    },
    /// The provider failed for a non-auth reason; skipped this tick.
    Transient,
    /// The session stayed rejected after one re-authentication, or
    /// re-authentication itself failed.
    AuthGaveUp,
    /// A reading was fetched but the sink write failed or timed out.
    SinkFailed,
}

/// Outcome counts of one polling pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Readings written to the sink.
    pub delivered: usize,
    /// Readings that needed a re-authentication first.
    pub recovered: usize,
    /// Sessions skipped after a transient failure.
    pub transient: usize,
    /// Sessions that stayed rejected.
    pub auth_gave_up: usize,
    /// Readings lost to sink failures.
    pub sink_failed: usize,
    /// Poll tasks that panicked.
    pub panicked: usize,
}

impl PollReport {
    fn record(&mut self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Delivered { attempts } => {
                self.delivered += 1;
                if attempts > 1 {
                    self.recovered += 1;
                }
            }
            PollOutcome::Transient => self.transient += 1,
            PollOutcome::AuthGaveUp => self.auth_gave_up += 1,
            PollOutcome::SinkFailed => self.sink_failed += 1,
        }
    }

    /// Total sessions polled.
    pub fn polled(&self) -> usize {
        self.delivered + self.transient + self.auth_gave_up + self.sink_failed + self.panicked
    }
}

#[derive(Debug, Clone, Copy)]
struct PollTimeouts {
    provider: Duration,
    sink: Duration,
}

/// Polls sessions on a bounded pool of tasks.
#[derive(Debug, Clone)]
pub struct Poller {
    sink: SinkService,
    semaphore: Arc<Semaphore>,
    timeouts: PollTimeouts,
}

impl Poller {
    /// Creates a poller running at most `max_concurrent` sessions at once.
    pub fn new(
        sink: SinkService,
        max_concurrent: usize,
        provider_timeout: Duration,
        sink_timeout: Duration,
    ) -> Self {
        Self {
            sink,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeouts: PollTimeouts {
                provider: provider_timeout,
                sink: sink_timeout,
            },
        }
    }

    /// Polls every session once and waits for all of them.
    ///
    /// One session's failure never affects another's.
    #[tracing::instrument(
        skip_all,
        fields(sessions = sessions.len()),
        target = TRACING_TARGET_POLL,
        name = "poll"
    )]
    pub async fn poll_all(&self, sessions: Vec<Arc<LiveSession>>) -> PollReport {
        let mut report = PollReport::default();
        let mut tasks = JoinSet::new();

        for live in sessions {
            // Hold the permit until the session is done.
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!(target: TRACING_TARGET_POLL, "Semaphore closed, stopping poll");
                    break;
                }
            };

            let sink = self.sink.clone();
            let timeouts = self.timeouts;
            tasks.spawn(async move {
                let _permit = permit;
                poll_session(&live, &sink, timeouts).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET_POLL,
                        error = %error,
                        "Poll task panicked"
                    );
                    report.panicked += 1;
                }
            }
        }

        report
    }
}

/// Fetches from one session (with the relogin retry) and writes the reading.
async fn poll_session(
    live: &LiveSession,
    sink: &SinkService,
    timeouts: PollTimeouts,
) -> PollOutcome {
    let connection_id = live.connection_id();

    let fetched = {
        let mut session = live.session().lock().await;
        fetch_with_relogin(&mut **session, connection_id, timeouts.provider).await
    };

    let (sample, attempts) = match fetched {
        Ok(fetched) => fetched,
        Err(outcome) => return outcome,
    };

    let reading = Reading::new(live.user_id(), live.provider_type(), sample);
    let point = Point::from_reading(&reading);

    match tokio::time::timeout(timeouts.sink, sink.write(&point)).await {
        Ok(Ok(())) => {
            tracing::debug!(
                target: TRACING_TARGET_POLL,
                connection_id = %connection_id,
                user_id = %reading.user_id,
                provider_type = %reading.provider_type,
                value = reading.value,
                attempts,
                "Reading delivered"
            );
            PollOutcome::Delivered { attempts }
        }
        Ok(Err(error)) => {
            tracing::warn!(
                target: TRACING_TARGET_POLL,
                connection_id = %connection_id,
                error = %error,
                "Sink write failed, dropping reading"
            );
            PollOutcome::SinkFailed
        }
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_POLL,
                connection_id = %connection_id,
                timeout = ?timeouts.sink,
                "Sink write timed out, dropping reading"
            );
            PollOutcome::SinkFailed
        }
    }
}

enum PollState {
    Fetching { attempt: u8 },
    Reauthenticating,
    Fetched { sample: GlucoseSample, attempts: u8 },
    Done(PollOutcome),
}

/// Runs the fetch / re-authenticate / fetch state machine against one session.
///
/// Returns the sample and the number of fetches it took, or the terminal outcome.
async fn fetch_with_relogin(
    session: &mut dyn ProviderSession,
    connection_id: ConnectionId,
    limit: Duration,
) -> Result<(GlucoseSample, u8), PollOutcome> {
    let mut state = PollState::Fetching { attempt: 1 };

    loop {
        state = match state {
            PollState::Fetching { attempt } => {
                match bounded(limit, session.fetch_reading()).await {
                    Ok(sample) => PollState::Fetched {
                        sample,
                        attempts: attempt,
                    },
                    Err(SessionError::Auth(error)) if attempt < MAX_FETCH_ATTEMPTS => {
                        tracing::info!(
                            target: TRACING_TARGET_POLL,
                            connection_id = %connection_id,
                            error = %error,
                            "Session rejected, re-authenticating"
                        );
                        PollState::Reauthenticating
                    }
                    Err(SessionError::Auth(error)) => {
                        tracing::warn!(
                            target: TRACING_TARGET_POLL,
                            connection_id = %connection_id,
                            error = %error,
                            "Session still rejected after re-authentication, giving up"
                        );
                        PollState::Done(PollOutcome::AuthGaveUp)
                    }
                    Err(SessionError::Transient(error)) => {
                        tracing::warn!(
                            target: TRACING_TARGET_POLL,
                            connection_id = %connection_id,
                            attempt,
                            retryable = error.is_retryable(),
                            error = %error,
                            "Transient provider failure, skipping this tick"
                        );
                        PollState::Done(PollOutcome::Transient)
                    }
                }
            }
            PollState::Reauthenticating => match bounded(limit, session.reauthenticate()).await {
                Ok(()) => PollState::Fetching {
                    attempt: MAX_FETCH_ATTEMPTS,
                },
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_POLL,
                        connection_id = %connection_id,
                        error = %error,
                        "Re-authentication failed, giving up"
                    );
                    PollState::Done(PollOutcome::AuthGaveUp)
                }
            },
            PollState::Fetched { sample, attempts } => return Ok((sample, attempts)),
            PollState::Done(outcome) => return Err(outcome),
        };
    }
}

/// Applies the provider deadline; an elapsed deadline is a transient failure.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = SessionResult<T>>,
) -> SessionResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Transient(Error::timeout(format!(
            "provider call exceeded {limit:?}"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use gluco_core::types::ProviderType;
    use gluco_test::{FetchStep, ReauthStep, ScriptedSession, SessionProbe, SessionScript};

    use super::*;

    const LIMIT: Duration = Duration::from_secs(20);

    type Fetched = Result<(GlucoseSample, u8), PollOutcome>;

    async fn run(script: SessionScript) -> (Fetched, Arc<SessionProbe>) {
        let probe = Arc::new(SessionProbe::default());
        let mut session = ScriptedSession::new(ProviderType::Dexcom, script, probe.clone());
        let result = fetch_with_relogin(&mut session, ConnectionId::new(1), LIMIT).await;
        (result, probe)
    }

    #[tokio::test]
    async fn success_on_first_fetch() {
        let (result, probe) = run(SessionScript::reading(6.1)).await;
        let (sample, attempts) = result.unwrap();
        assert_eq!((sample.value, attempts), (6.1, 1));
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (1, 0));
    }

    #[tokio::test]
    async fn auth_then_success_after_relogin() {
        let script = SessionScript::reading(5.6).then_fetch(FetchStep::Auth);
        let (result, probe) = run(script).await;
        let (sample, attempts) = result.unwrap();
        assert_eq!((sample.value, attempts), (5.6, 2));
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (2, 1));
    }

    #[tokio::test]
    async fn always_auth_stops_after_two_fetches() {
        let (result, probe) = run(SessionScript::always(FetchStep::Auth)).await;
        assert_eq!(result.unwrap_err(), PollOutcome::AuthGaveUp);
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (2, 1));
    }

    #[tokio::test]
    async fn failed_relogin_gives_up_immediately() {
        let script = SessionScript::always(FetchStep::Auth).reauth_always(ReauthStep::Auth);
        let (result, probe) = run(script).await;
        assert_eq!(result.unwrap_err(), PollOutcome::AuthGaveUp);
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (1, 1));
    }

    #[tokio::test]
    async fn transient_never_reauthenticates() {
        let (result, probe) = run(SessionScript::always(FetchStep::Transient)).await;
        assert_eq!(result.unwrap_err(), PollOutcome::Transient);
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (1, 0));
    }

    #[tokio::test]
    async fn transient_after_relogin_is_terminal() {
        let script = SessionScript::always(FetchStep::Transient).then_fetch(FetchStep::Auth);
        let (result, probe) = run(script).await;
        assert_eq!(result.unwrap_err(), PollOutcome::Transient);
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (2, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_fetch_times_out_as_transient() {
        let (result, probe) = run(SessionScript::always(FetchStep::Hang)).await;
        assert_eq!(result.unwrap_err(), PollOutcome::Transient);
        assert_eq!((probe.fetch_calls(), probe.reauth_calls()), (1, 0));
    }
}
