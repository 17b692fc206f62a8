//! The scheduler loop tying reconciliation and polling together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gluco_core::crypto::CredentialCodec;
use gluco_core::{DirectoryService, ServiceHealth, SessionFactory, SinkService};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::poll::{PollReport, Poller};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::registry::SessionRegistry;
use crate::{EngineConfig, Result, TRACING_TARGET_ENGINE, WorkerError};

/// Collaborators the engine needs.
///
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct EngineState {
    /// Connection directory.
    pub directory: DirectoryService,
    /// Time-series sink.
    pub sink: SinkService,
    /// Builds provider sessions.
    pub factory: Arc<dyn SessionFactory>,
    /// Opens stored credentials.
    pub codec: CredentialCodec,
}

impl EngineState {
    /// Bundles the engine's collaborators.
    pub fn new(
        directory: DirectoryService,
        sink: SinkService,
        factory: Arc<dyn SessionFactory>,
        codec: CredentialCodec,
    ) -> Self {
        Self {
            directory,
            sink,
            factory,
            codec,
        }
    }

    /// Checks the directory and the sink concurrently.
    ///
    /// A check that fails or exceeds `deadline` is reported as unhealthy.
    pub async fn check_health(&self, deadline: Duration) -> DependencyHealth {
        let (directory, sink) = tokio::join!(
            bounded_health(deadline, self.directory.health_check()),
            bounded_health(deadline, self.sink.health_check()),
        );

        DependencyHealth { directory, sink }
    }
}

/// Health of the directory and the sink at one point in time.
#[derive(Debug, Clone)]
pub struct DependencyHealth {
    /// Connection directory health.
    pub directory: ServiceHealth,
    /// Time-series sink health.
    pub sink: ServiceHealth,
}

impl DependencyHealth {
    /// Returns `true` when neither dependency is unhealthy.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.directory.is_operational() && self.sink.is_operational()
    }
}

async fn bounded_health(
    deadline: Duration,
    check: impl Future<Output = gluco_core::Result<ServiceHealth>>,
) -> ServiceHealth {
    match tokio::time::timeout(deadline, check).await {
        Ok(Ok(health)) => health,
        Ok(Err(error)) => ServiceHealth::unhealthy(error.to_string()),
        Err(_) => ServiceHealth::unhealthy(format!("health check exceeded {deadline:?}")),
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Registry changes.
    pub reconcile: ReconcileReport,
    /// Polling outcomes.
    pub poll: PollReport,
    /// Wall time the tick took.
    pub elapsed: Duration,
}

impl TickReport {
    fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            added = self.reconcile.added,
            removed = self.reconcile.removed,
            construction_failures = self.reconcile.failed.len(),
            skipped_providers = ?self.reconcile.skipped_providers,
            live_sessions = self.reconcile.registry_size,
            delivered = self.poll.delivered,
            recovered = self.poll.recovered,
            transient = self.poll.transient,
            auth_gave_up = self.poll.auth_gave_up,
            sink_failed = self.poll.sink_failed,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "Tick completed"
        );
    }
}

/// Owns the session registry and drives reconcile-then-poll ticks.
pub struct IngestionEngine {
    config: EngineConfig,
    registry: SessionRegistry,
    reconciler: Reconciler,
    poller: Poller,
}

impl IngestionEngine {
    /// Creates an engine with an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidConfig`] when `config` fails validation.
    pub fn new(state: EngineState, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let registry = SessionRegistry::new();

        let reconciler = Reconciler::new(
            state.directory,
            state.codec,
            state.factory,
            registry.clone(),
            config.providers.clone(),
            config.directory_timeout(),
            config.provider_timeout(),
            config.max_concurrent_polls,
        );

        let poller = Poller::new(
            state.sink,
            config.max_concurrent_polls,
            config.provider_timeout(),
            config.sink_timeout(),
        );

        Ok(Self {
            config,
            registry,
            reconciler,
            poller,
        })
    }

    /// The registry this engine maintains.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Runs one tick: reconcile the registry, then poll every live session.
    ///
    /// Polling only starts once reconciliation has been fully applied.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_ENGINE, name = "tick")]
    pub async fn tick(&self) -> TickReport {
        let started_at = Instant::now();

        let reconcile = self.reconciler.reconcile().await;
        let sessions = self.registry.snapshot().await;
        let poll = self.poller.poll_all(sessions).await;

        TickReport {
            reconcile,
            poll,
            elapsed: started_at.elapsed(),
        }
    }

    /// Spawns the scheduler loop as a background task.
    ///
    /// The loop stops once `cancel_token` is cancelled and the current tick is done.
    pub fn spawn(self, cancel_token: CancellationToken) -> EngineHandle {
        let registry = self.registry.clone();
        let join = tokio::spawn(self.run(cancel_token.clone()));

        EngineHandle {
            cancel_token,
            join: Some(join),
            registry,
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(interval_secs = self.config.tick_interval_secs),
        target = TRACING_TARGET_ENGINE,
        name = "ingestion_engine"
    )]
    async fn run(self, cancel_token: CancellationToken) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            providers = ?self.config.providers,
            max_concurrent_polls = self.config.max_concurrent_polls,
            "Starting ingestion engine"
        );

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET_ENGINE,
                        "Shutdown requested, stopping ingestion engine"
                    );
                    break;
                }

                _ = ticker.tick() => {}
            }

            // Runs to completion even if cancelled meanwhile; every call inside is
            // bounded by its timeout.
            let report = self.tick().await;
            report.log();
        }

        self.registry.clear().await;
        tracing::info!(target: TRACING_TARGET_ENGINE, "Ingestion engine stopped");

        Ok(())
    }
}

/// Handle on a spawned [`IngestionEngine`].
#[derive(Debug)]
pub struct EngineHandle {
    cancel_token: CancellationToken,
    join: Option<JoinHandle<Result<()>>>,
    registry: SessionRegistry,
}

impl EngineHandle {
    /// Number of live sessions.
    pub async fn registry_size(&self) -> usize {
        self.registry.len().await
    }

    /// The registry the engine maintains.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Returns `true` once the scheduler task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits until the scheduler task exits, without asking it to stop.
    ///
    /// Cancel safe. Returns immediately once the exit has been observed.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(join) = self.join.as_mut() else {
            return Ok(());
        };

        let joined = join.await;
        self.join = None;
        joined?
    }

    /// Stops scheduling new ticks and waits for the current one to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            "Initiating graceful shutdown of ingestion engine"
        );
        self.cancel_token.cancel();
        self.wait().await
    }

    /// Like [`shutdown`](Self::shutdown), aborting the task after `deadline`.
    pub async fn shutdown_with_timeout(self, deadline: Duration) -> Result<()> {
        self.cancel_token.cancel();

        let Some(mut join) = self.join else {
            return Ok(());
        };

        match tokio::time::timeout(deadline, &mut join).await {
            Ok(joined) => joined?,
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_ENGINE,
                    deadline = ?deadline,
                    "Ingestion engine did not stop in time, aborting"
                );
                join.abort();
                Err(WorkerError::ShutdownTimeout(deadline))
            }
        }
    }
}
