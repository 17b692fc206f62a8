//! Wiring of the engine's collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gluco_core::crypto::CredentialCodec;
use gluco_core::{DirectoryService, ServiceHealth, SessionFactory, SinkService};
use gluco_influx::{BucketOutcome, InfluxClient};
use gluco_postgres::{PgClient, PgClientMigrationExt, PgConnectionDirectory};
use gluco_providers::ProviderHttpClient;
use gluco_worker::{EngineState, IngestionEngine};

use crate::TRACING_TARGET_STARTUP;
use crate::config::Cli;

/// Builds every collaborator and the engine on top of them.
///
/// Client construction and engine configuration can fail here. Migration, bucket
/// bootstrap and health check failures are logged; the engine retries the directory
/// and the sink on every tick.
pub async fn create_engine(cli: &Cli, codec: CredentialCodec) -> anyhow::Result<IngestionEngine> {
    let pg = PgClient::new(cli.postgres.clone()).context("failed to create database client")?;
    if cli.runtime.skip_migrations {
        tracing::info!(target: TRACING_TARGET_STARTUP, "Skipping database migrations");
    } else {
        apply_migrations(&pg).await;
    }

    let influx = InfluxClient::new(cli.influx.clone()).context("failed to create influxdb client")?;
    ensure_bucket(&influx).await;

    let providers =
        ProviderHttpClient::new(cli.providers.clone()).context("failed to create provider client")?;
    let factory: Arc<dyn SessionFactory> = Arc::new(providers.into_factory());

    let state = EngineState::new(
        DirectoryService::new(PgConnectionDirectory::new(pg)),
        SinkService::new(influx),
        factory,
        codec,
    );
    log_health(&state, cli.engine.directory_timeout()).await;

    IngestionEngine::new(state, cli.engine.clone())
        .context("failed to create ingestion engine")
}

async fn apply_migrations(pg: &PgClient) {
    match pg.run_pending_migrations().await {
        Ok(result) if result.is_no_op() => {
            tracing::info!(target: TRACING_TARGET_STARTUP, "Database schema is up to date");
        }
        Ok(result) => {
            tracing::info!(
                target: TRACING_TARGET_STARTUP,
                applied = ?result.processed_versions,
                duration_ms = result.duration.as_millis() as u64,
                "Database migrations applied"
            );
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_STARTUP,
                error = %error,
                "Failed to apply database migrations, continuing"
            );
        }
    }
}

async fn ensure_bucket(influx: &InfluxClient) {
    let bucket = &influx.config().bucket;
    match influx.ensure_bucket().await {
        Ok(BucketOutcome::Created) => {
            tracing::info!(target: TRACING_TARGET_STARTUP, bucket = %bucket, "Bucket created");
        }
        Ok(BucketOutcome::Updated) => {
            tracing::info!(
                target: TRACING_TARGET_STARTUP,
                bucket = %bucket,
                "Bucket retention updated"
            );
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_STARTUP,
                bucket = %bucket,
                error = %error,
                "Failed to bootstrap bucket, continuing"
            );
        }
    }
}

async fn log_health(state: &EngineState, deadline: Duration) {
    let health = state.check_health(deadline).await;
    log_dependency("directory", &health.directory);
    log_dependency("sink", &health.sink);
}

fn log_dependency(dependency: &'static str, health: &ServiceHealth) {
    let response_ms = health.response.map(|response| response.as_millis() as u64);
    if health.is_operational() {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            dependency,
            status = ?health.status,
            response_ms,
            message = health.message.as_deref(),
            "Dependency reachable"
        );
    } else {
        tracing::warn!(
            target: TRACING_TARGET_STARTUP,
            dependency,
            status = ?health.status,
            message = health.message.as_deref(),
            "Dependency unhealthy, continuing"
        );
    }
}
