#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod bootstrap;
mod config;
mod shutdown;
mod telemetry;

use std::process;
use std::time::Instant;

use anyhow::{Context, anyhow};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "gluco_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "gluco_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "gluco_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(cli.runtime.log_format)?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting gluco ingestion engine"
    );

    cli.log();
    cli.validate()?;

    let codec = cli.runtime.codec()?;
    let engine = bootstrap::create_engine(&cli, codec).await?;

    let started_at = Instant::now();
    let cancel_token = CancellationToken::new();
    let mut handle = engine.spawn(cancel_token.clone());

    tokio::select! {
        () = shutdown::shutdown_signal() => {}
        stopped = handle.wait() => {
            stopped.context("ingestion engine failed")?;
            return Err(anyhow!("ingestion engine stopped unexpectedly"));
        }
    }

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        timeout_secs = cli.runtime.shutdown_timeout,
        live_sessions = handle.registry_size().await,
        "Graceful shutdown initiated"
    );

    cancel_token.cancel();
    handle
        .shutdown_with_timeout(cli.runtime.shutdown_timeout())
        .await
        .context("ingestion engine did not shut down cleanly")?;

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        uptime_secs = started_at.elapsed().as_secs(),
        "Shutdown completed"
    );

    Ok(())
}
