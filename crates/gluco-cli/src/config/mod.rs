//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── runtime: RuntimeConfig        # Encryption key, migrations, shutdown, log format
//! ├── postgres: PgConfig            # Connection directory database
//! ├── influx: InfluxConfig          # Time-series sink
//! ├── providers: ProviderHttpConfig # Dexcom and Libre HTTP settings
//! └── engine: EngineConfig          # Tick interval, concurrency, deadlines
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! gluco --postgres-url "postgresql://..." --influxdb-org acme --influxdb-bucket glucose
//!
//! # Or via environment variables
//! POSTGRES_URL="postgresql://..." CREDENTIAL_ENCRYPTION_KEY="..." gluco
//! ```

mod runtime;

use std::process;

use anyhow::Context;
use clap::Parser;
use gluco_influx::InfluxConfig;
use gluco_postgres::PgConfig;
use gluco_providers::ProviderHttpConfig;
use gluco_worker::EngineConfig;
pub use runtime::{LogFormat, RuntimeConfig};
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "gluco")]
#[command(about = "Continuous glucose monitor ingestion engine")]
#[command(version)]
pub struct Cli {
    /// Process-level settings.
    #[clap(flatten)]
    pub runtime: RuntimeConfig,

    /// Connection directory database.
    #[clap(flatten)]
    pub postgres: PgConfig,

    /// Time-series sink.
    #[clap(flatten)]
    pub influx: InfluxConfig,

    /// Provider HTTP client settings.
    #[clap(flatten)]
    pub providers: ProviderHttpConfig,

    /// Scheduler behavior.
    #[clap(flatten)]
    pub engine: EngineConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is read before clap parses arguments so its values act as
    /// environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.runtime
            .validate()
            .context("invalid runtime configuration")?;
        self.postgres
            .validate()
            .context("invalid postgres configuration")?;
        self.influx
            .validate()
            .context("invalid influxdb configuration")?;
        self.engine
            .validate()
            .context("invalid engine configuration")?;
        Ok(())
    }

    /// Logs configuration without secrets.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            postgres_url = %self.postgres.database_url_masked(),
            postgres_max_connections = self.postgres.postgres_max_connections,
            postgres_connection_timeout_secs = ?self.postgres.postgres_connection_timeout_secs,
            postgres_idle_timeout_secs = ?self.postgres.postgres_idle_timeout_secs,
            skip_migrations = self.runtime.skip_migrations,
            "Database configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            host = %self.influx.host,
            org = %self.influx.org,
            bucket = %self.influx.bucket,
            retention = %self.influx.retention,
            token = self.influx.masked_token(),
            "InfluxDB configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            http_timeout_secs = self.providers.http_timeout,
            dexcom_base_url = ?self.providers.dexcom_base_url.as_ref().map(|url| url.as_str()),
            libre_base_url = ?self.providers.libre_base_url.as_ref().map(|url| url.as_str()),
            "Provider configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            tick_interval_secs = self.engine.tick_interval_secs,
            max_concurrent_polls = self.engine.max_concurrent_polls,
            provider_timeout_secs = self.engine.provider_timeout_secs,
            sink_timeout_secs = self.engine.sink_timeout_secs,
            directory_timeout_secs = self.engine.directory_timeout_secs,
            providers = ?self.engine.providers,
            shutdown_timeout_secs = self.runtime.shutdown_timeout,
            "Engine configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
