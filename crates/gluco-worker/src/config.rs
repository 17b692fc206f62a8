//! Engine configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use gluco_core::types::ProviderType;
use serde::{Deserialize, Serialize};

use crate::{Result, WorkerError};

/// Default interval between ticks, in seconds.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Default number of sessions polled concurrently.
pub const DEFAULT_MAX_CONCURRENT_POLLS: usize = 10;

/// Default deadline for a single provider call (login, fetch), in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;

/// Default deadline for a single sink write, in seconds.
pub const DEFAULT_SINK_TIMEOUT_SECS: u64 = 10;

/// Default deadline for one directory lookup, in seconds.
pub const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 10;

/// Ingestion engine behavior settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EngineConfig {
    /// Interval between reconciliation-and-poll ticks, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-tick-interval-secs",
            env = "ENGINE_TICK_INTERVAL_SECS",
            default_value_t = DEFAULT_TICK_INTERVAL_SECS
        )
    )]
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Maximum sessions polled (or built) at the same time.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-max-concurrent-polls",
            env = "ENGINE_MAX_CONCURRENT_POLLS",
            default_value_t = DEFAULT_MAX_CONCURRENT_POLLS
        )
    )]
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,

    /// Deadline for each provider call, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-provider-timeout-secs",
            env = "ENGINE_PROVIDER_TIMEOUT_SECS",
            default_value_t = DEFAULT_PROVIDER_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Deadline for each sink write, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-sink-timeout-secs",
            env = "ENGINE_SINK_TIMEOUT_SECS",
            default_value_t = DEFAULT_SINK_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,

    /// Deadline for each directory lookup, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-directory-timeout-secs",
            env = "ENGINE_DIRECTORY_TIMEOUT_SECS",
            default_value_t = DEFAULT_DIRECTORY_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_directory_timeout_secs")]
    pub directory_timeout_secs: u64,

    /// Provider types the engine reconciles and polls.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "engine-providers",
            env = "ENGINE_PROVIDERS",
            value_delimiter = ',',
            default_values_t = [ProviderType::Dexcom, ProviderType::Libre]
        )
    )]
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderType>,
}

fn default_tick_interval_secs() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

fn default_max_concurrent_polls() -> usize {
    DEFAULT_MAX_CONCURRENT_POLLS
}

fn default_provider_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

fn default_sink_timeout_secs() -> u64 {
    DEFAULT_SINK_TIMEOUT_SECS
}

fn default_directory_timeout_secs() -> u64 {
    DEFAULT_DIRECTORY_TIMEOUT_SECS
}

fn default_providers() -> Vec<ProviderType> {
    ProviderType::all().collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            max_concurrent_polls: DEFAULT_MAX_CONCURRENT_POLLS,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            sink_timeout_secs: DEFAULT_SINK_TIMEOUT_SECS,
            directory_timeout_secs: DEFAULT_DIRECTORY_TIMEOUT_SECS,
            providers: default_providers(),
        }
    }
}

impl EngineConfig {
    /// Sets the concurrency limit.
    pub fn with_max_concurrent_polls(mut self, max_concurrent_polls: usize) -> Self {
        self.max_concurrent_polls = max_concurrent_polls;
        self
    }

    /// Restricts the engine to the given provider types.
    pub fn with_providers(mut self, providers: impl IntoIterator<Item = ProviderType>) -> Self {
        self.providers = providers.into_iter().collect();
        self
    }

    /// Returns the tick interval.
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Returns the provider call deadline.
    #[inline]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Returns the sink write deadline.
    #[inline]
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }

    /// Returns the directory lookup deadline.
    #[inline]
    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory_timeout_secs)
    }

    /// Validates ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.tick_interval_secs) {
            return Err(WorkerError::invalid_config(
                "tick interval must be between 1 and 3600 seconds",
            ));
        }

        if !(1..=1000).contains(&self.max_concurrent_polls) {
            return Err(WorkerError::invalid_config(
                "max concurrent polls must be between 1 and 1000",
            ));
        }

        for (name, secs) in [
            ("provider", self.provider_timeout_secs),
            ("sink", self.sink_timeout_secs),
            ("directory", self.directory_timeout_secs),
        ] {
            if !(1..=300).contains(&secs) {
                return Err(WorkerError::invalid_config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                )));
            }
        }

        if self.providers.is_empty() {
            return Err(WorkerError::invalid_config(
                "at least one provider type must be enabled",
            ));
        }

        Ok(())
    }
}
