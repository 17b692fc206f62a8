//! Process-level settings that belong to no single library crate.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, ValueEnum};
use gluco_core::crypto::{CredentialCodec, EncryptionKey};
use serde::{Deserialize, Serialize};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines with ANSI colors.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Credential key, migrations and lifecycle settings.
#[derive(Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct RuntimeConfig {
    /// Base64-encoded 32-byte key sealing stored provider passwords.
    #[arg(long, env = "CREDENTIAL_ENCRYPTION_KEY", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub credential_encryption_key: String,

    /// Skips applying pending database migrations at startup.
    #[arg(long, env = "SKIP_MIGRATIONS", default_value_t = false)]
    #[serde(default)]
    pub skip_migrations: bool,

    /// Maximum time to wait for the current tick after a shutdown signal.
    ///
    /// Valid range: 1-300 seconds.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl RuntimeConfig {
    /// Validates ranges. The encryption key is checked by [`codec`](Self::codec).
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.shutdown_timeout == 0 || self.shutdown_timeout > 300 {
            return Err(anyhow!(
                "Shutdown timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.shutdown_timeout
            ));
        }

        Ok(())
    }

    /// Returns the graceful shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Decodes the encryption key into a credential codec.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing, is not base64 or is not 32 bytes long.
    pub fn codec(&self) -> anyhow::Result<CredentialCodec> {
        let encoded = self.credential_encryption_key.trim();
        if encoded.is_empty() {
            return Err(anyhow!("CREDENTIAL_ENCRYPTION_KEY is not set"));
        }

        let key = EncryptionKey::from_base64(encoded)
            .context("CREDENTIAL_ENCRYPTION_KEY is not a valid 32-byte base64 key")?;

        Ok(CredentialCodec::new(key))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            credential_encryption_key: String::new(),
            skip_migrations: false,
            shutdown_timeout: default_shutdown_timeout(),
            log_format: LogFormat::Text,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("credential_encryption_key", &"****")
            .field("skip_migrations", &self.skip_migrations)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("log_format", &self.log_format)
            .finish()
    }
}
