//! InfluxDB connection configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{InfluxError, Result, parse_retention};

/// Default InfluxDB host.
pub const DEFAULT_HOST: &str = "http://localhost:8086";

/// Default bucket retention.
pub const DEFAULT_RETENTION: &str = "30d";

/// Default request timeout: 10 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how points are written.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct InfluxConfig {
    /// InfluxDB base URL
    #[cfg_attr(
        feature = "config",
        arg(long = "influxdb-host", env = "INFLUXDB_HOST", default_value = DEFAULT_HOST)
    )]
    #[serde(default = "default_host")]
    pub host: String,

    /// API token with write access to the bucket
    #[cfg_attr(
        feature = "config",
        arg(
            long = "influxdb-token",
            env = "INFLUXDB_TOKEN",
            default_value = "",
            hide_env_values = true
        )
    )]
    #[serde(default, skip_serializing)]
    pub token: String,

    /// Organization owning the bucket
    #[cfg_attr(feature = "config", arg(long = "influxdb-org", env = "INFLUXDB_ORG"))]
    pub org: String,

    /// Bucket readings are written to
    #[cfg_attr(
        feature = "config",
        arg(long = "influxdb-bucket", env = "INFLUXDB_BUCKET")
    )]
    pub bucket: String,

    /// Bucket retention, e.g. 30d, 12h, 90m or 3600s
    #[cfg_attr(
        feature = "config",
        arg(
            long = "influxdb-retention",
            env = "INFLUXDB_RETENTION",
            default_value = DEFAULT_RETENTION
        )
    )]
    #[serde(default = "default_retention")]
    pub retention: String,

    /// Request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "influxdb-timeout",
            env = "INFLUXDB_TIMEOUT",
            default_value_t = DEFAULT_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_retention() -> String {
    DEFAULT_RETENTION.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl InfluxConfig {
    /// Creates a configuration with default retention and timeout.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
            retention: default_retention(),
            timeout: default_timeout_secs(),
        }
    }

    /// Sets the bucket retention.
    #[must_use]
    pub fn with_retention(mut self, retention: impl Into<String>) -> Self {
        self.retention = retention.into();
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = timeout_secs;
        self
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    /// Parses the host URL.
    pub fn host_url(&self) -> Result<Url> {
        Ok(Url::parse(self.host.trim())?)
    }

    /// Returns the retention period in seconds.
    pub fn retention_seconds(&self) -> Result<u64> {
        parse_retention(&self.retention)
    }

    /// Checks that the organization, bucket and retention are usable.
    pub fn validate(&self) -> Result<()> {
        if self.org.trim().is_empty() {
            return Err(InfluxError::Config("organization must not be empty".into()));
        }
        if self.bucket.trim().is_empty() {
            return Err(InfluxError::Config("bucket must not be empty".into()));
        }
        self.host_url()?;
        self.retention_seconds()?;
        Ok(())
    }

    /// Returns the token masked for logs.
    pub fn masked_token(&self) -> &'static str {
        if self.token.is_empty() { "<none>" } else { "****" }
    }
}

impl fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("host", &self.host)
            .field("token", &self.masked_token())
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("retention", &self.retention)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InfluxConfig {
        InfluxConfig::new(default_host(), "secret-token", "opengluco", "glucose")
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.retention, "30d");
        assert_eq!(config.retention_seconds().unwrap(), 30 * 24 * 3600);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(config().with_retention("30x").validate().is_err());
        assert!(InfluxConfig::new(default_host(), "", "", "glucose").validate().is_err());
        assert!(InfluxConfig::new(default_host(), "", "org", " ").validate().is_err());
        assert!(InfluxConfig::new("not a url", "", "org", "glucose").validate().is_err());
    }

    #[test]
    fn debug_masks_token() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("****"));
    }

    #[test]
    fn token_is_never_serialized() {
        let json = serde_json::to_string(&config()).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
