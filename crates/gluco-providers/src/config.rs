//! Provider HTTP client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for provider HTTP requests: 15 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration shared by every provider session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProviderHttpConfig {
    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "provider-http-timeout",
            env = "PROVIDER_HTTP_TIMEOUT",
            default_value_t = DEFAULT_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "provider-user-agent", env = "PROVIDER_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Dexcom Share base URL, replacing the regional default
    #[cfg_attr(
        feature = "config",
        arg(long = "dexcom-base-url", env = "DEXCOM_BASE_URL")
    )]
    #[serde(default)]
    pub dexcom_base_url: Option<Url>,

    /// LibreLinkUp base URL, replacing the regional default and its redirects
    #[cfg_attr(
        feature = "config",
        arg(long = "libre-base-url", env = "LIBRE_BASE_URL")
    )]
    #[serde(default)]
    pub libre_base_url: Option<Url>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderHttpConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_timeout_secs(),
            user_agent: None,
            dexcom_base_url: None,
            libre_base_url: None,
        }
    }
}

impl ProviderHttpConfig {
    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("gluco/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Points Dexcom sessions at `base_url`.
    #[must_use]
    pub fn with_dexcom_base_url(mut self, base_url: Url) -> Self {
        self.dexcom_base_url = Some(base_url);
        self
    }

    /// Points LibreLinkUp sessions at `base_url`.
    #[must_use]
    pub fn with_libre_base_url(mut self, base_url: Url) -> Self {
        self.libre_base_url = Some(base_url);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderHttpConfig::default();
        assert_eq!(config.effective_timeout(), Duration::from_secs(15));
        assert!(config.effective_user_agent().starts_with("gluco/"));
        assert!(config.dexcom_base_url.is_none());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = ProviderHttpConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
