//! Shared reqwest client for provider sessions.

use std::sync::Arc;

use reqwest::Client;

use crate::factory::HttpSessionFactory;
use crate::{ProviderHttpConfig, Result, TRACING_TARGET_CLIENT};

/// Inner client that holds the HTTP client and configuration.
struct ProviderHttpClientInner {
    http: Client,
    config: ProviderHttpConfig,
}

/// Connection-pooled HTTP client shared by every provider session.
///
/// Cheap to clone; sessions keep a clone for their whole lifetime.
#[derive(Clone)]
pub struct ProviderHttpClient {
    inner: Arc<ProviderHttpClientInner>,
}

impl std::fmt::Debug for ProviderHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHttpClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ProviderHttpClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: ProviderHttpConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            timeout_ms = timeout.as_millis() as u64,
            user_agent = %user_agent,
            "Creating provider HTTP client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()?;

        let inner = ProviderHttpClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ProviderHttpConfig {
        &self.inner.config
    }

    /// Converts this client into a [`HttpSessionFactory`].
    pub fn into_factory(self) -> HttpSessionFactory {
        HttpSessionFactory::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ProviderHttpClient::new(ProviderHttpConfig::default()).unwrap();
        assert!(client.config().user_agent.is_none());
    }
}
