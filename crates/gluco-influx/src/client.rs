//! InfluxDB HTTP client.

use std::sync::Arc;

use gluco_core::types::Point;
use gluco_core::{ServiceHealth, TimeSeriesSink};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::{InfluxConfig, InfluxError, Result, TRACING_TARGET_CLIENT, line};

const WRITE_PATH: &str = "api/v2/write";
const HEALTH_PATH: &str = "health";

/// Inner client that holds the HTTP client and configuration.
struct InfluxClientInner {
    http: Client,
    config: InfluxConfig,
    base_url: Url,
}

/// InfluxDB v2 client writing points into one bucket.
///
/// Cheap to clone. Implements [`TimeSeriesSink`].
#[derive(Clone)]
pub struct InfluxClient {
    inner: Arc<InfluxClientInner>,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Error body returned by the InfluxDB API.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
    message: Option<String>,
}

impl InfluxClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the TLS backend cannot be
    /// initialized.
    pub fn new(config: InfluxConfig) -> Result<Self> {
        config.validate()?;

        let mut base_url = config.host_url()?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            host = %base_url,
            org = %config.org,
            bucket = %config.bucket,
            token = config.masked_token(),
            "Creating InfluxDB client"
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("gluco/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let inner = InfluxClientInner {
            http,
            config,
            base_url,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &InfluxConfig {
        &self.inner.config
    }

    /// Resolves an API path against the configured host.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Starts a request carrying the API token.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match self.inner.config.token.as_str() {
            "" => builder,
            token => builder.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
        }
    }

    /// Writes points to the configured bucket with nanosecond precision.
    pub async fn write_points(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body = points
            .iter()
            .map(line::encode)
            .collect::<Result<Vec<_>>>()?
            .join("\n");

        let config = self.config();
        let mut url = self.endpoint(WRITE_PATH)?;
        url.query_pairs_mut()
            .append_pair("org", &config.org)
            .append_pair("bucket", &config.bucket)
            .append_pair("precision", "ns");

        let response = self
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;
        check(response).await?;

        tracing::trace!(
            target: TRACING_TARGET_CLIENT,
            bucket = %config.bucket,
            points = points.len(),
            "Points written"
        );

        Ok(())
    }

    /// Queries `/health`.
    pub async fn health(&self) -> Result<ServiceHealth> {
        let response = self
            .request(Method::GET, self.endpoint(HEALTH_PATH)?)
            .send()
            .await?;

        let status = response.status();
        let body: Option<HealthBody> = response.json().await.ok();

        let health = match body {
            Some(body) if status.is_success() && body.status == "pass" => ServiceHealth::healthy(),
            Some(body) => ServiceHealth::unhealthy(
                body.message
                    .unwrap_or_else(|| format!("InfluxDB reports '{}'", body.status)),
            ),
            None => ServiceHealth::unhealthy(format!("InfluxDB health returned HTTP {status}")),
        };

        Ok(health)
    }
}

/// Passes successful responses through, turning the rest into [`InfluxError::Status`].
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&text)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(text);

    Err(InfluxError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl TimeSeriesSink for InfluxClient {
    async fn write(&self, point: &Point) -> gluco_core::Result<()> {
        self.write_points(std::slice::from_ref(point))
            .await
            .map_err(Into::into)
    }

    async fn health_check(&self) -> gluco_core::Result<ServiceHealth> {
        self.health().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let config = InfluxConfig::new("http://localhost:8086", "", "", "glucose");
        assert!(InfluxClient::new(config).is_err());
    }

    #[test]
    fn endpoints_keep_host_prefix() {
        let config = InfluxConfig::new("http://proxy.local/influx", "t", "org", "glucose");
        let client = InfluxClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(WRITE_PATH).unwrap().as_str(),
            "http://proxy.local/influx/api/v2/write"
        );
    }
}
