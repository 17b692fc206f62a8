//! Time-series sink seam.

use std::sync::Arc;
use std::time::Instant;

use crate::types::Point;
use crate::{Result, ServiceHealth, TRACING_TARGET_SINK};

/// Destination for tagged, timestamped numeric points.
#[async_trait::async_trait]
pub trait TimeSeriesSink: Send + Sync {
    /// Writes a single point.
    async fn write(&self, point: &Point) -> Result<()>;

    /// Checks that the sink can be reached.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Cheaply cloneable sink handle that logs every write.
#[derive(Clone)]
pub struct SinkService {
    inner: Arc<dyn TimeSeriesSink>,
}

impl std::fmt::Debug for SinkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkService").finish_non_exhaustive()
    }
}

impl SinkService {
    /// Wraps a sink implementation.
    pub fn new<S>(sink: S) -> Self
    where
        S: TimeSeriesSink + 'static,
    {
        Self {
            inner: Arc::new(sink),
        }
    }

    /// Writes a point. Failures are logged here and returned to the caller.
    pub async fn write(&self, point: &Point) -> Result<()> {
        let started_at = Instant::now();
        let result = self.inner.write(point).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(()) => tracing::trace!(
                target: TRACING_TARGET_SINK,
                measurement = %point.measurement,
                elapsed_ms = elapsed.as_millis() as u64,
                "Point written"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_SINK,
                measurement = %point.measurement,
                error = %error,
                elapsed_ms = elapsed.as_millis() as u64,
                "Point write failed"
            ),
        }

        result
    }

    /// Checks sink health.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        let started_at = Instant::now();
        let health = self.inner.health_check().await?;
        Ok(health.with_response_time(started_at.elapsed()))
    }
}
