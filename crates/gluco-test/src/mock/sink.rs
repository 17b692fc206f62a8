//! Mock time-series sink.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use gluco_core::types::{Point, TAG_USER_ID, UserId};
use gluco_core::{Error, ErrorKind, Result, ServiceHealth, TimeSeriesSink};

use super::lock;

#[derive(Debug, Default)]
struct SinkState {
    points: Vec<Point>,
    failing_users: HashSet<String>,
    fail_all: bool,
    attempts: usize,
}

/// Sink that keeps every successfully written point in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every write while `failing` is set.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).fail_all = failing;
    }

    /// Rejects writes of points tagged with `user_id`.
    pub fn fail_for_user(&self, user_id: UserId) {
        lock(&self.state).failing_users.insert(user_id.to_string());
    }

    /// Points written so far, in write order.
    pub fn points(&self) -> Vec<Point> {
        lock(&self.state).points.clone()
    }

    /// Points tagged with `user_id`.
    pub fn points_for(&self, user_id: UserId) -> Vec<Point> {
        let user_id = user_id.to_string();
        lock(&self.state)
            .points
            .iter()
            .filter(|point| point.tag(TAG_USER_ID) == Some(user_id.as_str()))
            .cloned()
            .collect()
    }

    /// Number of write calls, failed ones included.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }
}

#[async_trait::async_trait]
impl TimeSeriesSink for RecordingSink {
    async fn write(&self, point: &Point) -> Result<()> {
        let mut state = lock(&self.state);
        state.attempts += 1;

        let rejected = state.fail_all
            || point
                .tag(TAG_USER_ID)
                .is_some_and(|user_id| state.failing_users.contains(user_id));
        if rejected {
            return Err(Error::new(ErrorKind::ServiceUnavailable).with_message("sink rejected write"));
        }

        state.points.push(point.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        if lock(&self.state).fail_all {
            return Err(Error::new(ErrorKind::ServiceUnavailable).with_message("sink unreachable"));
        }
        Ok(ServiceHealth::healthy())
    }
}
