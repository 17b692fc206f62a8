#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the scheduler loop.
pub const TRACING_TARGET_ENGINE: &str = "gluco_worker::engine";

/// Tracing target for registry reconciliation.
pub const TRACING_TARGET_RECONCILE: &str = "gluco_worker::reconcile";

/// Tracing target for session polling.
pub const TRACING_TARGET_POLL: &str = "gluco_worker::poll";

mod config;
mod engine;
mod error;
mod poll;
mod reconcile;
mod registry;

pub use config::EngineConfig;
pub use engine::{DependencyHealth, EngineHandle, EngineState, IngestionEngine, TickReport};
pub use error::{Result, WorkerError};
pub use poll::{PollOutcome, PollReport, Poller};
pub use reconcile::{ReconcileReport, Reconciler};
pub use registry::{LiveSession, RegistryDiff, SessionRegistry};
