#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Gluco Core
//!
//! Shared vocabulary for the ingestion engine: identifiers, readings and the
//! traits that separate the engine from its directory, its providers and its
//! time-series store. Nothing in this crate talks to the network.

/// Tracing target for connection directory operations.
pub const TRACING_TARGET_DIRECTORY: &str = "gluco_core::directory";

/// Tracing target for time-series sink operations.
pub const TRACING_TARGET_SINK: &str = "gluco_core::sink";

mod error;
mod health;

#[cfg(feature = "encryption")]
#[cfg_attr(docsrs, doc(cfg(feature = "encryption")))]
pub mod crypto;
pub mod directory;
pub mod session;
pub mod sink;
pub mod types;

pub use directory::{ConnectionDirectory, DirectoryService};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use session::{BoxedSession, ProviderSession, SessionError, SessionFactory, SessionResult};
pub use sink::{SinkService, TimeSeriesSink};
