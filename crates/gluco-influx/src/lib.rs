//! InfluxDB v2 sink.
//!
//! # Example
//!
//! ```rust,ignore
//! use gluco_core::SinkService;
//! use gluco_influx::{InfluxClient, InfluxConfig};
//!
//! let client = InfluxClient::new(config)?;
//! client.ensure_bucket().await?;
//!
//! let sink = SinkService::new(client);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for point writes and health checks.
pub const TRACING_TARGET_CLIENT: &str = "gluco_influx::client";

/// Tracing target for bucket bootstrap.
pub const TRACING_TARGET_BUCKET: &str = "gluco_influx::bucket";

mod bucket;
mod client;
mod config;
mod error;
pub mod line;

pub use bucket::{BucketOutcome, parse_retention};
pub use client::InfluxClient;
pub use config::InfluxConfig;
pub use error::{InfluxError, Result};
