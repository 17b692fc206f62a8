//! CGM provider sessions over reqwest.
//!
//! # Example
//!
//! ```rust,ignore
//! use gluco_providers::{ProviderHttpClient, ProviderHttpConfig};
//!
//! let client = ProviderHttpClient::new(ProviderHttpConfig::default())?;
//! let factory = client.into_factory();
//!
//! let session = factory.create_session(&record, credential).await?;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the shared HTTP client.
pub const TRACING_TARGET_CLIENT: &str = "gluco_providers::client";

/// Tracing target for Dexcom Share sessions.
pub const TRACING_TARGET_DEXCOM: &str = "gluco_providers::dexcom";

/// Tracing target for LibreLinkUp sessions.
pub const TRACING_TARGET_LIBRE: &str = "gluco_providers::libre";

mod client;
mod config;
mod error;
mod factory;

pub mod dexcom;
pub mod libre;

pub use client::ProviderHttpClient;
pub use config::ProviderHttpConfig;
pub use error::{Error, Result};
pub use factory::HttpSessionFactory;
