//! Client for the upstream document service.
//!
//! [`UpstreamClient`] resolves a bearer credential for each call (cached
//! session or fresh login), proxies one document operation, and purges the
//! cached session when the upstream rejects it.
//!
//! ```ignore
//! use docbridge_upstream::{UpstreamClient, UpstreamConfig};
//!
//! let client = UpstreamClient::new(UpstreamConfig::new("http://service-a:3000"), sessions)?;
//! let documents = client.list(&credentials).await?;
//! ```

mod auth;
mod client;
mod config;

pub use client::{STALE_CREDENTIAL_MESSAGE, UpstreamClient};
pub use config::UpstreamConfig;
