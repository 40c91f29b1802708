//! Upstream endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Where the upstream document service lives and how to reach it.
///
/// Passed explicitly to [`UpstreamClient`](crate::UpstreamClient) at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://service-a:3000`. Also the service identity
    /// used as the session cache key.
    pub host: String,
    pub api_version: String,
    pub docs_path: String,
    pub auth_path: String,
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:3000".into(),
            api_version: "v1".into(),
            docs_path: "documents".into(),
            auth_path: "auth".into(),
            request_timeout_ms: 10_000,
        }
    }
}

impl UpstreamConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout: u64) -> Self {
        self.request_timeout_ms = timeout;
        self
    }

    /// Identity of the upstream in the session cache: the host without a
    /// trailing slash.
    pub fn service_id(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// `{host}/{api_version}/{docs_path}`
    pub fn docs_url(&self) -> String {
        join(&self.host, &self.api_version, &self.docs_path)
    }

    /// `{host}/{api_version}/{auth_path}`
    pub fn auth_url(&self) -> String {
        join(&self.host, &self.api_version, &self.auth_path)
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.auth_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("upstream.host", &self.host),
            ("upstream.api_version", &self.api_version),
            ("upstream.docs_path", &self.docs_path),
            ("upstream.auth_path", &self.auth_path),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }

        let parsed = Url::parse(&self.host)
            .map_err(|e| format!("upstream.host '{}' is not a valid URL: {e}", self.host))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "upstream.host must use http or https, got '{}'",
                parsed.scheme()
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("upstream.request_timeout_ms must be greater than 0".into());
        }

        Ok(())
    }
}

fn join(host: &str, version: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        host.trim_end_matches('/'),
        version.trim_matches('/'),
        path.trim_matches('/')
    )
}
