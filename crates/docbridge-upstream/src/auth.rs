//! Login handshake against the upstream service.

use std::sync::Arc;

use docbridge_core::{DynSessionStore, SyncError, SyncResult, UpstreamCredentials};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::UpstreamConfig;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// A freshly issued token and the background task caching it.
pub(crate) struct FreshLogin {
    pub(crate) token: String,
    pub(crate) caching: JoinHandle<()>,
}

/// Exchanges end-user credentials for an upstream bearer token and caches it.
///
/// Only [`UpstreamClient`](crate::UpstreamClient) calls this.
#[derive(Clone)]
pub(crate) struct UpstreamAuthenticator {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
    sessions: DynSessionStore,
}

impl UpstreamAuthenticator {
    pub(crate) fn new(
        http: reqwest::Client,
        config: Arc<UpstreamConfig>,
        sessions: DynSessionStore,
    ) -> Self {
        Self {
            http,
            config,
            sessions,
        }
    }

    /// Logs in and returns the token without waiting for it to be cached.
    ///
    /// The returned handle resolves once the cache write has finished. Callers
    /// on the success path drop it; invalidation awaits it so the delete sees
    /// the row.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` when the upstream answers 401/403
    /// - `UpstreamUnavailable` for any other failure
    pub(crate) async fn login(&self, credentials: &UpstreamCredentials) -> SyncResult<FreshLogin> {
        let service = self.config.service_id();
        let url = self.config.login_url();
        tracing::info!(service = %service, url = %url, "Contacting upstream to authenticate");

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(service = %service, error = %e, "Upstream login request failed");
                SyncError::upstream_unavailable(
                    format!("authenticating on service={service}"),
                    e,
                )
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                user = %credentials.user_id(),
                service = %service,
                status = status.as_u16(),
                "Upstream rejected credentials"
            );
            return Err(SyncError::unauthorized(format!(
                "upstream service={service} rejected the credentials"
            )));
        }

        let response = response.error_for_status().map_err(|e| {
            SyncError::upstream_unavailable(format!("authenticating on service={service}"), e)
        })?;

        let body: LoginResponse = response.json().await.map_err(|e| {
            SyncError::upstream_unavailable(
                format!("decoding login response from service={service}"),
                e,
            )
        })?;

        let caching = self.persist(credentials.user_id(), &body.token);

        Ok(FreshLogin {
            token: body.token,
            caching,
        })
    }

    /// Caches the token in the background. Failures are logged and dropped.
    fn persist(&self, user_id: &str, token: &str) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        let user_id = user_id.to_string();
        let service_id = self.config.service_id().to_string();
        let token = token.to_string();

        tokio::spawn(async move {
            match sessions.create(&user_id, &service_id, &token).await {
                Ok(_) => {
                    tracing::debug!(user = %user_id, service = %service_id, "Cached upstream session");
                }
                Err(e) if e.is_conflict() => {
                    tracing::info!(
                        user = %user_id,
                        service = %service_id,
                        "Login attempted to store a duplicate session. Skipping"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        user = %user_id,
                        service = %service_id,
                        error = %e,
                        "Failed to store upstream session. Skipping"
                    );
                }
            }
        })
    }
}
