//! Authenticated proxy to the upstream document API.

use std::sync::Arc;

use docbridge_core::{
    DynSessionStore, ImportedDocument, RemoteDocument, SyncError, SyncResult, UpstreamCredentials,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use url::Url;

use crate::auth::UpstreamAuthenticator;
use crate::config::UpstreamConfig;

/// Message returned after a rejected token has been purged from the cache.
pub const STALE_CREDENTIAL_MESSAGE: &str = "stale credential invalidated, retry";

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

/// Proxies document operations to the upstream service on behalf of a user.
///
/// Every call resolves a bearer token first: the cached session when there is
/// one, otherwise a fresh login. When the upstream rejects the token (401/403)
/// the cached session is deleted and the call fails with `Unauthorized`. There
/// is no automatic retry; the caller re-issues the request, which then takes
/// the login path.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
    docs_base: Url,
    sessions: DynSessionStore,
    authenticator: UpstreamAuthenticator,
}

impl UpstreamClient {
    /// Builds the client and its shared HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Internal` if the documents URL does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: UpstreamConfig, sessions: DynSessionStore) -> SyncResult<Self> {
        let docs_base = Url::parse(&config.docs_url()).map_err(|e| {
            SyncError::internal(format!("invalid upstream documents url: {e}"))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::internal(format!("failed to build HTTP client: {e}")))?;

        let config = Arc::new(config);
        let authenticator =
            UpstreamAuthenticator::new(http.clone(), Arc::clone(&config), Arc::clone(&sessions));

        Ok(Self {
            http,
            config,
            docs_base,
            sessions,
            authenticator,
        })
    }

    /// Identity of the upstream in the session cache.
    pub fn service_id(&self) -> &str {
        self.config.service_id()
    }

    /// Resolves the `Authorization: Bearer` header for `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized("Not authenticated")` if no token can be obtained.
    pub async fn resolve_credential(
        &self,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<HeaderMap> {
        let (headers, _caching) = self.authorize(credentials).await?;
        Ok(headers)
    }

    /// Bearer headers plus, after a fresh login, the task caching the token.
    async fn authorize(
        &self,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<(HeaderMap, Option<JoinHandle<()>>)> {
        let user = credentials.user_id();
        let service = self.service_id();

        let (token, caching) = match self.sessions.get(user, service).await {
            Ok(session) => (session.token, None),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(user = %user, service = %service, error = %e, "Session lookup failed, logging in");
                }
                let fresh = self.authenticator.login(credentials).await.map_err(|e| {
                    tracing::warn!(user = %user, service = %service, error = %e, "Upstream login failed");
                    SyncError::unauthorized("Not authenticated")
                })?;
                (fresh.token, Some(fresh.caching))
            }
        };

        if token.is_empty() {
            return Err(SyncError::unauthorized("Not authenticated"));
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SyncError::unauthorized("Not authenticated"))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok((headers, caching))
    }

    /// Fetches every upstream document.
    pub async fn list(&self, credentials: &UpstreamCredentials) -> SyncResult<Vec<ImportedDocument>> {
        let url = self.docs_base.clone();
        tracing::info!(service = %self.service_id(), url = %url, "Fetching all documents");

        let request = self.http.get(url);
        let response = self
            .send(credentials, request, None, "fetching remote documents")
            .await?;
        let documents: Vec<RemoteDocument> = decode(response, "fetching remote documents").await?;

        Ok(documents.into_iter().map(ImportedDocument::from).collect())
    }

    /// Fetches a single upstream document.
    pub async fn get(
        &self,
        credentials: &UpstreamCredentials,
        id: &str,
    ) -> SyncResult<ImportedDocument> {
        self.document_call(credentials, Method::GET, id, None).await
    }

    /// Creates a document upstream.
    pub async fn create(
        &self,
        credentials: &UpstreamCredentials,
        title: &str,
    ) -> SyncResult<ImportedDocument> {
        let url = self.docs_base.clone();
        tracing::info!(service = %self.service_id(), url = %url, "Creating new document");

        let request = self.http.post(url).json(&TitleBody { title });
        let response = self
            .send(credentials, request, None, "creating a remote document")
            .await?;
        let document: RemoteDocument = decode(response, "creating a remote document").await?;

        Ok(document.into())
    }

    /// Replaces the title of an upstream document.
    pub async fn update(
        &self,
        credentials: &UpstreamCredentials,
        id: &str,
        title: &str,
    ) -> SyncResult<ImportedDocument> {
        self.document_call(credentials, Method::PUT, id, Some(title))
            .await
    }

    /// Deletes an upstream document, returning what the upstream removed.
    pub async fn delete(
        &self,
        credentials: &UpstreamCredentials,
        id: &str,
    ) -> SyncResult<ImportedDocument> {
        self.document_call(credentials, Method::DELETE, id, None).await
    }

    async fn document_call(
        &self,
        credentials: &UpstreamCredentials,
        method: Method,
        id: &str,
        title: Option<&str>,
    ) -> SyncResult<ImportedDocument> {
        let url = self.document_url(id)?;
        tracing::info!(
            service = %self.service_id(),
            url = %url,
            method = %method,
            ref_key = %id,
            "Forwarding document request"
        );

        let context = format!("{} remote document={id}", verb(&method));
        let mut request = self.http.request(method, url);
        if let Some(title) = title {
            request = request.json(&TitleBody { title });
        }

        let response = self.send(credentials, request, Some(id), &context).await?;
        let document: RemoteDocument = decode(response, &context).await?;

        Ok(document.into())
    }

    /// `{docs_url}/{id}` with `id` percent-encoded as one path segment.
    fn document_url(&self, id: &str) -> SyncResult<Url> {
        let mut url = self.docs_base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::internal("upstream documents url cannot be a base"))?
            .push(id);
        Ok(url)
    }

    /// Attaches credentials, sends, and maps the upstream status.
    ///
    /// `not_found_id` enables the 404 to `NotFound` mapping for calls that
    /// address a single document.
    async fn send(
        &self,
        credentials: &UpstreamCredentials,
        request: RequestBuilder,
        not_found_id: Option<&str>,
        context: &str,
    ) -> SyncResult<Response> {
        let (headers, caching) = self.authorize(credentials).await?;
        let service = self.service_id();

        let response = request.headers(headers).send().await.map_err(|e| {
            tracing::warn!(service = %service, error = %e, "Upstream request failed");
            SyncError::upstream_unavailable(format!("{context} at service={service}"), e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match (status, not_found_id) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(SyncError::not_found(format!(
                "document {id} not found upstream"
            ))),
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                self.invalidate(credentials, caching).await;
                Err(SyncError::unauthorized(STALE_CREDENTIAL_MESSAGE))
            }
            _ => {
                tracing::warn!(service = %service, status = status.as_u16(), "Unexpected upstream status");
                Err(match response.error_for_status() {
                    Err(e) => {
                        SyncError::upstream_unavailable(format!("{context} at service={service}"), e)
                    }
                    Ok(_) => SyncError::upstream_unavailable(
                        format!("{context} at service={service}"),
                        format!("unexpected status {status}"),
                    ),
                })
            }
        }
    }

    /// Drops the cached session so the next call logs in again.
    ///
    /// A token issued by this call's own login may still be on its way into
    /// the cache; that write is awaited first so the delete removes it.
    async fn invalidate(
        &self,
        credentials: &UpstreamCredentials,
        caching: Option<JoinHandle<()>>,
    ) {
        let user = credentials.user_id();
        let service = self.service_id();

        if let Some(caching) = caching
            && let Err(e) = caching.await
        {
            tracing::warn!(user = %user, service = %service, error = %e, "Session caching task failed");
        }

        match self.sessions.delete(user, service).await {
            Ok(_) => {
                tracing::warn!(user = %user, service = %service, "Upstream rejected the cached token; session deleted");
            }
            Err(e) => {
                tracing::warn!(user = %user, service = %service, error = %e, "Failed to delete stale session");
            }
        }
    }
}

fn verb(method: &Method) -> &'static str {
    if *method == Method::GET {
        "fetching"
    } else if *method == Method::PUT {
        "updating"
    } else if *method == Method::DELETE {
        "deleting"
    } else {
        "requesting"
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> SyncResult<T> {
    response
        .json()
        .await
        .map_err(|e| SyncError::upstream_unavailable(format!("decoding response while {context}"), e))
}
