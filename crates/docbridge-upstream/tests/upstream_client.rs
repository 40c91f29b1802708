//! Behaviour of the upstream client against a mock upstream service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docbridge_core::{
    AuthSession, DynSessionStore, ImportedDocument, SessionStore, StorageResult, SyncError,
    UpstreamCredentials,
};
use docbridge_db_memory::MemorySessionStore;
use docbridge_upstream::{STALE_CREDENTIAL_MESSAGE, UpstreamClient, UpstreamConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "jane@example.com";

fn credentials() -> UpstreamCredentials {
    UpstreamCredentials::new(EMAIL, "s3cret")
}

fn setup(server: &MockServer) -> (UpstreamClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let sessions: DynSessionStore = store.clone();
    let config = UpstreamConfig::new(server.uri()).with_request_timeout_ms(2000);
    let client = UpstreamClient::new(config, sessions).unwrap();
    (client, store)
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(body_json(json!({ "email": EMAIL, "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

/// The session is cached by a detached task; wait for it to land.
async fn wait_for_session(store: &MemorySessionStore, service: &str) -> Option<String> {
    for _ in 0..100 {
        if let Ok(session) = store.get(EMAIL, service).await {
            return Some(session.token);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn test_list_logs_in_and_translates_documents() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .and(header("Authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a", "title": "A" },
            { "id": "b", "title": "B" }
        ])))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    let documents = client.list(&credentials()).await.unwrap();

    assert_eq!(
        documents,
        vec![ImportedDocument::new("a", "A"), ImportedDocument::new("b", "B")]
    );
    assert_eq!(
        wait_for_session(&store, client.service_id()).await.as_deref(),
        Some("t1")
    );
}

#[tokio::test]
async fn test_cached_session_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "unused" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/a"))
        .and(header("Authorization", "Bearer cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a", "title": "A" })))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    store.create(EMAIL, client.service_id(), "cached").await.unwrap();

    let document = client.get(&credentials(), "a").await.unwrap();
    assert_eq!(document, ImportedDocument::new("a", "A"));
}

#[tokio::test]
async fn test_unauthorized_purges_session_and_next_call_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    store.create(EMAIL, client.service_id(), "stale").await.unwrap();

    let err = client.list(&credentials()).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized(ref m) if m == STALE_CREDENTIAL_MESSAGE));
    assert!(store.is_empty());

    // no automatic retry happened; the caller retries
    let documents = client.list(&credentials()).await.unwrap();
    assert!(documents.is_empty());
}

/// Session store whose inserts land only after a delay.
struct SlowCreateSessions {
    inner: Arc<MemorySessionStore>,
    delay: Duration,
}

#[async_trait]
impl SessionStore for SlowCreateSessions {
    async fn get(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        self.inner.get(user_id, service_id).await
    }

    async fn create(
        &self,
        user_id: &str,
        service_id: &str,
        token: &str,
    ) -> StorageResult<AuthSession> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(user_id, service_id, token).await
    }

    async fn delete(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        self.inner.delete(user_id, service_id).await
    }
}

#[tokio::test]
async fn test_token_rejected_before_it_is_cached_is_not_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t1" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t2" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .and(header("Authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .and(header("Authorization", "Bearer t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let sessions: DynSessionStore = Arc::new(SlowCreateSessions {
        inner: store.clone(),
        delay: Duration::from_millis(200),
    });
    let config = UpstreamConfig::new(server.uri()).with_request_timeout_ms(2000);
    let client = UpstreamClient::new(config, sessions).unwrap();

    let err = client.list(&credentials()).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized(ref m) if m == STALE_CREDENTIAL_MESSAGE));

    // the delayed insert of t1 must not survive the invalidation
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(store.is_empty());

    let documents = client.list(&credentials()).await.unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn test_forbidden_also_invalidates() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/a"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    store.create(EMAIL, client.service_id(), "stale").await.unwrap();

    let err = client.delete(&credentials(), "a").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_invalidation_of_missing_session_still_unauthorized() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    let err = client.list(&credentials()).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized(ref m) if m == STALE_CREDENTIAL_MESSAGE));
}

#[tokio::test]
async fn test_login_rejected_creates_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    let err = client.resolve_credential(&credentials()).await.unwrap_err();

    assert!(matches!(err, SyncError::Unauthorized(ref m) if m == "Not authenticated"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_server_error_is_unauthorized_for_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);
    let err = client.list(&credentials()).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_resolve_credential_builds_bearer_header() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;

    let (client, _store) = setup(&server);
    let headers = client.resolve_credential(&credentials()).await.unwrap();
    assert_eq!(headers["authorization"], "Bearer t1");
}

#[tokio::test]
async fn test_not_found_for_single_document_calls() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(path("/v1/documents/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    let creds = credentials();

    let err = client.get(&creds, "missing").await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound(ref m) if m == "document missing not found upstream"));
    assert!(client.update(&creds, "missing", "T").await.unwrap_err().is_not_found());
    assert!(client.delete(&creds, "missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_list_not_found_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    let err = client.list(&credentials()).await.unwrap_err();
    assert!(err.is_upstream_unavailable());
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/v1/documents"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    let err = client.create(&credentials(), "New").await.unwrap_err();
    assert!(err.is_upstream_unavailable());
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_malformed_body_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    assert!(client.list(&credentials()).await.unwrap_err().is_upstream_unavailable());
}

#[tokio::test]
async fn test_timeout_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let store: DynSessionStore = Arc::new(MemorySessionStore::new());
    let config = UpstreamConfig::new(server.uri()).with_request_timeout_ms(100);
    let client = UpstreamClient::new(config, store).unwrap();

    assert!(client.list(&credentials()).await.unwrap_err().is_upstream_unavailable());
}

#[tokio::test]
async fn test_mutations_send_title_and_translate_response() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("POST"))
        .and(path("/v1/documents"))
        .and(body_json(json!({ "title": "New" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "n1", "title": "New" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/documents/n1"))
        .and(body_json(json!({ "title": "Renamed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "n1", "title": "Renamed" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/documents/n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "n1", "title": "Renamed" })))
        .mount(&server)
        .await;

    let (client, _store) = setup(&server);
    let creds = credentials();

    assert_eq!(
        client.create(&creds, "New").await.unwrap(),
        ImportedDocument::new("n1", "New")
    );
    assert_eq!(
        client.update(&creds, "n1", "Renamed").await.unwrap(),
        ImportedDocument::new("n1", "Renamed")
    );
    assert_eq!(
        client.delete(&creds, "n1").await.unwrap(),
        ImportedDocument::new("n1", "Renamed")
    );
}

#[tokio::test]
async fn test_concurrent_logins_converge_to_one_session() {
    let server = MockServer::start().await;
    mount_login(&server, "t1").await;
    Mock::given(method("GET"))
        .and(path("/v1/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (client, store) = setup(&server);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.list(&credentials()).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert!(wait_for_session(&store, client.service_id()).await.is_some());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.len(), 1);
}
