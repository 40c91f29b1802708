use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, put},
};
use docbridge_core::{DynMirrorStore, DynSessionStore, SyncResult};
use docbridge_db_postgres::PostgresStorage;
use docbridge_upstream::UpstreamClient;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend};
use crate::sync::SyncReconciler;
use crate::{handlers, middleware as app_middleware};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<SyncReconciler>,
}

impl AppState {
    /// Wires the upstream client and reconciler over the given stores.
    pub fn new(
        cfg: &AppConfig,
        sessions: DynSessionStore,
        mirror: DynMirrorStore,
    ) -> SyncResult<Self> {
        let client = UpstreamClient::new(cfg.upstream.clone(), sessions)?;
        Ok(Self {
            reconciler: Arc::new(SyncReconciler::new(client, mirror)),
        })
    }
}

pub struct DocbridgeServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        // Import into the local mirror
        .route("/v1/documents/sync", put(handlers::import_all))
        .route("/v1/documents/sync/{key}", put(handlers::import_one))
        // Forwarded mutations
        .route("/v1/documents/remote", put(handlers::request_create))
        .route(
            "/v1/documents/remote/{key}",
            put(handlers::request_update).delete(handlers::request_remove),
        )
        .with_state(state)
        // Middleware stack, outermost first: request id -> trace -> compression/cors -> body limit
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    stores: Option<(DynSessionStore, DynMirrorStore)>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            stores: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses the given stores instead of the configured backend.
    pub fn with_stores(mut self, sessions: DynSessionStore, mirror: DynMirrorStore) -> Self {
        self.stores = Some((sessions, mirror));
        self
    }

    pub async fn build(self) -> anyhow::Result<DocbridgeServer> {
        let (sessions, mirror) = match self.stores {
            Some(stores) => stores,
            None => open_stores(&self.config).await?,
        };

        let state = AppState::new(&self.config, sessions, mirror)
            .context("failed to create upstream client")?;
        let app = build_app(state, &self.config);

        Ok(DocbridgeServer {
            addr: self.addr,
            app,
        })
    }
}

async fn open_stores(cfg: &AppConfig) -> anyhow::Result<(DynSessionStore, DynMirrorStore)> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok((
                docbridge_db_memory::create_session_store(),
                docbridge_db_memory::create_mirror_store(),
            ))
        }
        StorageBackend::Postgres => {
            let pg = cfg
                .storage
                .postgres
                .as_ref()
                .context("storage.postgres is required for the postgres backend")?;
            let storage = PostgresStorage::connect(&pg.connection_url(), pg.pool_settings())
                .await
                .context("failed to connect to PostgreSQL")?;
            if pg.run_migrations {
                storage
                    .migrate()
                    .await
                    .context("failed to run PostgreSQL migrations")?;
            }
            tracing::info!("Using PostgreSQL storage");
            Ok((storage.sessions(), storage.mirror()))
        }
    }
}

impl DocbridgeServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
