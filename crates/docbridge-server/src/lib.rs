//! docbridge server: mirrors upstream documents locally and forwards
//! mutations to the upstream service on behalf of basic-auth callers.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod sync;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{AppState, DocbridgeServer, ServerBuilder, build_app};
pub use sync::SyncReconciler;
