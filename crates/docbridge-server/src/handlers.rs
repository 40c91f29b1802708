use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use docbridge_core::{EditRemoteDocument, ImportSummary, MirroredDocument, RemoteDocument};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::extractors::BasicCredentials;
use crate::server::AppState;

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "docbridge",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// PUT /v1/documents/sync
pub async fn import_all(
    State(state): State<AppState>,
    BasicCredentials(creds): BasicCredentials,
) -> Result<Json<ImportSummary>, ApiError> {
    tracing::info!("Requested a full sync");
    let summary = state.reconciler.import_all(&creds).await?;
    Ok(Json(summary))
}

/// PUT /v1/documents/sync/{key}
///
/// Responds with JSON `null` when the document was already mirrored.
pub async fn import_one(
    State(state): State<AppState>,
    Path(key): Path<String>,
    BasicCredentials(creds): BasicCredentials,
) -> Result<Json<Option<MirroredDocument>>, ApiError> {
    tracing::info!(ref_key = %key, "Requested sync of remote document");
    let mirrored = state.reconciler.import_one(&key, &creds).await?;
    Ok(Json(mirrored))
}

/// PUT /v1/documents/remote
pub async fn request_create(
    State(state): State<AppState>,
    BasicCredentials(creds): BasicCredentials,
    payload: Result<Json<EditRemoteDocument>, JsonRejection>,
) -> Result<Json<RemoteDocument>, ApiError> {
    let edit = edit_body(payload)?;
    tracing::info!(title = %edit.title, "Requested creation of document");
    let created = state.reconciler.request_create(&edit, &creds).await?;
    Ok(Json(created))
}

/// PUT /v1/documents/remote/{key}
pub async fn request_update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    BasicCredentials(creds): BasicCredentials,
    payload: Result<Json<EditRemoteDocument>, JsonRejection>,
) -> Result<Json<RemoteDocument>, ApiError> {
    let edit = edit_body(payload)?;
    tracing::info!(ref_key = %key, "Requested update of document");
    let updated = state.reconciler.request_update(&key, &edit, &creds).await?;
    Ok(Json(updated))
}

/// DELETE /v1/documents/remote/{key}
pub async fn request_remove(
    State(state): State<AppState>,
    Path(key): Path<String>,
    BasicCredentials(creds): BasicCredentials,
) -> Result<Json<RemoteDocument>, ApiError> {
    tracing::info!(ref_key = %key, "Requested deletion of document");
    let removed = state.reconciler.request_remove(&key, &creds).await?;
    Ok(Json(removed))
}

fn edit_body(
    payload: Result<Json<EditRemoteDocument>, JsonRejection>,
) -> Result<EditRemoteDocument, ApiError> {
    let Json(edit) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    edit.validate().map_err(ApiError::BadRequest)?;
    Ok(edit)
}
