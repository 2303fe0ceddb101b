//! `/v1/knowledge/*`: multipart ingest, status polling,
//! listing, and soft-delete. The ingestion pipeline itself always runs
//! as a detached background task — this router's only job is to create
//! the `processing` row, write the upload to disk, spawn the pipeline,
//! and return 202 immediately regardless of how ingestion turns out.

use std::path::PathBuf;

use axum::extract::{Extension, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use support_agent_core::domain::{FileType, KnowledgeDocument, KnowledgeDocumentStatus, Tenant};
use support_agent_core::Error;

use support_agent_ingestion::bm25_cache_key;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/knowledge/ingest", post(ingest))
        .route("/v1/knowledge/:id/status", get(status))
        .route("/v1/knowledge/list", get(list))
        .route("/v1/knowledge/:id", delete(delete_document))
}

fn file_type_label(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Pdf => "pdf",
        FileType::Docx => "docx",
        FileType::Html => "html",
        FileType::Txt => "txt",
        FileType::Csv => "csv",
    }
}

fn parse_file_type(filename: &str) -> Result<FileType, ApiError> {
    let extension = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
    match extension.as_str() {
        "pdf" => Ok(FileType::Pdf),
        "docx" => Ok(FileType::Docx),
        "html" | "htm" => Ok(FileType::Html),
        "txt" => Ok(FileType::Txt),
        "csv" => Ok(FileType::Csv),
        other => Err(ApiError(Error::InvalidFileType(other.to_string()))),
    }
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    document_id: Uuid,
    status: &'static str,
    message: &'static str,
}

async fn ingest(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut filename: Option<String> = None;
    let mut bytes: Option<bytes::Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| ApiError(Error::Other(anyhow::anyhow!(err))))? {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                bytes = Some(field.bytes().await.map_err(|err| ApiError(Error::Other(anyhow::anyhow!(err))))?);
            }
            Some("documentType") => {
                // Explicit document type overrides filename-extension
                // sniffing when the client supplies it; sniffing alone
                // is used otherwise.
                let declared = field.text().await.map_err(|err| ApiError(Error::Other(anyhow::anyhow!(err))))?;
                if filename.is_none() {
                    filename = Some(format!("upload.{declared}"));
                }
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| ApiError(Error::InvalidFileType("no file field in upload".to_string())))?;
    let bytes = bytes.ok_or_else(|| ApiError(Error::InvalidFileType("no file field in upload".to_string())))?;
    let file_type = parse_file_type(&filename)?;

    let existing = state.relational_store.list_documents(tenant.id).await?;
    let version = existing
        .iter()
        .filter(|d| d.filename == filename)
        .map(|d| d.version)
        .max()
        .unwrap_or(0)
        + 1;

    let document = KnowledgeDocument::new(tenant.id, filename.clone(), file_type, version, Utc::now());
    let document = state.relational_store.create_document(document).await?;

    let filepath: PathBuf = [state.upload_dir.as_ref(), &document.id.to_string()].iter().collect();
    tokio::fs::create_dir_all(&state.upload_dir.as_ref()).await.map_err(|err| ApiError(Error::Other(anyhow::anyhow!(err))))?;
    tokio::fs::write(&filepath, &bytes).await.map_err(|err| ApiError(Error::Other(anyhow::anyhow!(err))))?;

    spawn_ingestion(state, document.id, tenant.id, filepath, filename, file_type, version);

    let body = Json(IngestResponse { document_id: document.id, status: "processing", message: "ingestion started" });
    Ok((StatusCode::ACCEPTED, body).into_response())
}

/// Detached background task, not tied to the HTTP request's lifetime;
/// failures are captured inside `IngestionPipeline::ingest` itself
/// (status=failed), never here.
fn spawn_ingestion(
    state: AppState,
    document_id: Uuid,
    tenant_id: Uuid,
    filepath: PathBuf,
    filename: String,
    file_type: FileType,
    version: i32,
) {
    tokio::spawn(async move {
        let started = std::time::Instant::now();
        let filepath_str = filepath.to_string_lossy().to_string();
        let result = state
            .ingestion
            .ingest(document_id, tenant_id, &filepath_str, &filename, file_type, version)
            .await;
        support_agent_governance::record_ingestion(file_type_label(file_type), result.is_ok(), started.elapsed());
        let _ = tokio::fs::remove_file(&filepath).await;
    });
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    document_id: Uuid,
    status: KnowledgeDocumentStatus,
    chunk_count: Option<i32>,
    error_message: Option<String>,
}

async fn status(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let document = load_owned_document(&state, tenant.id, document_id).await?;
    Ok(Json(StatusResponse {
        document_id: document.id,
        status: document.status,
        chunk_count: document.chunk_count,
        error_message: document.error_message,
    }))
}

#[derive(Debug, Serialize)]
struct ListResponse {
    documents: Vec<KnowledgeDocument>,
}

async fn list(State(state): State<AppState>, Extension(tenant): Extension<Tenant>) -> Result<Json<ListResponse>, ApiError> {
    let documents = state.relational_store.list_documents(tenant.id).await?;
    Ok(Json(ListResponse { documents }))
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
}

/// Soft-delete + cache invalidate + async vector purge. Soft-deleting
/// twice is a no-op success, not an error.
async fn delete_document(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let mut document = load_owned_document(&state, tenant.id, document_id).await?;
    document.soft_delete();
    state.relational_store.update_document(document).await?;

    state.kv_store.delete(&bm25_cache_key(tenant.id)).await?;

    let state_for_purge = state.clone();
    tokio::spawn(async move {
        if let Err(err) = state_for_purge.vector_index.delete_document(tenant.id, document_id).await {
            tracing::error!(document_id = %document_id, error = %err, "async vector purge after delete failed");
        }
    });

    Ok(Json(DeleteResponse { deleted: true }))
}

async fn load_owned_document(state: &AppState, tenant_id: Uuid, document_id: Uuid) -> Result<KnowledgeDocument, ApiError> {
    let document = state
        .relational_store
        .get_document(document_id)
        .await?
        .ok_or(ApiError(Error::DocumentNotFound(document_id)))?;
    if document.tenant_id != tenant_id {
        return Err(ApiError(Error::DocumentNotFound(document_id)));
    }
    Ok(document)
}
