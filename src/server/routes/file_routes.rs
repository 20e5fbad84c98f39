//! Document workspace endpoints: listing, multipart upload, and deletion.

use crate::error::ApiError;
use crate::models::{DocumentEntry, StatusMessage, UploadResult};
use crate::server::ServerAppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct WorkspacePathQuery {
    /// Workspace directory; the configured default when omitted.
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<DocumentEntry>,
}

/// GET /files/
pub async fn list_files(
    State(state): State<ServerAppState>,
    Query(query): Query<WorkspacePathQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.documents.list(query.path.as_deref()).await?;
    Ok(Json(FileListResponse { files }))
}

/// POST /upload/ — multipart upload; the `file` field carries the document.
pub async fn upload_file(
    State(state): State<ServerAppState>,
    Query(query): Query<WorkspacePathQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(String::from)
            .ok_or_else(|| ApiError::InvalidRequest("file field has no filename".to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {}", e)))?;

        let entry = state
            .documents
            .put(query.path.as_deref(), &filename, &bytes)
            .await?;

        log::info!("Uploaded {} ({} bytes) to {}", entry.filename, entry.size, entry.path);

        return Ok(Json(UploadResult {
            filename: entry.filename,
            path: entry.path,
            size: entry.size,
        }));
    }

    Err(ApiError::InvalidRequest(
        "multipart body has no 'file' field".to_string(),
    ))
}

/// DELETE /files/:name
pub async fn delete_file(
    State(state): State<ServerAppState>,
    Path(name): Path<String>,
    Query(query): Query<WorkspacePathQuery>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.documents.delete(query.path.as_deref(), &name).await?;
    Ok(Json(StatusMessage::new(format!("file '{}' deleted", name))))
}
