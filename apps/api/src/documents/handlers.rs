use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::documents::{delete_document, ingest_document, list_documents};
use crate::errors::AppError;
use crate::interview::handlers::UserIdQuery;
use crate::models::document::{DocumentKind, DocumentMeta};
use crate::state::AppState;

/// Uploads larger than this are rejected before any processing.
const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Serialize)]
pub struct UploadResponse {
    pub document: DocumentMeta,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentMeta>,
}

/// POST /api/documents/upload (multipart: `user_id`, `kind`, `file`)
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut kind: Option<DocumentKind> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "user_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                user_id = Some(
                    raw.parse()
                        .map_err(|_| AppError::Validation("Invalid user_id".to_string()))?,
                );
            }
            "kind" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                kind = Some(DocumentKind::parse(&raw).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Invalid kind '{raw}' (expected resume or job_description)"
                    ))
                })?);
            }
            "file" => {
                if field.content_type() != Some("application/pdf") {
                    return Err(AppError::Validation(
                        "Only PDF files are allowed".to_string(),
                    ));
                }
                let name = field.file_name().unwrap_or("document.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                file = Some((name, bytes));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("Missing user_id".to_string()))?;
    let kind = kind.ok_or_else(|| AppError::Validation("Missing kind".to_string()))?;
    let (file_name, file_bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if file_bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File exceeds the 2MB upload limit".to_string(),
        ));
    }

    let document = ingest_document(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        &state.embedder,
        user_id,
        kind,
        file_name,
        file_bytes,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { document })))
}

/// GET /api/documents
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = list_documents(&state.db, params.user_id).await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// DELETE /api/documents/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    delete_document(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        params.user_id,
        document_id,
    )
    .await?;
    Ok(Json(serde_json::json!({ "message": "Document deleted" })))
}
