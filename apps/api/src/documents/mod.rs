//! Document ingestion — PDF text extraction, chunking, embedding, storage.
//!
//! Ingestion is all-or-nothing per (user, kind): a provider failure during
//! embedding aborts before anything is uploaded or persisted, so there is
//! never a half-embedded document row or an orphaned stored file. The
//! (user, kind) slot is replaced through an atomic upsert.

pub mod handlers;

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunking::{chunk_text, DEFAULT_CHUNK_SIZE};
use crate::embeddings::EmbeddingClient;
use crate::errors::AppError;
use crate::models::document::{Chunk, DocumentKind, DocumentMeta};

/// Runs the full ingestion pipeline for one uploaded PDF and installs the
/// result as the user's current document of `kind`.
pub async fn ingest_document(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    embedder: &EmbeddingClient,
    user_id: Uuid,
    kind: DocumentKind,
    file_name: String,
    file_bytes: Bytes,
) -> Result<DocumentMeta, AppError> {
    info!("Ingesting {kind} '{file_name}' for user {user_id}");

    let text = extract_pdf_text(file_bytes.clone()).await?;
    info!("Extracted {} chars of text", text.len());

    let chunks = chunk_text(&text, DEFAULT_CHUNK_SIZE);
    if chunks.is_empty() {
        return Err(AppError::Validation(
            "No extractable text in PDF".to_string(),
        ));
    }

    // Embedding happens before any storage write: if the provider fails,
    // nothing needs rolling back.
    let embeddings = embedder.embed_batch(&chunks).await?;
    let chunk_data: Vec<Chunk> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (text, embedding))| Chunk {
            index: index as u32,
            text,
            embedding,
        })
        .collect();

    let old_s3_key: Option<String> =
        sqlx::query_scalar("SELECT s3_key FROM documents WHERE user_id = $1 AND kind = $2")
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_optional(pool)
            .await?;

    let s3_key = format!("documents/{user_id}/{kind}/{}.pdf", Uuid::new_v4());
    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .content_type("application/pdf")
        .body(ByteStream::from(file_bytes.to_vec()))
        .send()
        .await
        .map_err(|e| AppError::S3(e.to_string()))?;

    let chunks_json =
        serde_json::to_value(&chunk_data).map_err(|e| AppError::Internal(e.into()))?;
    let total_chunks = chunk_data.len() as i32;

    // Atomic find-and-replace: the UNIQUE (user_id, kind) constraint plus the
    // upsert leaves exactly one document per slot even under concurrent uploads.
    let meta = sqlx::query_as::<_, DocumentMeta>(
        r#"
        INSERT INTO documents (id, user_id, kind, file_name, s3_key, chunks, total_chunks)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, kind) DO UPDATE
            SET file_name = EXCLUDED.file_name,
                s3_key = EXCLUDED.s3_key,
                chunks = EXCLUDED.chunks,
                total_chunks = EXCLUDED.total_chunks,
                created_at = NOW()
        RETURNING id, kind, file_name, total_chunks, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(kind.as_str())
    .bind(&file_name)
    .bind(&s3_key)
    .bind(&chunks_json)
    .bind(total_chunks)
    .fetch_one(pool)
    .await?;

    // The superseded file is gone from the row already; removing the object
    // is best-effort cleanup.
    if let Some(old_key) = old_s3_key {
        if old_key != s3_key {
            delete_object_best_effort(s3, s3_bucket, &old_key).await;
        }
    }

    info!("Stored {kind} with {total_chunks} embedded chunks for user {user_id}");
    Ok(meta)
}

/// Per-user document metadata, newest first.
pub async fn list_documents(pool: &PgPool, user_id: Uuid) -> Result<Vec<DocumentMeta>, AppError> {
    Ok(sqlx::query_as::<_, DocumentMeta>(
        r#"
        SELECT id, kind, file_name, total_chunks, created_at
        FROM documents
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Deletes one of the user's documents and its stored file.
pub async fn delete_document(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    user_id: Uuid,
    document_id: Uuid,
) -> Result<(), AppError> {
    let s3_key: Option<String> =
        sqlx::query_scalar("DELETE FROM documents WHERE id = $1 AND user_id = $2 RETURNING s3_key")
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match s3_key {
        Some(key) => {
            delete_object_best_effort(s3, s3_bucket, &key).await;
            Ok(())
        }
        None => Err(AppError::NotFound(format!("Document {document_id}"))),
    }
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Validation(format!("Failed to extract text from PDF: {e}")))?;
    Ok(text)
}

async fn delete_object_best_effort(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    if let Err(e) = s3.delete_object().bucket(bucket).key(key).send().await {
        warn!("Failed to delete superseded S3 object {key}: {e}");
    }
}
