use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::embeddings::EmbeddingClient;
use crate::evaluation::questions::QuestionPicker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub embedder: EmbeddingClient,
    /// Pluggable next-question selection. Production: uniform random draw;
    /// tests swap in a deterministic rotation.
    pub question_picker: Arc<dyn QuestionPicker>,
    pub config: Config,
}
