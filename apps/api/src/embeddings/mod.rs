//! Embedding client — the single point of entry for all embedding calls.
//!
//! ARCHITECTURAL RULE: no other module may call the inference API directly.
//! All embedding traffic goes through `EmbeddingClient` so that truncation,
//! ordering, and pacing are enforced in exactly one place.
//!
//! Model: BAAI/bge-small-en-v1.5 (feature-extraction; hardcoded to keep the
//! vector dimension constant across a deployment).

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::chunking::truncate_chars;

const HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
/// The embedding model used for all vectors in a deployment. Intentionally
/// hardcoded: mixing models would make stored vectors incomparable.
pub const MODEL: &str = "BAAI/bge-small-en-v1.5";
/// Longest prefix of the input sent to the provider, in characters.
const MAX_INPUT_CHARS: usize = 512;
/// Per-request timeout. A timed-out call aborts the enclosing batch.
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Pause between successive batch requests, to stay inside the provider's
/// rate limit without a token-bucket component.
const DEFAULT_PACE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Client for the Hugging Face feature-extraction inference API.
///
/// There is deliberately no retry logic: a provider failure surfaces
/// immediately and aborts the enclosing ingestion or turn, so a Document is
/// either fully embedded or not persisted at all.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    endpoint: String,
    pace: std::time::Duration,
}

impl EmbeddingClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint: format!("{HF_INFERENCE_URL}/{MODEL}"),
            pace: std::time::Duration::from_millis(DEFAULT_PACE_MS),
        }
    }

    /// Overrides the inter-request pause of the batch loop. Sequencing is
    /// always preserved; only the pause length is configurable.
    #[allow(dead_code)]
    pub fn with_pace(mut self, pace: std::time::Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Points the client at a different inference endpoint. Tests use this to
    /// target a local stub server.
    #[allow(dead_code)]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Embeds a single text, truncated to the first 512 characters.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let truncated = truncate_chars(text, MAX_INPUT_CHARS);

        let request_body = EmbeddingRequest {
            inputs: truncated,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let vector = parse_embedding(&body)?;
        debug!(
            "Embedded {} bytes of input into dimension {}",
            truncated.len(),
            vector.len()
        );
        Ok(vector)
    }

    /// Embeds a batch of texts strictly sequentially, pausing between
    /// successive requests when the batch has more than one item. Output
    /// position i corresponds to input position i. The first failure aborts
    /// the whole batch; there is no partial success.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        info!("Embedding batch of {} chunks", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            if i > 0 && texts.len() > 1 {
                tokio::time::sleep(self.pace).await;
            }
            vectors.push(self.embed_one(text).await?);
        }

        info!("Embedded {} chunks", vectors.len());
        Ok(vectors)
    }
}

/// Extracts the embedding vector from a provider response. The API returns
/// either a flat numeric array or a batch-shaped `[[...]]` wrapper around a
/// single result; for the wrapper, element 0 is the vector.
fn parse_embedding(body: &Value) -> Result<Vec<f32>, EmbeddingError> {
    let outer = body
        .as_array()
        .ok_or_else(|| EmbeddingError::MalformedResponse(format!("expected array, got {body}")))?;

    let flat = match outer.first() {
        Some(Value::Array(inner)) => inner.as_slice(),
        _ => outer.as_slice(),
    };

    flat.iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                EmbeddingError::MalformedResponse(format!("non-numeric element: {v}"))
            })
        })
        .collect()
}
