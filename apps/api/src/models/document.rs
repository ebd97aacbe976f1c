use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Which of the two per-user document slots a file occupies. At most one
/// document per (user, kind) exists at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    JobDescription,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::JobDescription => "job_description",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resume" => Some(DocumentKind::Resume),
            "job_description" => Some(DocumentKind::JobDescription),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded slice of a document's text with its embedding vector.
/// `index` is 0-based and monotonic within the document; chunk order is
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: u32,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A stored document. `chunks` is the JSONB-encoded ordered `Vec<Chunk>`.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub file_name: String,
    pub s3_key: String,
    pub chunks: Value,
    pub total_chunks: i32,
    pub created_at: DateTime<Utc>,
}

impl DocumentRow {
    /// Decodes the JSONB chunk column. Stored chunks were written by the
    /// ingestion pipeline, so a decode failure indicates corruption.
    pub fn decode_chunks(&self) -> Result<Vec<Chunk>, serde_json::Error> {
        serde_json::from_value(self.chunks.clone())
    }
}

/// Metadata view returned by the list endpoint (chunks omitted).
#[derive(Debug, Serialize, FromRow)]
pub struct DocumentMeta {
    pub id: Uuid,
    pub kind: String,
    pub file_name: String,
    pub total_chunks: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [DocumentKind::Resume, DocumentKind::JobDescription] {
            assert_eq!(DocumentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DocumentKind::parse("cover_letter"), None);
    }

    #[test]
    fn test_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&DocumentKind::JobDescription).unwrap();
        assert_eq!(json, r#""job_description""#);
    }
}
