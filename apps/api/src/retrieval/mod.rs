//! Brute-force cosine-similarity retrieval over a user's document chunks.
//!
//! O(N·D) per query with N the total chunk count across both documents and D
//! the vector dimension. Fine for corpora of a few hundred chunks; this is
//! not, and does not try to be, a scalable vector index.

use tracing::warn;

use crate::models::document::{Chunk, DocumentKind, DocumentRow};

/// Number of evidence chunks attached to each interview turn.
pub const TOP_K: usize = 3;

/// The ordered, tagged chunk collection of one document.
pub struct VectorIndex {
    pub source: DocumentKind,
    pub chunks: Vec<Chunk>,
}

impl VectorIndex {
    pub fn new(source: DocumentKind, chunks: Vec<Chunk>) -> Self {
        Self { source, chunks }
    }

    /// Builds an index from a stored document row.
    pub fn from_row(source: DocumentKind, row: &DocumentRow) -> Result<Self, serde_json::Error> {
        Ok(Self::new(source, row.decode_chunks()?))
    }
}

/// One ranked retrieval hit.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub source: DocumentKind,
    pub text: String,
    pub similarity: f32,
}

/// Cosine similarity in [-1, 1]. Mismatched lengths and zero-magnitude
/// vectors degrade to 0 rather than erroring; a mismatch is logged as an
/// anomaly since it means two different embedding models were mixed.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(
            "Dimension mismatch in similarity computation: {} vs {}",
            a.len(),
            b.len()
        );
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let mag_a = mag_a.sqrt();
    let mag_b = mag_b.sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Ranks every chunk in the pooled indexes against `query` and returns the
/// `k` most similar, descending. The sort is stable, so exact ties keep the
/// pool's insertion order.
pub fn top_k(query: &[f32], indexes: &[VectorIndex], k: usize) -> Vec<RetrievedChunk> {
    let mut ranked: Vec<RetrievedChunk> = indexes
        .iter()
        .flat_map(|index| {
            index.chunks.iter().map(|chunk| RetrievedChunk {
                source: index.source,
                text: chunk.text.clone(),
                similarity: cosine_similarity(query, &chunk.embedding),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: u32, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_similarity_of_vector_with_itself_is_one() {
        let v = vec![0.3, -0.5, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_of_opposite_vectors_is_minus_one() {
        let v = vec![1.0, 2.0, 3.0];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &neg) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_degrades_to_zero() {
        let v = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&v, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &v), 0.0);
    }

    #[test]
    fn test_mismatched_lengths_degrade_to_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    /// Unit query along the x axis makes each chunk's cosine equal its first
    /// component, letting the test pin exact similarities.
    fn unit_chunks(sims: &[f32]) -> Vec<Chunk> {
        sims.iter()
            .enumerate()
            .map(|(i, s)| {
                chunk(
                    i as u32,
                    &format!("chunk-{i}"),
                    vec![*s, (1.0 - s * s).sqrt()],
                )
            })
            .collect()
    }

    #[test]
    fn test_top_k_orders_descending_with_stable_ties() {
        let index = VectorIndex::new(
            DocumentKind::Resume,
            unit_chunks(&[0.9, 0.1, 0.5, 0.9, 0.3]),
        );
        let query = vec![1.0, 0.0];

        let hits = top_k(&query, &[index], 3);
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        // The 0.9 tie is broken by insertion order: chunk-0 before chunk-3.
        assert_eq!(texts, vec!["chunk-0", "chunk-3", "chunk-2"]);
    }

    #[test]
    fn test_top_k_pools_across_indexes_and_tags_source() {
        let resume = VectorIndex::new(DocumentKind::Resume, unit_chunks(&[0.2]));
        let jd = VectorIndex::new(DocumentKind::JobDescription, unit_chunks(&[0.8]));
        let query = vec![1.0, 0.0];

        let hits = top_k(&query, &[resume, jd], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, DocumentKind::JobDescription);
        assert_eq!(hits[1].source, DocumentKind::Resume);
    }

    #[test]
    fn test_top_k_with_small_pool_returns_everything() {
        let index = VectorIndex::new(DocumentKind::Resume, unit_chunks(&[0.5]));
        let hits = top_k(&[1.0, 0.0], &[index], 3);
        assert_eq!(hits.len(), 1);
    }
}
