//! Text chunking — splits extracted document text into embedding-sized pieces.
//!
//! Windows are consecutive and non-overlapping. Overlap would improve recall
//! at chunk boundaries but costs extra embedding calls against a rate-limited
//! provider; precision/recall trade-off accepted.

/// Default window size in whitespace-separated tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Splits `text` on whitespace and groups tokens into consecutive windows of
/// up to `size` tokens, each joined with a single space. Windows that are
/// empty after trimming are dropped. Deterministic and order-preserving:
/// concatenating the output reconstructs the token sequence of the input
/// modulo whitespace normalization.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::with_capacity(words.len().div_ceil(size.max(1)));

    for window in words.chunks(size.max(1)) {
        let chunk = window.join(" ");
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
    }

    chunks
}

/// Longest prefix of `text` holding at most `max_chars` characters, cut on a
/// char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("   \n\t  ", 500).is_empty());
    }

    #[test]
    fn test_short_input_yields_single_chunk() {
        let chunks = chunk_text("hello world", 500);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_chunk_count_is_ceil_of_token_count() {
        let text = words(1200);
        let chunks = chunk_text(&text, 500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split_whitespace().count(), 500);
        assert_eq!(chunks[1].split_whitespace().count(), 500);
        assert_eq!(chunks[2].split_whitespace().count(), 200);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_chunk() {
        let chunks = chunk_text(&words(1000), 500);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_concatenation_reconstructs_token_sequence() {
        let text = "  one \n two\tthree   four five six seven ";
        let chunks = chunk_text(text, 3);
        let rejoined = chunks.join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        let reconstructed: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original, reconstructed);
    }

    #[test]
    fn test_whitespace_is_normalized_within_chunks() {
        let chunks = chunk_text("a  b\nc", 500);
        assert_eq!(chunks, vec!["a b c".to_string()]);
    }

    #[test]
    fn test_truncate_shorter_than_limit_is_untouched() {
        assert_eq!(truncate_chars("hello", 512), "hello");
    }

    #[test]
    fn test_truncate_cuts_to_char_count() {
        let long = "a".repeat(600);
        assert_eq!(truncate_chars(&long, 512).len(), 512);
    }

    #[test]
    fn test_truncate_respects_multibyte_boundaries() {
        let text = "é".repeat(600);
        let cut = truncate_chars(&text, 512);
        assert_eq!(cut.chars().count(), 512);
    }
}
