//! Interview session orchestration — start/query/history/clear.
//!
//! A user has at most one session. `start` requires both document kinds and
//! replaces any prior session; `query` appends a user/assistant turn pair
//! under a row lock so concurrent queries cannot interleave appends.

pub mod handlers;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunking::truncate_chars;
use crate::errors::AppError;
use crate::evaluation::questions::QuestionPicker;
use crate::evaluation::{evaluate, Evaluation};
use crate::models::chat::{ChatSessionRow, Citation, Turn};
use crate::models::document::{DocumentKind, DocumentRow};
use crate::retrieval::{top_k, RetrievedChunk, VectorIndex, TOP_K};

/// JD text fed to keyword extraction is capped at this many characters.
const JD_EXCERPT_CHARS: usize = 2000;
/// At most this many extracted technologies are named in the opening question.
const MAX_OPENING_TECHNOLOGIES: usize = 3;

/// Technology vocabulary scanned for in the job description, with display
/// names. Matching is case-insensitive substring matching, in this order.
const TECH_KEYWORDS: &[(&str, &str)] = &[
    ("react", "React"),
    ("node", "Node.js"),
    ("javascript", "JavaScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("sql", "SQL"),
    ("mongodb", "MongoDB"),
    ("aws", "AWS"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
];

/// Everything a handler needs to return for one evaluated turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub score: f64,
    pub feedback: String,
    pub citations: Vec<Citation>,
    pub next_question: String,
    pub content: String,
}

/// Creates (or replaces) the user's session with a single assistant turn
/// holding three opening questions derived from the job description.
pub async fn start_session(pool: &PgPool, user_id: Uuid) -> Result<Vec<Turn>, AppError> {
    let jd = fetch_document(pool, user_id, DocumentKind::JobDescription)
        .await?
        .ok_or_else(|| {
            AppError::MissingDocument("Please upload a Job Description first".to_string())
        })?;
    let resume = fetch_document(pool, user_id, DocumentKind::Resume)
        .await?
        .ok_or_else(|| AppError::MissingDocument("Please upload a Resume first".to_string()))?;

    let jd_text: String = jd
        .decode_chunks()
        .map_err(|e| AppError::Internal(e.into()))?
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let jd_excerpt = truncate_chars(&jd_text, JD_EXCERPT_CHARS);

    let technologies = extract_technologies(jd_excerpt);
    debug!("Extracted JD technologies: {technologies:?}");

    let opening = build_opening_message(&technologies);
    let turns = vec![Turn::assistant(opening)];
    let turns_json = serde_json::to_value(&turns).map_err(|e| AppError::Internal(e.into()))?;

    // One session per user: replace any existing one atomically.
    sqlx::query(
        r#"
        INSERT INTO chat_sessions (id, user_id, resume_id, jd_id, turns)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
            SET resume_id = EXCLUDED.resume_id,
                jd_id = EXCLUDED.jd_id,
                turns = EXCLUDED.turns,
                updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(resume.id)
    .bind(jd.id)
    .bind(&turns_json)
    .execute(pool)
    .await?;

    info!("Started interview session for user {user_id}");
    Ok(turns)
}

/// Evaluates one answer: embeds it, retrieves top-3 evidence across both
/// documents, scores it, and appends the user/assistant turn pair to history.
pub async fn handle_query(
    pool: &PgPool,
    embedder: &crate::embeddings::EmbeddingClient,
    picker: &dyn QuestionPicker,
    snippet_chars: usize,
    user_id: Uuid,
    message: &str,
) -> Result<(TurnOutcome, Vec<Turn>), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::EmptyInput);
    }

    let session = fetch_session(pool, user_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;

    let resume = fetch_document_by_id(pool, session.resume_id).await?;
    let jd = fetch_document_by_id(pool, session.jd_id).await?;
    let (resume, jd) = match (resume, jd) {
        (Some(r), Some(j)) => (r, j),
        _ => {
            return Err(AppError::MissingDocument(
                "Documents not found. Please upload documents again".to_string(),
            ))
        }
    };

    // External call happens before the row lock is taken: holding a lock
    // across a 30s provider timeout would serialize unrelated work.
    let query_vector = embedder.embed_one(message).await?;

    let indexes = [
        VectorIndex::from_row(DocumentKind::Resume, &resume)
            .map_err(|e| AppError::Internal(e.into()))?,
        VectorIndex::from_row(DocumentKind::JobDescription, &jd)
            .map_err(|e| AppError::Internal(e.into()))?,
    ];
    let evidence = top_k(&query_vector, &indexes, TOP_K);
    debug!(
        "Top-{TOP_K} similarities: {:?}",
        evidence.iter().map(|c| c.similarity).collect::<Vec<_>>()
    );

    let evaluation = evaluate(message, picker);
    let citations = build_citations(&evidence, snippet_chars);
    let content = render_assistant_turn(&evaluation, &citations);

    let mut assistant_turn = Turn::assistant(content.clone());
    assistant_turn.score = Some(evaluation.score);
    assistant_turn.citations = Some(citations.clone());

    let turns = append_turns(pool, user_id, Turn::user(message.to_string()), assistant_turn).await?;

    Ok((
        TurnOutcome {
            score: evaluation.score,
            feedback: evaluation.feedback,
            citations,
            next_question: evaluation.next_question,
            content,
        },
        turns,
    ))
}

/// Returns the current turn list; an absent session is an empty list, not an
/// error.
pub async fn session_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<Turn>, AppError> {
    match fetch_session(pool, user_id).await? {
        Some(session) => session
            .decode_turns()
            .map_err(|e| AppError::Internal(e.into())),
        None => Ok(Vec::new()),
    }
}

/// Deletes the user's session. Idempotent.
pub async fn clear_session(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM chat_sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    info!("Cleared interview session for user {user_id}");
    Ok(())
}

/// Appends the turn pair inside a transaction holding the session row lock,
/// so concurrent queries for the same user serialize instead of losing turns.
async fn append_turns(
    pool: &PgPool,
    user_id: Uuid,
    user_turn: Turn,
    assistant_turn: Turn,
) -> Result<Vec<Turn>, AppError> {
    let mut tx = pool.begin().await?;

    let session = sqlx::query_as::<_, ChatSessionRow>(
        "SELECT * FROM chat_sessions WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::SessionNotFound)?;

    let mut turns = session
        .decode_turns()
        .map_err(|e| AppError::Internal(e.into()))?;
    turns.push(user_turn);
    turns.push(assistant_turn);

    let turns_json = serde_json::to_value(&turns).map_err(|e| AppError::Internal(e.into()))?;
    sqlx::query("UPDATE chat_sessions SET turns = $1, updated_at = NOW() WHERE user_id = $2")
        .bind(&turns_json)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(turns)
}

async fn fetch_session(pool: &PgPool, user_id: Uuid) -> Result<Option<ChatSessionRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ChatSessionRow>("SELECT * FROM chat_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

async fn fetch_document(
    pool: &PgPool,
    user_id: Uuid,
    kind: DocumentKind,
) -> Result<Option<DocumentRow>, AppError> {
    Ok(sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE user_id = $1 AND kind = $2",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?)
}

async fn fetch_document_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DocumentRow>, AppError> {
    Ok(
        sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Scans the JD excerpt for known technologies, in vocabulary order.
fn extract_technologies(jd_text: &str) -> Vec<&'static str> {
    let lower = jd_text.to_lowercase();
    TECH_KEYWORDS
        .iter()
        .filter(|(needle, _)| lower.contains(needle))
        .map(|(_, display)| *display)
        .collect()
}

/// Builds the single assistant message holding the three opening questions.
fn build_opening_message(technologies: &[&str]) -> String {
    let named = if technologies.is_empty() {
        "the technologies".to_string()
    } else {
        technologies
            .iter()
            .take(MAX_OPENING_TECHNOLOGIES)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    };

    let questions = [
        format!("1. Can you describe your hands-on experience with {named} mentioned in this role?"),
        "2. Tell me about a challenging technical problem you've solved that required collaboration with your team.".to_string(),
        "3. Walk me through a recent project where you had to design and implement a complete feature from scratch.".to_string(),
    ]
    .join("\n\n");

    format!(
        "Hello! I've reviewed the job description. Let's begin your interview preparation. \
         Here are 3 questions based on the role:\n\n{questions}\n\nPlease answer the first question."
    )
}

/// Truncates each evidence snippet to the single configured citation length.
fn build_citations(evidence: &[RetrievedChunk], snippet_chars: usize) -> Vec<Citation> {
    evidence
        .iter()
        .map(|hit| Citation {
            source: hit.source.as_str().to_string(),
            text: truncate_chars(&hit.text, snippet_chars).to_string(),
        })
        .collect()
}

/// Renders the assistant turn body: score, feedback, references, next question.
fn render_assistant_turn(evaluation: &Evaluation, citations: &[Citation]) -> String {
    let mut content = format!(
        "**Score: {}/10**\n\n**Feedback:**\n{}",
        evaluation.score, evaluation.feedback
    );

    if !citations.is_empty() {
        content.push_str("\n\n**References:**\n");
        for citation in citations {
            content.push_str(&format!("- [{}] {}...\n", citation.source, citation.text));
        }
    }

    content.push_str(&format!(
        "\n\n**Next Question:** {}",
        evaluation.next_question
    ));
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_technologies_follows_vocabulary_order() {
        let jd = "We use Docker and AWS; strong React experience required.";
        assert_eq!(extract_technologies(jd), vec!["React", "AWS", "Docker"]);
    }

    #[test]
    fn test_extract_technologies_substring_matches_both_java_and_javascript() {
        let techs = extract_technologies("Senior JavaScript engineer");
        assert_eq!(techs, vec!["JavaScript", "Java"]);
    }

    #[test]
    fn test_extract_technologies_empty_for_unrelated_text() {
        assert!(extract_technologies("We value teamwork and empathy.").is_empty());
    }

    #[test]
    fn test_opening_message_contains_exactly_three_questions() {
        let message = build_opening_message(&["React", "SQL"]);
        assert!(message.contains("1. Can you describe your hands-on experience with React, SQL"));
        assert!(message.contains("2. Tell me about a challenging technical problem"));
        assert!(message.contains("3. Walk me through a recent project"));
        assert_eq!(message.matches("\n\n").count(), 4);
    }

    #[test]
    fn test_opening_message_caps_named_technologies_at_three() {
        let message = build_opening_message(&["React", "SQL", "AWS", "Docker"]);
        assert!(message.contains("React, SQL, AWS mentioned"));
        assert!(!message.contains("Docker"));
    }

    #[test]
    fn test_opening_message_falls_back_when_no_technologies_found() {
        let message = build_opening_message(&[]);
        assert!(message.contains("hands-on experience with the technologies mentioned"));
    }

    #[test]
    fn test_citations_use_one_snippet_length() {
        let evidence = vec![RetrievedChunk {
            source: DocumentKind::Resume,
            text: "x".repeat(500),
            similarity: 0.9,
        }];
        let citations = build_citations(&evidence, 200);
        assert_eq!(citations[0].text.len(), 200);
        assert_eq!(citations[0].source, "resume");
    }

    #[test]
    fn test_rendered_turn_has_all_sections() {
        let evaluation = Evaluation {
            score: 8.5,
            feedback: "Excellent response!".to_string(),
            next_question: "Why Rust?".to_string(),
        };
        let citations = vec![Citation {
            source: "job_description".to_string(),
            text: "snippet".to_string(),
        }];

        let content = render_assistant_turn(&evaluation, &citations);
        assert!(content.starts_with("**Score: 8.5/10**"));
        assert!(content.contains("**Feedback:**\nExcellent response!"));
        assert!(content.contains("**References:**\n- [job_description] snippet..."));
        assert!(content.ends_with("**Next Question:** Why Rust?"));
    }

    #[test]
    fn test_rendered_turn_omits_references_without_citations() {
        let evaluation = Evaluation {
            score: 5.0,
            feedback: "More depth.".to_string(),
            next_question: "Next?".to_string(),
        };
        let content = render_assistant_turn(&evaluation, &[]);
        assert!(!content.contains("**References:**"));
    }
}
