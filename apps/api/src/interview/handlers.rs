use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::{
    clear_session, handle_query, session_history, start_session, TurnOutcome,
};
use crate::models::chat::Turn;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct StartRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Serialize)]
pub struct TurnsResponse {
    pub messages: Vec<Turn>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub response: TurnOutcome,
    pub messages: Vec<Turn>,
}

/// POST /api/chat/start
pub async fn handle_start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<TurnsResponse>, AppError> {
    let messages = start_session(&state.db, req.user_id).await?;
    Ok(Json(TurnsResponse { messages }))
}

/// POST /api/chat/query
pub async fn handle_chat_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let (response, messages) = handle_query(
        &state.db,
        &state.embedder,
        state.question_picker.as_ref(),
        state.config.citation_snippet_chars,
        req.user_id,
        &req.message,
    )
    .await?;
    Ok(Json(QueryResponse { response, messages }))
}

/// GET /api/chat/history
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TurnsResponse>, AppError> {
    let messages = session_history(&state.db, params.user_id).await?;
    Ok(Json(TurnsResponse { messages }))
}

/// DELETE /api/chat/clear
pub async fn handle_clear(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    clear_session(&state.db, params.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Chat history cleared" })))
}
