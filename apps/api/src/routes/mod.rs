pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::documents::handlers as document_handlers;
use crate::interview::handlers as chat_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route(
            "/api/documents/upload",
            post(document_handlers::handle_upload),
        )
        .route("/api/documents", get(document_handlers::handle_list))
        .route(
            "/api/documents/:id",
            delete(document_handlers::handle_delete),
        )
        // Interview chat
        .route("/api/chat/start", post(chat_handlers::handle_start))
        .route("/api/chat/query", post(chat_handlers::handle_chat_query))
        .route("/api/chat/history", get(chat_handlers::handle_history))
        .route("/api/chat/clear", delete(chat_handlers::handle_clear))
        .with_state(state)
}
