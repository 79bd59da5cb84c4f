//! HTTP request handlers

use super::types::{
    AuditQuery, AuditResponse, ChatStateResponse, ErrorResponse, MessageRequest, MessageResponse,
};
use super::AppState;
use crate::runtime::DispatchError;
use crate::state_machine::ChatId;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Longest message accepted, in characters
const MAX_MESSAGE_CHARS: usize = 4096;
const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Incoming chat messages
        .route("/api/chats/:chat_id/messages", post(post_message))
        // Chat inspection
        .route("/api/chats/:chat_id", get(get_chat))
        .route("/api/chats/:chat_id/audit", get(get_audit))
        // Version
        .route("/version", get(get_version))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn post_message(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message is longer than {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let reply = state.dispatcher.handle(ChatId(chat_id), &req.text)?;
    Ok(Json(reply.into()))
}

// ============================================================
// Inspection
// ============================================================

async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<ChatStateResponse>, AppError> {
    let chat_id = ChatId(chat_id);
    let chat = state
        .dispatcher
        .snapshot(chat_id)?
        .ok_or_else(|| AppError::NotFound(format!("Chat {chat_id} not found")))?;

    Ok(Json(ChatStateResponse::new(
        chat_id,
        &chat,
        state.dispatcher.catalog().size(),
    )))
}

async fn get_audit(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    if limit == 0 || limit > MAX_AUDIT_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_AUDIT_LIMIT}"
        )));
    }

    let events = state
        .audit_db
        .recent_for_chat(ChatId(chat_id), limit)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuditResponse { events }))
}

async fn get_version() -> &'static str {
    concat!("puzzle-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
